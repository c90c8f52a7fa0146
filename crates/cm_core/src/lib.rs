//! cm_core: Core types, domains, ordering helpers, and exact ratios.
//!
//! This crate is **I/O-free**. It defines stable types/APIs used across the
//! engine (`cm_io`, `cm_algo`, `cm_pipeline`, `cm_cli`).
//!
//! - Token ids: `PartyId`, `DimensionId`; output id `RES:`
//! - Political entity catalog (ideology vectors + red lines)
//! - Reference datasets for historical validation
//! - Parameter domains (`Params`, strategies, stability policy)
//! - Integer-first ratio helpers and deterministic ordering
//! - One error taxonomy shared by every layer above

#![forbid(unsafe_code)]

pub mod ids;
pub mod entities;
pub mod determinism;
pub mod rounding;
pub mod variables;

pub mod errors {
    //! Error taxonomy for the engine core.

    use thiserror::Error;

    /// Parsing/domain failures for tokens and small value types.
    #[derive(Clone, Debug, Eq, PartialEq, Error)]
    pub enum CoreError {
        #[error("invalid token: {0}")]
        InvalidToken(String),
        #[error("invalid id: {0}")]
        InvalidId(String),
        #[error("invalid ratio")]
        InvalidRatio,
        #[error("domain out of range: {0}")]
        DomainOutOfRange(String),
    }

    /// Errors surfaced synchronously by the apportionment, compatibility and
    /// search engines.
    ///
    /// "No coalition reaches a majority" and "every majority is blocked" are
    /// *not* errors; they are reported through `AnalysisOutcome`.
    #[derive(Clone, Debug, PartialEq, Eq, Error)]
    pub enum EngineError {
        /// Malformed or degenerate input (zero votes, non-positive seat count, bad params).
        #[error("invalid input: {0}")]
        InvalidInput(String),

        /// An id that the catalog does not know.
        #[error("unknown entity: {0}")]
        UnknownEntity(String),

        /// Allocated seats do not sum to the configured total. Indicates a defect.
        #[error("apportionment integrity violated: allocated {allocated} seats, expected {expected}")]
        ApportionmentIntegrity { allocated: u64, expected: u32 },

        /// Coalition search was cancelled before completion.
        #[error("coalition search aborted after {examined} subsets")]
        SearchAborted { examined: u64 },
    }

    impl From<CoreError> for EngineError {
        fn from(e: CoreError) -> Self {
            EngineError::InvalidInput(e.to_string())
        }
    }

    pub type EngineResult<T> = Result<T, EngineError>;
}

pub use errors::{CoreError, EngineError, EngineResult};
