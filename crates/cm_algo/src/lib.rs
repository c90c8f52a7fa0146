// crates/cm_algo/src/lib.rs
#![forbid(unsafe_code)]

//! Pure algorithms of the CM engine. Nothing here performs I/O, reads the
//! clock, or logs: same inputs always give the same outputs.

// Core IDs and shared types
pub use cm_core::{
    entities::{PoliticalEntity, PoliticalEntityCatalog, ReferenceElection},
    errors::{EngineError, EngineResult},
    ids::PartyId,
    variables::Params,
};

// ----------------------------- Allocation (public surface) ---------------------------

pub mod allocation {
    // File modules (actual implementations)
    pub mod highest_averages;
    pub mod dhondt;
    pub mod sainte_lague;
}

// ----------------------------- Apportionment & compatibility -------------------------

pub mod apportionment;
pub mod compatibility;

// ----------------------------- Coalition search (public surface) ---------------------

pub mod coalition {
    pub mod candidate;
    pub mod subsets;
    pub mod stability;
    pub mod search;

    pub use candidate::{compare_by_compatibility, compare_by_seats, compare_by_stability, CoalitionCandidate};
    pub use search::{AnalysisOutcome, CoalitionAnalysis, CoalitionGroup, CoalitionSearch, SearchStats};
    pub use stability::stability_factor;
    pub use subsets::SubsetGenerator;
}

// ----------------------------- Historical validation ---------------------------------

pub mod validator;

// Tight, explicit re-exports (avoid wildcard export drift).
pub use apportionment::{apportion, ApportionmentResult, PartySeats};
pub use coalition::{AnalysisOutcome, CoalitionAnalysis, CoalitionCandidate, CoalitionGroup, CoalitionSearch};
pub use compatibility::{CompatibilityModel, CompatibilityReport, PairwiseTable, RedLineViolation};
pub use validator::{compare_seats, match_coalition, validate, CoalitionMatch, SeatAccuracy, SeatComparison, ValidationReport};
