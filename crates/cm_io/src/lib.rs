//! crates/cm_io/src/lib.rs
//! Offline I/O for the CM engine.
//!
//! - Shared error type (`IoError`) with `From` conversions used across modules.
//! - Canonical JSON (sorted keys, compact) and atomic writes.
//! - SHA-256 digests and `RES:` ids over canonical bytes.
//! - Scenario manifests, typed JSON loaders and the built-in scenarios.

#![forbid(unsafe_code)]

use cm_core::errors::EngineError;
use thiserror::Error;

/// Unified error for cm_io.
#[derive(Debug, Error)]
pub enum IoError {
    /// Filesystem / path errors (open, read, create_dir_all, rename, ...).
    #[error("io/path error: {0}")]
    Path(String),

    /// JSON parse/serialize errors, tagged with the offending file or value.
    #[error("json error at {pointer}: {msg}")]
    Json { pointer: String, msg: String },

    /// Hashing-related errors (bad digest shape, read failures).
    #[error("hash error: {0}")]
    Hash(String),

    /// Manifest shape, offline policy or digest verification failures.
    #[error("manifest error: {0}")]
    Manifest(String),

    /// Input parsed but violates an engine invariant (unknown party, bad params, ...).
    #[error(transparent)]
    Engine(#[from] EngineError),
}

pub type IoResult<T> = Result<T, IoError>;

/* ---------------- From conversions (used by file modules) ---------------- */

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        IoError::Path(e.to_string())
    }
}

impl From<serde_json::Error> for IoError {
    fn from(e: serde_json::Error) -> Self {
        IoError::Json { pointer: "/".to_string(), msg: e.to_string() }
    }
}

impl From<manifest::ManifestError> for IoError {
    fn from(e: manifest::ManifestError) -> Self {
        IoError::Manifest(e.to_string())
    }
}

/// Returns true if `s` looks like a URL (any `<scheme>://`, including `file://`).
#[inline]
pub fn looks_like_url_strict(s: &str) -> bool {
    s.trim().contains("://")
}

pub mod canonical_json;
pub mod hasher;
pub mod manifest;
pub mod loader;
pub mod builtin;

pub mod prelude {
    pub use crate::{looks_like_url_strict, IoError, IoResult};

    pub use crate::builtin::{load_builtin, BUILTIN_SCENARIOS};
    pub use crate::canonical_json::{to_canonical_bytes, write_canonical_file};
    pub use crate::hasher::{res_id_from_canonical, sha256_canonical, sha256_hex};
    pub use crate::loader::{load_scenario, load_scenario_from_manifest, LoadedScenario, ScenarioPaths};
}
