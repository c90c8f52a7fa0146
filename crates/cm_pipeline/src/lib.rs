//! cm_pipeline: deterministic pipeline surface (load→validate→allocate→search→compare→label→build)
//! This crate performs no file writes; JSON shape, canonical bytes and hashing are
//! routed through `cm_io`, math through `cm_algo`.

#![forbid(unsafe_code)]

use std::fmt;
use std::path::Path;

use cm_algo::{ApportionmentResult, CompatibilityModel, ValidationReport};
use cm_io::{loader::LoadedScenario, IoError};
use serde::Serialize;
use tracing::{info, info_span, warn};

pub mod allocate;
pub mod build_result;
pub mod label;
pub mod search;
pub mod validate;

pub use build_result::{ResultBody, ResultDoc};
pub use label::{Label, LabelBlock};
pub use search::SearchState;

/// Entries listed per coalition group when the caller does not say otherwise.
pub const DEFAULT_LIST_LIMIT: usize = 25;

/// Engine identifiers echoed into every result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineMeta {
    pub vendor: String,
    pub name: String,
    pub version: String,
    pub build: String,
}

/// Pipeline context: inputs are already loaded and cross-checked by cm_io.
#[derive(Debug)]
pub struct PipelineCtx {
    pub scenario: LoadedScenario,
    pub engine_meta: EngineMeta,
    pub list_limit: usize,
}

impl PipelineCtx {
    pub fn new(scenario: LoadedScenario) -> Self {
        Self { scenario, engine_meta: engine_identifiers(), list_limit: DEFAULT_LIST_LIMIT }
    }
}

/// Typed stage outputs plus the hashed Result document.
#[derive(Debug)]
pub struct PipelineOutputs {
    pub result: ResultDoc,
    pub apportionment: ApportionmentResult,
    pub search: SearchState,
    pub validation: Option<ValidationReport>,
    /// Non-fatal findings of the input validation stage.
    pub warnings: Vec<validate::ValidationIssue>,
}

/// Single error surface for the pipeline orchestration.
#[derive(Debug)]
pub enum PipelineError {
    Io(String),
    Validate(String),
    Allocate(String),
    Integrity(String),
    Search(String),
    Build(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Io(m) => write!(f, "io: {m}"),
            PipelineError::Validate(m) => write!(f, "validation failed: {m}"),
            PipelineError::Allocate(m) => write!(f, "allocation failed: {m}"),
            PipelineError::Integrity(m) => write!(f, "integrity: {m}"),
            PipelineError::Search(m) => write!(f, "coalition search failed: {m}"),
            PipelineError::Build(m) => write!(f, "build: {m}"),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<IoError> for PipelineError {
    fn from(e: IoError) -> Self {
        use PipelineError::*;
        match e {
            IoError::Path(m) => Io(format!("path: {m}")),
            IoError::Json { pointer, msg } => Validate(format!("json {pointer}: {msg}")),
            IoError::Hash(m) => Build(format!("hash: {m}")),
            IoError::Manifest(m) => Validate(format!("manifest: {m}")),
            IoError::Engine(e) => Validate(e.to_string()),
        }
    }
}

// -------------------------------------- Public API --------------------------------------

/// Run the input checks only. Errors when any check fails; warnings are returned.
pub fn check_scenario(scenario: &LoadedScenario) -> Result<validate::ValidationReport, PipelineError> {
    let report = validate::validate(scenario);
    for w in report.warnings() {
        warn!(code = w.code, "{}", w.message);
    }
    if !report.pass {
        let msg = report.errors().map(|i| format!("{}: {}", i.code, i.message)).collect::<Vec<_>>().join("; ");
        return Err(PipelineError::Validate(msg));
    }
    Ok(report)
}

/// Orchestrate the pipeline with a preloaded context.
pub fn run_with_ctx(ctx: PipelineCtx) -> Result<PipelineOutputs, PipelineError> {
    let PipelineCtx { scenario, engine_meta, list_limit } = ctx;
    let _span = info_span!("pipeline", election = %scenario.label).entered();

    // --- VALIDATE ---
    let checked = check_scenario(&scenario)?;
    let params = &scenario.params;

    // --- ALLOCATE ---
    let apportionment = allocate::allocate(&scenario.votes, params)?;

    // --- SEARCH ---
    let model = CompatibilityModel::from_params(&scenario.catalog, params);
    let search = search::run_search(model, params, &apportionment)?;

    // --- COMPARE with the reference election ---
    let validation = scenario
        .reference
        .as_ref()
        .map(|r| cm_algo::validate(&apportionment, search.analysis(), r));
    if let Some(v) = &validation {
        info!(reference = %v.reference, overall_pct = v.overall_accuracy_pct, "historical comparison");
    }

    // --- LABEL ---
    let label = label::label_outcome(&search);

    // --- BUILD_RESULT ---
    let result = build_result::build_result(build_result::BuildInputs {
        engine: &engine_meta,
        election: &scenario.label,
        params,
        catalog: &scenario.catalog,
        apportionment: &apportionment,
        search: &search,
        label: &label,
        validation: validation.as_ref(),
        digests: &scenario.digests,
        list_limit,
    })?;
    info!(id = %result.id, label = label.value.as_str(), "result built");

    Ok(PipelineOutputs { result, apportionment, search, validation, warnings: checked.issues })
}

/// Convenience entry: load a scenario manifest via cm_io, then run the pipeline.
pub fn run_from_manifest_path<P: AsRef<Path>>(path: P) -> Result<PipelineOutputs, PipelineError> {
    let scenario = cm_io::loader::load_scenario_from_manifest(path.as_ref())?;
    run_with_ctx(PipelineCtx::new(scenario))
}

/// Convenience entry: run one of the scenarios compiled into cm_io.
pub fn run_builtin(name: &str) -> Result<PipelineOutputs, PipelineError> {
    let scenario = cm_io::builtin::load_builtin(name)?;
    run_with_ctx(PipelineCtx::new(scenario))
}

/// Engine identifiers for results and `--version` output.
pub fn engine_identifiers() -> EngineMeta {
    EngineMeta {
        vendor: "cm".to_string(),
        name: "cm_engine".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        build: "release".to_string(),
    }
}
