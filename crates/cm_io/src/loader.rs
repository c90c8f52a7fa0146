//! Loader: read local JSON inputs (manifest → catalog → votes → params →
//! reference), check cross-references, and return a typed `LoadedScenario`
//! for the pipeline. No network I/O.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use cm_core::{
    entities::{CatalogDoc, PoliticalEntityCatalog, ReferenceElection},
    errors::EngineError,
    ids::PartyId,
    variables::Params,
};

use crate::manifest::{has_any_scheme, load_and_resolve_manifest};
use crate::{hasher, IoError, IoResult};

/// Upper bound for any single input file.
const MAX_INPUT_BYTES: u64 = 16 * 1024 * 1024;

// ----------------------------- Public wire-facing types -----------------------------

/// Vote totals file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VotesDoc {
    /// Election label, e.g. "Tweede Kamer 2023".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub election: Option<String>,
    pub votes: BTreeMap<PartyId, u64>,
}

/// Explicit input paths (CLI mode without a manifest).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioPaths {
    pub catalog: PathBuf,
    pub votes: PathBuf,
    pub params: Option<PathBuf>,
    pub reference: Option<PathBuf>,
}

/// SHA-256 of the canonical JSON of each input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioDigests {
    pub catalog_sha256: String,
    pub votes_sha256: String,
    pub params_sha256: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_sha256: Option<String>,
}

/// Loaded, cross-checked inputs for one run.
#[derive(Debug, Clone)]
pub struct LoadedScenario {
    pub label: String,
    pub catalog: PoliticalEntityCatalog,
    pub votes: BTreeMap<PartyId, u64>,
    /// Params from the scenario, or defaults when none were given.
    pub params: Params,
    pub reference: Option<ReferenceElection>,
    pub digests: ScenarioDigests,
}

// ----------------------------- Orchestration -----------------------------

/// Load everything from a **manifest file path**.
pub fn load_scenario_from_manifest(path: &Path) -> IoResult<LoadedScenario> {
    let resolved = load_and_resolve_manifest(path)?;
    let paths = ScenarioPaths {
        catalog: resolved.catalog_path,
        votes: resolved.votes_path,
        params: resolved.params_path,
        reference: resolved.reference_path,
    };
    load_paths(&paths, resolved.id)
}

/// Load from explicit paths.
pub fn load_scenario(paths: &ScenarioPaths) -> IoResult<LoadedScenario> {
    load_paths(paths, None)
}

fn load_paths(paths: &ScenarioPaths, fallback_label: Option<String>) -> IoResult<LoadedScenario> {
    let catalog = read_json_value(&paths.catalog)?;
    let votes = read_json_value(&paths.votes)?;
    let params = paths.params.as_deref().map(read_json_value).transpose()?;
    let reference = paths.reference.as_deref().map(read_json_value).transpose()?;
    assemble(catalog, votes, params, reference, fallback_label)
}

/// Load from in-memory JSON documents (built-in scenarios, tests).
pub fn load_scenario_from_strs(
    catalog: &str,
    votes: &str,
    params: Option<&str>,
    reference: Option<&str>,
) -> IoResult<LoadedScenario> {
    let parse = |label: &str, s: &str| -> IoResult<Value> {
        serde_json::from_str(s).map_err(|e| IoError::Json { pointer: label.to_string(), msg: e.to_string() })
    };
    assemble(
        parse("catalog", catalog)?,
        parse("votes", votes)?,
        params.map(|s| parse("params", s)).transpose()?,
        reference.map(|s| parse("reference", s)).transpose()?,
        None,
    )
}

fn assemble(
    catalog: Value,
    votes: Value,
    params: Option<Value>,
    reference: Option<Value>,
    fallback_label: Option<String>,
) -> IoResult<LoadedScenario> {
    let catalog = catalog_from_value(catalog)?;
    let votes: VotesDoc = typed("votes", votes)?;
    let params: Params = match params {
        Some(v) => typed("params", v)?,
        None => Params::default(),
    };
    let reference: Option<ReferenceElection> = reference.map(|v| typed("reference", v)).transpose()?;

    check_cross_refs(&catalog, &votes, reference.as_ref())?;

    let digests = ScenarioDigests {
        catalog_sha256: hasher::sha256_canonical(&catalog)?,
        votes_sha256: hasher::sha256_canonical(&votes)?,
        params_sha256: hasher::sha256_canonical(&params)?,
        reference_sha256: reference.as_ref().map(hasher::sha256_canonical).transpose()?,
    };

    Ok(LoadedScenario {
        label: votes.election.clone().or(fallback_label).unwrap_or_else(|| "scenario".to_string()),
        catalog,
        votes: votes.votes,
        params,
        reference,
        digests,
    })
}

/// Catalog validation failures surface as engine errors, not JSON errors.
fn catalog_from_value(v: Value) -> IoResult<PoliticalEntityCatalog> {
    let doc: CatalogDoc = typed("catalog", v)?;
    Ok(PoliticalEntityCatalog::new(doc.dimensions, doc.parties)?)
}

fn typed<T: DeserializeOwned>(label: &str, v: Value) -> IoResult<T> {
    serde_json::from_value(v).map_err(|e| IoError::Json { pointer: label.to_string(), msg: e.to_string() })
}

/// Read and parse a local JSON file (offline paths only, bounded size).
pub fn read_json_value(path: &Path) -> IoResult<Value> {
    let shown = path.display().to_string();
    if has_any_scheme(&shown) {
        return Err(IoError::Path(format!("non-local path rejected: {shown}")));
    }
    let f = File::open(path).map_err(|e| IoError::Path(format!("{shown}: {e}")))?;
    let mut buf = Vec::new();
    f.take(MAX_INPUT_BYTES + 1).read_to_end(&mut buf)?;
    if buf.len() as u64 > MAX_INPUT_BYTES {
        return Err(IoError::Path(format!("{shown}: larger than {MAX_INPUT_BYTES} bytes")));
    }
    serde_json::from_slice(&buf).map_err(|e| IoError::Json { pointer: shown, msg: e.to_string() })
}

// ----------------------------- Cross-reference checks -----------------------------

/// Every party named by votes or reference must be declared in the catalog.
pub fn check_cross_refs(
    catalog: &PoliticalEntityCatalog,
    votes: &VotesDoc,
    reference: Option<&ReferenceElection>,
) -> IoResult<()> {
    if let Some(id) = votes.votes.keys().find(|id| !catalog.contains(id)) {
        return Err(EngineError::UnknownEntity(format!("{id} (in votes)")).into());
    }
    if let Some(r) = reference {
        if let Some(id) = r.referenced_ids().into_iter().find(|id| !catalog.contains(id)) {
            return Err(EngineError::UnknownEntity(format!("{id} (in reference {})", r.name)).into());
        }
    }
    Ok(())
}
