// crates/cm_io/src/manifest.rs
//
// Scenario manifest: where the catalog, votes, params and reference files live.
//
// • Inputs are paths only, usually relative to the manifest's directory.
// • Offline-only: any path with a scheme ("://", "http:", "https:") is rejected.
// • Required inputs: catalog, votes. Optional: params, reference.
// • Digests (if provided) must be 64-lower-hex and only for present inputs;
//   they are verified over canonical JSON bytes.
// • Every input must exist and be a regular file.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::canonical_json::to_canonical_json_bytes;
use crate::hasher::sha256_hex;

const MAX_MANIFEST_BYTES: u64 = 1024 * 1024;

/// External manifest accepted by the loader.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Optional user-provided identifier (informational).
    #[serde(default)]
    pub id: Option<String>,

    pub catalog_path: String,
    pub votes_path: String,

    #[serde(default)]
    pub params_path: Option<String>,
    #[serde(default)]
    pub reference_path: Option<String>,

    /// Optional sha256 digests of the canonical JSON of each input.
    #[serde(default)]
    pub inputs_sha256: Option<InputDigests>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputDigests {
    #[serde(default)]
    pub catalog_path: Option<String>,
    #[serde(default)]
    pub votes_path: Option<String>,
    #[serde(default)]
    pub params_path: Option<String>,
    #[serde(default)]
    pub reference_path: Option<String>,
}

/// Paths resolved against the manifest's directory and checked to exist.
#[derive(Debug, Clone)]
pub struct ResolvedManifest {
    pub id: Option<String>,
    pub catalog_path: PathBuf,
    pub votes_path: PathBuf,
    pub params_path: Option<PathBuf>,
    pub reference_path: Option<PathBuf>,
    pub digests: Option<InputDigests>,
}

/// Manifest validation errors.
#[derive(Debug)]
pub enum ManifestError {
    Empty(&'static str),
    UrlPath(&'static str, String),
    Io(&'static str, String),
    Parse(String),
    NotAFile(&'static str, String),
    /// Bad hex format / shape.
    DigestShape(&'static str, String),
    /// Provided digest doesn't match the computed canonical sha256.
    DigestMismatch(&'static str, String),
    /// Digest provided for an input that is not present in the manifest.
    DigestForMissing(&'static str),
}

impl std::fmt::Display for ManifestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ManifestError::*;
        match self {
            Empty(k) => write!(f, "field must not be empty: {k}"),
            UrlPath(k, v) => write!(f, "path must be offline (no scheme) for {k}: {v}"),
            Io(k, v) => write!(f, "cannot access {k}: {v}"),
            Parse(v) => write!(f, "cannot parse manifest: {v}"),
            NotAFile(k, v) => write!(f, "path is not a file for {k}: {v}"),
            DigestShape(k, v) => write!(f, "invalid sha256 format for {k}: {v}"),
            DigestMismatch(k, v) => write!(f, "sha256 mismatch for {k}: {v}"),
            DigestForMissing(k) => write!(f, "digest supplied for missing input: {k}"),
        }
    }
}

impl std::error::Error for ManifestError {}

// ---------- helpers (pure) ----------

#[inline]
pub(crate) fn has_any_scheme(s: &str) -> bool {
    s.contains("://") || s.starts_with("http:") || s.starts_with("https:")
}

#[inline]
fn join_under(base: &Path, rel: &str) -> PathBuf {
    let p = Path::new(rel);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}

fn offline_check(label: &'static str, path: &str) -> Result<(), ManifestError> {
    if path.trim().is_empty() {
        return Err(ManifestError::Empty(label));
    }
    if has_any_scheme(path) {
        return Err(ManifestError::UrlPath(label, path.to_string()));
    }
    Ok(())
}

/// Existence and type check for one input path.
pub fn must_exist_file(label: &'static str, p: &Path) -> Result<(), ManifestError> {
    let md = fs::metadata(p).map_err(|e| ManifestError::Io(label, format!("{} ({e})", p.display())))?;
    if !md.is_file() {
        return Err(ManifestError::NotAFile(label, p.display().to_string()));
    }
    Ok(())
}

// ---------- validation (shape, offline, digests present only for present paths) ----------

/// Validate manifest *shape* and offline path policy. Does not perform I/O.
pub fn validate_manifest(man: &Manifest) -> Result<(), ManifestError> {
    offline_check("catalog_path", &man.catalog_path)?;
    offline_check("votes_path", &man.votes_path)?;
    if let Some(s) = &man.params_path {
        offline_check("params_path", s)?;
    }
    if let Some(s) = &man.reference_path {
        offline_check("reference_path", s)?;
    }

    if let Some(d) = &man.inputs_sha256 {
        let entries: [(&'static str, &Option<String>, bool); 4] = [
            ("catalog_path", &d.catalog_path, true),
            ("votes_path", &d.votes_path, true),
            ("params_path", &d.params_path, man.params_path.is_some()),
            ("reference_path", &d.reference_path, man.reference_path.is_some()),
        ];
        for (label, digest, present) in entries {
            let Some(h) = digest else { continue };
            if !present {
                return Err(ManifestError::DigestForMissing(label));
            }
            if !cm_core::ids::is_valid_sha256(h) {
                return Err(ManifestError::DigestShape(label, h.clone()));
            }
        }
    }
    Ok(())
}

// ---------- resolution (join base + existence/type checks) ----------

/// Resolve manifest paths under `base_dir` and ensure every input exists and is a file.
pub fn resolve_paths(base_dir: &Path, man: &Manifest) -> Result<ResolvedManifest, ManifestError> {
    let catalog = join_under(base_dir, &man.catalog_path);
    let votes = join_under(base_dir, &man.votes_path);
    let params = man.params_path.as_ref().map(|s| join_under(base_dir, s));
    let reference = man.reference_path.as_ref().map(|s| join_under(base_dir, s));

    must_exist_file("catalog_path", &catalog)?;
    must_exist_file("votes_path", &votes)?;
    if let Some(p) = &params {
        must_exist_file("params_path", p)?;
    }
    if let Some(p) = &reference {
        must_exist_file("reference_path", p)?;
    }

    Ok(ResolvedManifest {
        id: man.id.clone(),
        catalog_path: catalog,
        votes_path: votes,
        params_path: params,
        reference_path: reference,
        digests: man.inputs_sha256.clone(),
    })
}

// ---------------------------- digests ----------------------------

fn canonical_sha256_of_file(label: &'static str, p: &Path) -> Result<String, ManifestError> {
    let buf = fs::read(p).map_err(|e| ManifestError::Io(label, format!("{} ({e})", p.display())))?;
    let v: serde_json::Value =
        serde_json::from_slice(&buf).map_err(|e| ManifestError::Io(label, format!("{} ({e})", p.display())))?;
    let canon = to_canonical_json_bytes(&v).map_err(|e| ManifestError::Io(label, e.to_string()))?;
    Ok(sha256_hex(&canon))
}

/// Verify provided digests over **canonical JSON** bytes.
/// Returns `Ok(())` when no digests were provided.
pub fn verify_digests(resolved: &ResolvedManifest) -> Result<(), ManifestError> {
    let Some(d) = &resolved.digests else { return Ok(()) };

    let checks: [(&'static str, Option<&Path>, &Option<String>); 4] = [
        ("catalog_path", Some(resolved.catalog_path.as_path()), &d.catalog_path),
        ("votes_path", Some(resolved.votes_path.as_path()), &d.votes_path),
        ("params_path", resolved.params_path.as_deref(), &d.params_path),
        ("reference_path", resolved.reference_path.as_deref(), &d.reference_path),
    ];
    for (label, path, expect) in checks {
        match (path, expect) {
            (Some(p), Some(want)) => {
                let got = canonical_sha256_of_file(label, p)?;
                if &got != want {
                    return Err(ManifestError::DigestMismatch(label, format!("expected={want} got={got}")));
                }
            }
            (None, Some(_)) => return Err(ManifestError::DigestForMissing(label)),
            _ => {}
        }
    }
    Ok(())
}

// ---------------------------- top-level load ----------------------------

/// Load a manifest JSON from `manifest_path`, validate it, resolve under its
/// directory and verify digests when present.
pub fn load_and_resolve_manifest(manifest_path: &Path) -> Result<ResolvedManifest, ManifestError> {
    let shown = manifest_path.display().to_string();
    if has_any_scheme(&shown) {
        return Err(ManifestError::UrlPath("manifest", shown));
    }
    must_exist_file("manifest", manifest_path)?;

    let f = fs::File::open(manifest_path).map_err(|e| ManifestError::Io("manifest", format!("{shown} ({e})")))?;
    let mut buf = Vec::new();
    f.take(MAX_MANIFEST_BYTES)
        .read_to_end(&mut buf)
        .map_err(|e| ManifestError::Io("manifest", format!("{shown} ({e})")))?;

    let man: Manifest = serde_json::from_slice(&buf).map_err(|e| ManifestError::Parse(format!("{shown} ({e})")))?;
    validate_manifest(&man)?;

    let base = manifest_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    let resolved = resolve_paths(&base, &man)?;
    verify_digests(&resolved)?;
    Ok(resolved)
}
