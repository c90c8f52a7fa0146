// crates/cm_cli/src/args.rs
//
// Deterministic, offline CLI argument parsing surface.
//
// Rules:
// - No networked paths (reject any scheme:// like http/https/file)
// - Exactly one of: --scenario  XOR  --builtin  XOR  (--catalog + --votes [+ --params] [+ --reference])
// - Overrides patch individual Params fields after loading
// - --validate-only performs load + input checks without running the engine

use clap::{ArgAction, Parser, ValueEnum};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use cm_core::variables::{AggregationStrategy, ApportionmentMethod, Params};
use cm_io::{builtin::BUILTIN_SCENARIOS, loader::ScenarioPaths, looks_like_url_strict};
use cm_pipeline::DEFAULT_LIST_LIMIT;

/// Stdout rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Table,
    Json,
}

/// Parsed CLI arguments (raw).
#[derive(Debug, Parser, Clone)]
#[command(
    name = "cm",
    version,
    disable_help_subcommand = true,
    about = "Offline, deterministic seat apportionment and coalition analysis"
)]
pub struct Args {
    // --- Mode selection ---
    /// Scenario manifest JSON (mutually exclusive with --builtin and explicit file flags).
    #[arg(long, conflicts_with_all = ["builtin", "catalog", "votes", "params", "reference"])]
    pub scenario: Option<PathBuf>,

    /// Name of a bundled scenario (e.g. nl-2023).
    #[arg(long, conflicts_with_all = ["catalog", "votes", "params", "reference"])]
    pub builtin: Option<String>,

    // --- Explicit mode ---
    /// Party catalog JSON path.
    #[arg(long)]
    pub catalog: Option<PathBuf>,
    /// Vote counts JSON path.
    #[arg(long)]
    pub votes: Option<PathBuf>,
    /// Params JSON path (defaults apply when omitted).
    #[arg(long)]
    pub params: Option<PathBuf>,
    /// Reference election JSON path for historical comparison.
    #[arg(long)]
    pub reference: Option<PathBuf>,

    // --- Params overrides ---
    /// Chamber size.
    #[arg(long)]
    pub seats: Option<u32>,
    /// Seats needed to govern (default: strict majority).
    #[arg(long)]
    pub majority: Option<u32>,
    /// Largest coalition enumerated.
    #[arg(long = "max-size")]
    pub max_size: Option<usize>,
    /// Wall-clock budget for the coalition search.
    #[arg(long = "timeout-ms")]
    pub timeout_ms: Option<u64>,
    /// arithmetic_mean | seat_weighted_mean | minimum_pair
    #[arg(long)]
    pub aggregation: Option<AggregationStrategy>,
    /// dhondt | sainte_lague
    #[arg(long)]
    pub method: Option<ApportionmentMethod>,

    // --- Output ---
    #[arg(long, value_enum, default_value_t = Format::Table)]
    pub format: Format,
    /// Directory receiving a canonical result.json.
    #[arg(long)]
    pub out: Option<PathBuf>,
    /// Coalitions listed per group.
    #[arg(long, default_value_t = DEFAULT_LIST_LIMIT)]
    pub top: usize,

    // --- Control ---
    /// Load and check inputs only; do not run the engine.
    #[arg(long)]
    pub validate_only: bool,
    /// Suppress non-essential stderr output.
    #[arg(long)]
    pub quiet: bool,
    /// More log output (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Where the inputs come from, after validation.
#[derive(Debug, Clone, PartialEq)]
pub enum InputMode {
    Scenario(PathBuf),
    Builtin(String),
    Files(ScenarioPaths),
}

/// Errors surfaced by argument parsing/validation.
/// Keep messages short/stable (handy for scripts/tests).
#[derive(Debug)]
pub enum CliError {
    Missing(&'static str),
    NonLocalPath(String),
    NotFound(String),
    UnknownBuiltin(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use CliError::*;
        match self {
            Missing(s) => write!(f, "missing required flag: {s}"),
            NonLocalPath(p) => write!(f, "path must be local file (no scheme): {p}"),
            NotFound(p) => write!(f, "file not found: {p}"),
            UnknownBuiltin(n) => write!(f, "unknown built-in scenario `{n}` (available: {})", BUILTIN_SCENARIOS.join(", ")),
        }
    }
}
impl std::error::Error for CliError {}

impl Args {
    /// Input mode; only meaningful after `validate_args`.
    pub fn input_mode(&self) -> Result<InputMode, CliError> {
        if let Some(p) = &self.scenario {
            return Ok(InputMode::Scenario(p.clone()));
        }
        if let Some(name) = &self.builtin {
            return Ok(InputMode::Builtin(name.clone()));
        }
        Ok(InputMode::Files(ScenarioPaths {
            catalog: self.catalog.clone().ok_or(CliError::Missing("--catalog (or --scenario / --builtin)"))?,
            votes: self.votes.clone().ok_or(CliError::Missing("--votes"))?,
            params: self.params.clone(),
            reference: self.reference.clone(),
        }))
    }

    /// Patch the loaded params with command-line overrides.
    pub fn apply_overrides(&self, params: &mut Params) {
        if let Some(s) = self.seats {
            params.total_seats = s;
        }
        if let Some(t) = self.majority {
            params.majority_threshold = Some(t);
        }
        if let Some(k) = self.max_size {
            params.max_coalition_size = k;
        }
        if let Some(ms) = self.timeout_ms {
            params.search_timeout_ms = ms;
        }
        if let Some(a) = self.aggregation {
            params.aggregation = a;
        }
        if let Some(m) = self.method {
            params.method = m;
        }
    }

    pub fn has_overrides(&self) -> bool {
        self.seats.is_some()
            || self.majority.is_some()
            || self.max_size.is_some()
            || self.timeout_ms.is_some()
            || self.aggregation.is_some()
            || self.method.is_some()
    }
}

/// Entry point used by main.rs
pub fn parse_and_validate() -> Result<Args, CliError> {
    validate_args(Args::parse())
}

/// Mode, locality and existence checks; normalizes every input path.
pub fn validate_args(mut args: Args) -> Result<Args, CliError> {
    // Reject schemes for all provided paths (including --out)
    for p in iter_all_paths(&args) {
        ensure_local_path(p)?;
    }

    if let Some(name) = &args.builtin {
        if !BUILTIN_SCENARIOS.contains(&name.as_str()) {
            return Err(CliError::UnknownBuiltin(name.clone()));
        }
    } else if let Some(scenario) = &args.scenario {
        ensure_local_exists(scenario, "--scenario")?;
        args.scenario = args.scenario.take().map(|p| normalize_path(&p));
    } else {
        validate_explicit_mode(&args)?;
        args.catalog = args.catalog.take().map(|p| normalize_path(&p));
        args.votes = args.votes.take().map(|p| normalize_path(&p));
        args.params = args.params.take().map(|p| normalize_path(&p));
        args.reference = args.reference.take().map(|p| normalize_path(&p));
    }

    // Normalize output directory even if it doesn't exist yet
    args.out = args.out.take().map(|p| normalize_path(&p));

    Ok(args)
}

/// Explicit mode validation: require catalog+votes; check every provided file exists.
fn validate_explicit_mode(a: &Args) -> Result<(), CliError> {
    let cat = a.catalog.as_ref().ok_or(CliError::Missing("--catalog (or --scenario / --builtin)"))?;
    let votes = a.votes.as_ref().ok_or(CliError::Missing("--votes"))?;

    ensure_local_exists(cat, "--catalog")?;
    ensure_local_exists(votes, "--votes")?;
    if let Some(p) = &a.params {
        ensure_local_exists(p, "--params")?;
    }
    if let Some(r) = &a.reference {
        ensure_local_exists(r, "--reference")?;
    }
    Ok(())
}

/// Ensure a provided path string is local (no scheme); path existence is checked later.
#[inline]
fn ensure_local_path(p: &Path) -> Result<(), CliError> {
    if let Some(s) = p.to_str() {
        if looks_like_url_strict(s) || s.trim().to_ascii_lowercase().starts_with("file:") {
            return Err(CliError::NonLocalPath(s.to_string()));
        }
    }
    Ok(())
}

/// Iterate over all path-like flags (including `--out`) for quick scheme checks.
fn iter_all_paths(args: &Args) -> impl Iterator<Item = &Path> {
    [
        args.scenario.as_deref(),
        args.catalog.as_deref(),
        args.votes.as_deref(),
        args.params.as_deref(),
        args.reference.as_deref(),
        args.out.as_deref(),
    ]
    .into_iter()
    .flatten()
}

/// Ensure a path is local (no scheme) and exists as a regular file.
fn ensure_local_exists(p: &Path, label: &'static str) -> Result<(), CliError> {
    ensure_local_path(p)?;
    let meta = fs::metadata(p).map_err(|_| CliError::NotFound(format!("{label} {}", p.display())))?;
    if !meta.is_file() {
        return Err(CliError::NotFound(format!("{label} {}", p.display())));
    }
    Ok(())
}

/// Best-effort normalization to an absolute path.
/// If canonicalize fails (e.g., path doesn't exist yet), produce an absolute path relative to CWD.
fn normalize_path(p: &Path) -> PathBuf {
    fs::canonicalize(p).unwrap_or_else(|_| {
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join(p)
        }
    })
}
