// crates/cm_cli/src/main.rs
//
// Exit codes, typed error mapping, CLI parsing, logging setup, the
// validate-only short-circuit and the full run path
// (load → overrides → pipeline → stdout → optional artifact).

mod args;
mod render;

mod exitcodes {
    pub const OK: i32 = 0;
    pub const VALIDATION: i32 = 2;
    pub const INTEGRITY: i32 = 3;
    pub const IO: i32 = 4;
    pub const ENGINE: i32 = 5;
}

use std::fs;
use std::io::{self, Write};
use std::process::ExitCode;

use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use args::{parse_and_validate as parse_cli, Args, Format, InputMode};
use cm_io::{canonical_json, loader::LoadedScenario};
use cm_pipeline::{check_scenario, run_with_ctx, PipelineCtx, PipelineError};

/// Central error type for CLI → exit-code mapping.
#[derive(Debug)]
enum MainError {
    /// Input shape, params domains, manifest problems
    Validation(String),
    /// Seat totals that do not add up
    Integrity(String),
    /// Read/write/path failures and stdout
    Io(String),
    /// Allocation or search failures
    Engine(String),
}

impl std::fmt::Display for MainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MainError::Validation(m) | MainError::Integrity(m) | MainError::Io(m) | MainError::Engine(m) => {
                f.write_str(m)
            }
        }
    }
}

fn main() -> ExitCode {
    let args = match parse_cli() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("cm: error: {e}");
            return ExitCode::from(exitcodes::VALIDATION as u8);
        }
    };
    init_tracing(args.verbose, args.quiet);

    let outcome = if args.validate_only { validate_only(&args) } else { run_once(&args) };
    let rc = match outcome {
        Ok(()) => exitcodes::OK,
        Err(e) => {
            eprintln!("cm: error: {e}");
            map_error(&e)
        }
    };
    ExitCode::from(rc as u8)
}

/// `RUST_LOG` wins; otherwise `-v` count picks the level. Logs go to stderr.
fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Map our typed errors to the exit-code table.
fn map_error(e: &MainError) -> i32 {
    use exitcodes::*;
    match e {
        MainError::Validation(_) => VALIDATION,
        MainError::Integrity(_) => INTEGRITY,
        MainError::Io(_) => IO,
        MainError::Engine(_) => ENGINE,
    }
}

/// Translate cm_pipeline::PipelineError into MainError buckets.
fn map_pipeline_err(e: PipelineError) -> MainError {
    use PipelineError::*;
    match e {
        Validate(_) | Allocate(_) => MainError::Validation(e.to_string()),
        Integrity(_) => MainError::Integrity(e.to_string()),
        Io(_) => MainError::Io(e.to_string()),
        Search(_) | Build(_) => MainError::Engine(e.to_string()),
    }
}

/// Load inputs for the selected mode and apply flag overrides.
fn load(args: &Args) -> Result<LoadedScenario, MainError> {
    let mode = args.input_mode().map_err(|e| MainError::Validation(e.to_string()))?;
    debug!(?mode, "loading inputs");
    let loaded = match &mode {
        InputMode::Scenario(p) => cm_io::loader::load_scenario_from_manifest(p),
        InputMode::Builtin(name) => cm_io::builtin::load_builtin(name),
        InputMode::Files(paths) => cm_io::loader::load_scenario(paths),
    };
    let mut scenario = loaded.map_err(|e| map_pipeline_err(e.into()))?;
    if args.has_overrides() {
        args.apply_overrides(&mut scenario.params);
        info!(params = ?scenario.params, "params overridden from flags");
    }
    Ok(scenario)
}

/// Validate-only path (no engine run, no artifacts).
fn validate_only(args: &Args) -> Result<(), MainError> {
    let scenario = load(args)?;
    let report = check_scenario(&scenario).map_err(map_pipeline_err)?;
    if !args.quiet {
        eprintln!(
            "validate-only: inputs OK ({} parties, {} warnings)",
            scenario.catalog.len(),
            report.issues.len()
        );
    }
    Ok(())
}

fn run_once(args: &Args) -> Result<(), MainError> {
    let scenario = load(args)?;
    let mut ctx = PipelineCtx::new(scenario);
    ctx.list_limit = args.top;
    let outs = run_with_ctx(ctx).map_err(map_pipeline_err)?;

    // stdout
    let rendered = match args.format {
        Format::Json => {
            let mut bytes = canonical_json::to_canonical_bytes(&outs.result)
                .map_err(|e| MainError::Engine(format!("serialize result: {e}")))?;
            bytes.push(b'\n');
            bytes
        }
        Format::Table => render::render_table(&outs.result)
            .map_err(|e| MainError::Engine(format!("render table: {e}")))?
            .into_bytes(),
    };
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(&rendered)
        .and_then(|_| stdout.flush())
        .map_err(|e| MainError::Io(format!("stdout: {e}")))?;

    // artifact
    if let Some(dir) = &args.out {
        fs::create_dir_all(dir).map_err(|e| MainError::Io(format!("create {}: {e}", dir.display())))?;
        let path = dir.join("result.json");
        canonical_json::write_canonical_file(&path, &outs.result).map_err(|e| map_pipeline_err(e.into()))?;
        if !args.quiet {
            eprintln!("cm: result written to {}", path.display());
        }
    }
    Ok(())
}
