// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod types;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::cli::CliArgs;
use crate::config::load_or_default;
use crate::exec::{build_args, ExecutionOutcome, TransitBridge};
use crate::types::ExecutionRequest;

pub use crate::exec::{execute_transit, ExecutionFailure, FailureKind};
pub use crate::types::DiffRecord;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (plus the `--executable` override)
/// - request validation
/// - the bridge invocation
/// - printing the decoded records
///
/// Returns the process exit code: 0 on success, the tool's own exit code
/// when it failed with one, 1 otherwise.
pub async fn run(args: CliArgs) -> Result<i32> {
    let mut cfg = load_or_default(args.config.as_deref().map(Path::new))
        .context("loading transit-bridge config")?;
    if let Some(exe) = &args.executable {
        cfg.tool.executable = PathBuf::from(exe);
    }

    let request = ExecutionRequest::new(&args.repo, args.from.as_deref(), args.to.as_deref())?;
    let bridge = TransitBridge::from_config(&cfg);

    if args.dry_run {
        print_dry_run(&bridge, &request);
        return Ok(0);
    }

    match bridge.execute(request).await {
        ExecutionOutcome::Success(records) => {
            println!("{}", serde_json::to_string_pretty(&records)?);
            Ok(0)
        }
        ExecutionOutcome::Failure(failure) => {
            eprintln!("transit failed ({}): {}", failure.kind, failure.message);
            Ok(exit_code_for(&failure))
        }
    }
}

fn exit_code_for(failure: &ExecutionFailure) -> i32 {
    match failure.exit_code {
        Some(code) if code != 0 => code,
        _ => 1,
    }
}

/// Simple dry-run output: print the command line that would be run.
fn print_dry_run(bridge: &TransitBridge, request: &ExecutionRequest) {
    println!("transit-bridge dry-run");
    println!("  executable = {}", bridge.launcher().executable().display());
    println!("  args = {:?}", build_args(request));
    match bridge.timeout() {
        Some(t) => println!("  timeout = {t:?}"),
        None => println!("  timeout = none"),
    }
    if request.revisions().is_none() {
        println!("  (no revision pair; whole history is analysed)");
    }

    debug!("dry-run complete (no execution)");
}
