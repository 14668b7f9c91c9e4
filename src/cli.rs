// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `transit-bridge`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "transit-bridge",
    version,
    about = "Run the transit analysis tool and decode its diff records.",
    long_about = None
)]
pub struct CliArgs {
    /// Path of the repository to analyse.
    #[arg(value_name = "REPO")]
    pub repo: String,

    /// Older revision of the pair. Ignored unless `TO` is also given.
    #[arg(value_name = "FROM")]
    pub from: Option<String>,

    /// Newer revision of the pair. Ignored unless `FROM` is also given.
    #[arg(value_name = "TO")]
    pub to: Option<String>,

    /// Path to the config file (TOML).
    ///
    /// Default: `Transit.toml` in the current working directory. A missing
    /// default file is fine; an explicitly named one must exist.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Path to the transit executable, overriding `[tool].executable`.
    #[arg(long, value_name = "PATH")]
    pub executable: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TRANSIT_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print the resolved command line, but don't run the tool.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
