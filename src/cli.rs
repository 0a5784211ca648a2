// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `buildag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "buildag",
    version,
    about = "Run build commands in dependency order over a parallel worker pool.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the build manifest (TOML).
    ///
    /// Default: `Buildfile.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Buildfile.toml")]
    pub manifest: String,

    /// Worker pool size. Defaults to the number of logical CPUs.
    #[arg(long, short = 'j', value_name = "N")]
    pub jobs: Option<usize>,

    /// Execute every action regardless of timestamps.
    #[arg(long)]
    pub force: bool,

    /// Remove all registered targets instead of building.
    #[arg(long)]
    pub clean: bool,

    /// Parse + validate, print the planned actions, but don't execute.
    #[arg(long)]
    pub dry_run: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BUILDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
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
