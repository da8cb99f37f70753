// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `watchcmd`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "watchcmd",
    version,
    about = "Run a command whenever one of a fixed set of files changes.",
    long_about = None
)]
pub struct CliArgs {
    /// Watch list: TOML with a `watch = [...]` array, or a `.json` file
    /// holding a bare array of paths.
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Command to run (through `sh -c`) once per batch of changes.
    #[arg(value_name = "COMMAND")]
    pub command: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `WATCHCMD_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Load and validate the watch list, print it, and exit without
    /// watching.
    #[arg(long)]
    pub dry_run: bool,

    /// Exit after the first batch of changes has been dispatched.
    #[arg(long)]
    pub once: bool,
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
