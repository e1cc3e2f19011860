// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `taskmaster`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "taskmaster",
    version,
    about = "Launch, supervise and restart programs described in a TOML file.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the programs file (TOML).
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Append logs to this file instead of writing them to stderr.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TASKMASTER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Reload automatically whenever the config file's content changes.
    #[arg(long)]
    pub watch: bool,

    /// Parse + validate, print the programs, but don't start anything.
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
