// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `lanekeeper`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "lanekeeper",
    version,
    about = "Poll a task list and hand matching files to transform, merge and upload workers.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML). Re-read on every tick.
    #[arg(long, value_name = "PATH", default_value = "lanekeeper.toml")]
    pub config: String,

    /// Run a single tick, wait for its lanes to settle, then exit.
    #[arg(long)]
    pub once: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `LANEKEEPER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print lanes and tasks, but don't move files or
    /// start workers.
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
