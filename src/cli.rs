// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Every flag except `--config`, `--log-level` and `--dry-run` overrides the
//! matching value from the config file before validation.

use clap::{Parser, ValueEnum};

use crate::types::RunMode;

/// Command-line arguments for `renderbench`.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "renderbench",
    version,
    about = "Run render backends as child processes and report timing, liveness and artifacts.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    #[arg(long, value_name = "PATH", default_value = "Renderbench.toml")]
    pub config: String,

    /// Scheduling mode for the batch.
    #[arg(long, value_enum, value_name = "MODE")]
    pub mode: Option<RunMode>,

    /// Number of jobs to generate (replaces `bench.count`).
    #[arg(long, value_name = "N")]
    pub count: Option<usize>,

    /// Run the whole batch this many times in a row.
    #[arg(long, value_name = "R")]
    pub rounds: Option<u32>,

    /// Per-job timeout, e.g. `30s`.
    #[arg(long, value_name = "DURATION")]
    pub timeout: Option<String>,

    /// Extra time granted to a timed-out job that already printed its success marker.
    #[arg(long, value_name = "DURATION")]
    pub grace_period: Option<String>,

    /// Interval between liveness polls, e.g. `500ms`.
    #[arg(long, value_name = "DURATION")]
    pub poll_interval: Option<String>,

    /// Directory for generated artifact paths.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<String>,

    /// Directory for per-job stdout/stderr logs.
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<String>,

    /// Also write a machine-readable JSON report to this path.
    #[arg(long, value_name = "PATH")]
    pub report_json: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RENDERBENCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Validate config and print the resolved jobs without spawning anything.
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
