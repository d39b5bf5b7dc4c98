// src/logging.rs

//! `tracing` subscriber setup.
//!
//! `--log-level` wins. Otherwise `RENDERBENCH_LOG` is read as an `EnvFilter`
//! directive, so both `debug` and `renderbench::monitor=trace,info` work.
//! Falls back to `info`.
//!
//! Everything goes to stderr: stdout is reserved for the run report.

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "RENDERBENCH_LOG";

/// Install the global subscriber. Call once, before `run`.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = build_filter(cli_level, std::env::var(LOG_ENV_VAR).ok().as_deref())?;

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
        .context("installing tracing subscriber")?;

    Ok(())
}

fn build_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> Result<EnvFilter> {
    if let Some(level) = cli_level {
        return Ok(EnvFilter::new(level.as_directive()));
    }
    match env.map(str::trim).filter(|s| !s.is_empty()) {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("invalid {LOG_ENV_VAR} value '{directives}'")),
        None => Ok(EnvFilter::new("info")),
    }
}

impl LogLevel {
    fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}
