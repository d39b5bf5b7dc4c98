// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::cli::CliArgs;
use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    ConfigFile::try_from(raw_config)
}

/// Load, apply CLI overrides, then validate.
///
/// Overrides go in before validation so an invalid flag value is reported
/// the same way as an invalid file value.
pub fn load_with_overrides(path: impl AsRef<Path>, args: &CliArgs) -> Result<ConfigFile> {
    let mut raw_config = load_from_path(&path)?;
    apply_overrides(&mut raw_config, args);
    ConfigFile::try_from(raw_config)
}

/// Copy every CLI flag that was given onto the raw config.
pub fn apply_overrides(raw: &mut RawConfigFile, args: &CliArgs) {
    if let Some(mode) = args.mode {
        raw.bench.mode = mode;
    }
    if let Some(count) = args.count {
        raw.bench.count = Some(count);
        raw.bench.outputs = None;
    }
    if let Some(rounds) = args.rounds {
        raw.bench.rounds = rounds;
    }
    if let Some(ref timeout) = args.timeout {
        raw.backend.timeout = timeout.clone();
    }
    if let Some(ref grace) = args.grace_period {
        raw.monitor.grace_period = grace.clone();
    }
    if let Some(ref poll) = args.poll_interval {
        raw.monitor.poll_interval = poll.clone();
    }
    if let Some(ref dir) = args.output_dir {
        raw.bench.output_dir = dir.clone();
    }
    if let Some(ref dir) = args.log_dir {
        raw.bench.log_dir = dir.clone();
    }
    if let Some(ref path) = args.report_json {
        raw.bench.report_json = Some(path.clone());
    }
}
