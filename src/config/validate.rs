// src/config/validate.rs

use std::path::PathBuf;
use std::time::Duration;

use crate::config::model::{ConfigFile, OutputPlan, RawConfigFile};
use crate::errors::{BenchError, Result};
use crate::job::{BatchSpec, CommandTemplate, SuccessMatcher, build_batch};
use crate::monitor::MonitorSettings;
use crate::types::parse_duration;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = BenchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let outputs = validate_outputs(&raw)?;
        let batch = validate_backend(&raw)?;
        let monitor = validate_monitor(&raw)?;

        if raw.bench.rounds == 0 {
            return Err(BenchError::config("[bench].rounds must be >= 1 (got 0)"));
        }
        if raw.bench.log_dir.trim().is_empty() {
            return Err(BenchError::config("[bench].log_dir must not be empty"));
        }

        let cfg = ConfigFile {
            mode: raw.bench.mode,
            rounds: raw.bench.rounds,
            outputs,
            log_dir: PathBuf::from(&raw.bench.log_dir),
            clean_outputs: raw.bench.clean_outputs,
            report_json: raw.bench.report_json.as_ref().map(PathBuf::from),
            batch,
            monitor,
        };

        // Fail before anything is spawned if the jobs themselves are invalid.
        let first_round = cfg.outputs.paths_for_round(1, cfg.rounds)?;
        build_batch(&cfg.batch, &first_round)?;

        Ok(cfg)
    }
}

fn validate_outputs(raw: &RawConfigFile) -> Result<OutputPlan> {
    let bench = &raw.bench;
    match (bench.count, &bench.outputs) {
        (Some(_), Some(_)) => Err(BenchError::config(
            "[bench] must set either `count` or `outputs`, not both",
        )),
        (None, Some(paths)) => {
            if paths.is_empty() {
                return Err(BenchError::config("[bench].outputs must not be empty"));
            }
            Ok(OutputPlan::Explicit(paths.iter().map(PathBuf::from).collect()))
        }
        (count, None) => {
            let count = count.unwrap_or(1);
            if count == 0 {
                return Err(BenchError::config("[bench].count must be >= 1 (got 0)"));
            }
            if bench.output_prefix.trim().is_empty() {
                return Err(BenchError::config("[bench].output_prefix must not be empty"));
            }
            Ok(OutputPlan::Generated {
                dir: PathBuf::from(&bench.output_dir),
                prefix: bench.output_prefix.clone(),
                extension: bench.output_extension.clone(),
                count,
            })
        }
    }
}

fn validate_backend(raw: &RawConfigFile) -> Result<BatchSpec> {
    let backend = &raw.backend;

    if backend.command.trim().is_empty() {
        return Err(BenchError::config("[backend].command must not be empty"));
    }
    if backend.success_pattern.is_empty() {
        return Err(BenchError::config("[backend].success_pattern must not be empty"));
    }

    let success_pattern = if backend.pattern_is_regex {
        SuccessMatcher::regex(&backend.success_pattern)?
    } else {
        SuccessMatcher::literal(backend.success_pattern.clone())
    };

    let timeout = duration_field("[backend].timeout", &backend.timeout)?;
    if timeout.is_zero() {
        return Err(BenchError::config("[backend].timeout must be greater than zero"));
    }

    Ok(BatchSpec {
        template: CommandTemplate::new(backend.command.clone(), backend.args.clone()),
        timeout,
        success_pattern,
    })
}

fn validate_monitor(raw: &RawConfigFile) -> Result<MonitorSettings> {
    let monitor = &raw.monitor;

    let poll_interval = duration_field("[monitor].poll_interval", &monitor.poll_interval)?;
    if poll_interval.is_zero() {
        return Err(BenchError::config(
            "[monitor].poll_interval must be greater than zero",
        ));
    }
    let grace_period = duration_field("[monitor].grace_period", &monitor.grace_period)?;
    let idle_warning = monitor
        .idle_warning
        .as_deref()
        .map(|s| duration_field("[monitor].idle_warning", s))
        .transpose()?;

    Ok(MonitorSettings {
        poll_interval,
        grace_period,
        idle_warning,
    })
}

fn duration_field(field: &str, value: &str) -> Result<Duration> {
    parse_duration(value).map_err(|e| BenchError::config(format!("{field}: {e}")))
}
