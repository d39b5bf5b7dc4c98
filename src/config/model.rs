// src/config/model.rs

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::job::BatchSpec;
use crate::job::descriptor::DEFAULT_SUCCESS_MARKER;
use crate::monitor::MonitorSettings;
use crate::types::RunMode;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [bench]
/// mode = "parallel"
/// count = 10
///
/// [backend]
/// command = "./render-backend"
/// args = ["--single", "{output}"]
/// timeout = "60s"
///
/// [monitor]
/// poll_interval = "500ms"
/// grace_period = "2s"
/// ```
///
/// Only `[backend].command` is mandatory.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub bench: BenchSection,

    pub backend: BackendSection,

    #[serde(default)]
    pub monitor: MonitorSection,
}

/// `[bench]` section: what to run and where results go.
#[derive(Debug, Clone, Deserialize)]
pub struct BenchSection {
    #[serde(default)]
    pub mode: RunMode,

    /// Number of generated outputs. Mutually exclusive with `outputs`.
    #[serde(default)]
    pub count: Option<usize>,

    /// Explicit artifact paths, one job each.
    #[serde(default)]
    pub outputs: Option<Vec<String>>,

    #[serde(default = "default_rounds")]
    pub rounds: u32,

    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    #[serde(default = "default_output_prefix")]
    pub output_prefix: String,

    #[serde(default = "default_output_extension")]
    pub output_extension: String,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    /// Remove an existing artifact before its job is spawned.
    #[serde(default = "default_true")]
    pub clean_outputs: bool,

    #[serde(default)]
    pub report_json: Option<String>,
}

fn default_rounds() -> u32 {
    1
}

fn default_output_dir() -> String {
    "out".to_string()
}

fn default_output_prefix() -> String {
    "render".to_string()
}

fn default_output_extension() -> String {
    "pdf".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for BenchSection {
    fn default() -> Self {
        Self {
            mode: RunMode::default(),
            count: None,
            outputs: None,
            rounds: default_rounds(),
            output_dir: default_output_dir(),
            output_prefix: default_output_prefix(),
            output_extension: default_output_extension(),
            log_dir: default_log_dir(),
            clean_outputs: true,
            report_json: None,
        }
    }
}

/// `[backend]` section: how to invoke the render backend.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendSection {
    pub command: String,

    /// Argument template; see `CommandTemplate` for placeholders.
    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default = "default_success_pattern")]
    pub success_pattern: String,

    #[serde(default)]
    pub pattern_is_regex: bool,

    #[serde(default = "default_timeout")]
    pub timeout: String,
}

fn default_success_pattern() -> String {
    DEFAULT_SUCCESS_MARKER.to_string()
}

fn default_timeout() -> String {
    "60s".to_string()
}

impl BackendSection {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            success_pattern: default_success_pattern(),
            pattern_is_regex: false,
            timeout: default_timeout(),
        }
    }
}

/// `[monitor]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorSection {
    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,

    #[serde(default = "default_grace_period")]
    pub grace_period: String,

    #[serde(default)]
    pub idle_warning: Option<String>,
}

fn default_poll_interval() -> String {
    "500ms".to_string()
}

fn default_grace_period() -> String {
    "2s".to_string()
}

impl Default for MonitorSection {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            grace_period: default_grace_period(),
            idle_warning: None,
        }
    }
}

/// Where the artifacts of a batch go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputPlan {
    Generated {
        dir: PathBuf,
        prefix: String,
        extension: String,
        count: usize,
    },
    Explicit(Vec<PathBuf>),
}

impl OutputPlan {
    pub fn len(&self) -> usize {
        match self {
            OutputPlan::Generated { count, .. } => *count,
            OutputPlan::Explicit(paths) => paths.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Artifact paths for one round. Generated outputs get a `round-NN`
    /// subdirectory when there is more than one round.
    pub fn paths_for_round(&self, round: u32, rounds: u32) -> crate::errors::Result<Vec<PathBuf>> {
        match self {
            OutputPlan::Generated {
                dir,
                prefix,
                extension,
                count,
            } => {
                let dir = round_dir(dir, round, rounds);
                crate::job::generated_outputs(&dir, prefix, extension, *count)
            }
            OutputPlan::Explicit(paths) => Ok(paths.clone()),
        }
    }
}

/// Validated configuration.
///
/// Built from a [`RawConfigFile`] via `TryFrom` (see `validate.rs`).
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub mode: RunMode,
    pub rounds: u32,
    pub outputs: OutputPlan,
    pub log_dir: PathBuf,
    pub clean_outputs: bool,
    pub report_json: Option<PathBuf>,
    pub batch: BatchSpec,
    pub monitor: MonitorSettings,
}

impl ConfigFile {
    /// Log directory for one round (`<log_dir>/round-NN` when `rounds > 1`).
    pub fn log_dir_for_round(&self, round: u32) -> PathBuf {
        round_dir(&self.log_dir, round, self.rounds)
    }
}

fn round_dir(base: &Path, round: u32, rounds: u32) -> PathBuf {
    if rounds > 1 {
        base.join(format!("round-{round:02}"))
    } else {
        base.to_path_buf()
    }
}
