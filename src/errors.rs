// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Only batch-level problems surface as `BenchError`s. Anything that goes
//! wrong for an individual job after validation is folded into that job's
//! `RunOutcome` instead.

use thiserror::Error;

use crate::types::JobId;

#[derive(Error, Debug)]
pub enum BenchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("failed to spawn job '{job}': {source}")]
    SpawnError {
        job: JobId,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("run interrupted")]
    Interrupted,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BenchError {
    pub fn config(msg: impl Into<String>) -> Self {
        BenchError::ConfigError(msg.into())
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, BenchError>;
