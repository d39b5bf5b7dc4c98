// src/job/descriptor.rs

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use regex::Regex;

use crate::errors::{BenchError, Result};
use crate::types::JobId;

/// Default text a render backend prints once an artifact has been written.
pub const DEFAULT_SUCCESS_MARKER: &str = "PDF saved to:";

/// Immutable description of one render job.
#[derive(Debug, Clone)]
pub struct JobDescriptor {
    pub id: JobId,
    /// 1-based position of the job inside its batch.
    pub index: usize,
    pub command: String,
    pub arguments: Vec<String>,
    pub expected_artifact_path: PathBuf,
    pub timeout: Duration,
    pub success_pattern: SuccessMatcher,
}

impl JobDescriptor {
    /// Human-readable command line, used in logs and dry-run output.
    pub fn command_line(&self) -> String {
        let mut line = self.command.clone();
        for arg in &self.arguments {
            line.push(' ');
            if arg.contains(char::is_whitespace) {
                line.push('\'');
                line.push_str(arg);
                line.push('\'');
            } else {
                line.push_str(arg);
            }
        }
        line
    }
}

/// Marker searched for, line by line, in a job's stdout sink.
#[derive(Clone)]
pub enum SuccessMatcher {
    Literal(String),
    Regex(Regex),
}

impl SuccessMatcher {
    pub fn literal(text: impl Into<String>) -> Self {
        SuccessMatcher::Literal(text.into())
    }

    pub fn regex(pattern: &str) -> Result<Self> {
        let re = Regex::new(pattern).map_err(|e| {
            BenchError::config(format!("invalid success_pattern regex '{pattern}': {e}"))
        })?;
        Ok(SuccessMatcher::Regex(re))
    }

    pub fn is_match(&self, line: &str) -> bool {
        match self {
            SuccessMatcher::Literal(text) => line.contains(text.as_str()),
            SuccessMatcher::Regex(re) => re.is_match(line),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SuccessMatcher::Literal(text) => text,
            SuccessMatcher::Regex(re) => re.as_str(),
        }
    }
}

impl Default for SuccessMatcher {
    fn default() -> Self {
        SuccessMatcher::literal(DEFAULT_SUCCESS_MARKER)
    }
}

impl fmt::Debug for SuccessMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuccessMatcher::Literal(text) => f.debug_tuple("Literal").field(text).finish(),
            SuccessMatcher::Regex(re) => f.debug_tuple("Regex").field(&re.as_str()).finish(),
        }
    }
}

/// Program plus argument template shared by every job of a batch.
///
/// Arguments may contain the placeholders `{output}`, `{id}`, `{index}` and
/// `{count}`, which are substituted per job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandTemplate {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Substitute placeholders for a single job.
    pub fn render_args(&self, id: &str, index: usize, count: usize, output: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{output}", output)
                    .replace("{id}", id)
                    .replace("{index}", &index.to_string())
                    .replace("{count}", &count.to_string())
            })
            .collect()
    }
}
