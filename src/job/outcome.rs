// src/job/outcome.rs

//! Terminal per-job results and the rules that classify them.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::types::JobId;

use super::descriptor::JobDescriptor;

/// Final verdict for one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Success,
    FailedExit,
    TimedOutNoSignal,
    TimedOutAfterSignal,
    MissingArtifact,
    SpawnFailed,
}

impl Classification {
    pub fn label(self) -> &'static str {
        match self {
            Classification::Success => "success",
            Classification::FailedExit => "failed_exit",
            Classification::TimedOutNoSignal => "timed_out_no_signal",
            Classification::TimedOutAfterSignal => "timed_out_after_signal",
            Classification::MissingArtifact => "missing_artifact",
            Classification::SpawnFailed => "spawn_failed",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How a job left the running set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitDisposition {
    /// The process ended on its own (or was killed by someone else, in which
    /// case there is no exit code).
    Exited(Option<i32>),
    /// The monitor killed the process after its timeout (and grace period).
    TimedOut,
    /// The process never started.
    SpawnFailed,
}

impl ExitDisposition {
    pub fn exit_code(self) -> Option<i32> {
        match self {
            ExitDisposition::Exited(code) => code,
            ExitDisposition::TimedOut | ExitDisposition::SpawnFailed => None,
        }
    }
}

/// Classify a terminal job.
///
/// `Success` requires exit code 0 *and* the artifact on disk. Otherwise the
/// priority is: non-zero (or missing) exit code, then timeout, then missing
/// artifact.
pub fn classify(
    exit: ExitDisposition,
    had_signature: bool,
    artifact_exists: bool,
) -> Classification {
    match exit {
        ExitDisposition::SpawnFailed => Classification::SpawnFailed,
        ExitDisposition::Exited(Some(0)) if artifact_exists => Classification::Success,
        ExitDisposition::Exited(Some(0)) => Classification::MissingArtifact,
        ExitDisposition::Exited(_) => Classification::FailedExit,
        ExitDisposition::TimedOut if had_signature => Classification::TimedOutAfterSignal,
        ExitDisposition::TimedOut => Classification::TimedOutNoSignal,
    }
}

/// Immutable record of how one job ended.
///
/// Offsets are measured from the start of the batch the job belonged to.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub job_id: JobId,
    pub artifact_path: PathBuf,
    pub exit_code: Option<i32>,
    pub elapsed: Duration,
    pub started_offset: Duration,
    pub finished_offset: Duration,
    pub had_success_signature: bool,
    pub artifact_exists: bool,
    pub classification: Classification,
    pub peak_memory_kb: Option<u64>,
    pub stderr_tail: Vec<String>,
    pub error: Option<String>,
}

impl RunOutcome {
    /// Outcome for a job whose process could not be started.
    pub fn spawn_failed(descriptor: &JobDescriptor, error: String, offset: Duration) -> Self {
        let artifact_exists = descriptor.expected_artifact_path.exists();
        Self {
            job_id: descriptor.id.clone(),
            artifact_path: descriptor.expected_artifact_path.clone(),
            exit_code: None,
            elapsed: Duration::ZERO,
            started_offset: offset,
            finished_offset: offset,
            had_success_signature: false,
            artifact_exists,
            classification: classify(ExitDisposition::SpawnFailed, false, artifact_exists),
            peak_memory_kb: None,
            stderr_tail: Vec::new(),
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.classification == Classification::Success
    }
}
