// src/engine/coordinator.rs

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::errors::{BenchError, Result};
use crate::exec::WorkerHandle;
use crate::job::{JobDescriptor, RunOutcome};
use crate::monitor::LivenessMonitor;
use crate::report::{RunReport, summarize};
use crate::types::{JobId, RunMode};

/// Drives a batch from descriptors to a `RunReport`.
///
/// Individual job failures never abort the batch: every descriptor ends up
/// as exactly one outcome.
#[derive(Debug, Clone)]
pub struct RunCoordinator {
    monitor: LivenessMonitor,
    log_dir: PathBuf,
    clean_outputs: bool,
}

impl RunCoordinator {
    pub fn new(monitor: LivenessMonitor, log_dir: impl Into<PathBuf>) -> Self {
        Self {
            monitor,
            log_dir: log_dir.into(),
            clean_outputs: true,
        }
    }

    /// Whether a leftover artifact is deleted before its job is spawned.
    pub fn with_clean_outputs(mut self, clean: bool) -> Self {
        self.clean_outputs = clean;
        self
    }

    pub fn with_log_dir(mut self, log_dir: impl Into<PathBuf>) -> Self {
        self.log_dir = log_dir.into();
        self
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Run the whole batch.
    ///
    /// Fails only for batch-level problems (empty batch, duplicate ids or
    /// artifact paths), before any process is spawned.
    pub async fn run(&self, batch: Vec<JobDescriptor>, mode: RunMode) -> Result<RunReport> {
        validate_batch(&batch)?;

        info!(
            mode = %mode,
            jobs = batch.len(),
            log_dir = %self.log_dir.display(),
            "starting batch"
        );

        let epoch = Instant::now();
        let outcomes = match mode {
            RunMode::Parallel => self.run_parallel(batch, epoch).await,
            RunMode::Sequential => self.run_sequential(batch, epoch).await,
        };

        let report = summarize(mode, outcomes);
        info!(
            total = report.total,
            succeeded = report.succeeded,
            failed = report.failed,
            elapsed_ms = report.batch_elapsed.as_millis() as u64,
            "batch finished"
        );
        Ok(report)
    }

    /// Spawn everything up front, then monitor all handles together.
    async fn run_parallel(&self, batch: Vec<JobDescriptor>, epoch: Instant) -> Vec<RunOutcome> {
        let mut outcomes = Vec::with_capacity(batch.len());
        let mut handles: BTreeMap<JobId, WorkerHandle> = BTreeMap::new();

        for descriptor in batch {
            match self.launch(descriptor, epoch) {
                Ok(handle) => {
                    handles.insert(handle.id().to_string(), handle);
                }
                Err(outcome) => outcomes.push(outcome),
            }
        }

        debug!(live = handles.len(), "all jobs launched; monitoring");
        outcomes.extend(self.monitor.drive(&mut handles, epoch).await);
        outcomes
    }

    /// One job at a time; job k+1 is spawned only after job k is terminal.
    async fn run_sequential(&self, batch: Vec<JobDescriptor>, epoch: Instant) -> Vec<RunOutcome> {
        let mut outcomes = Vec::with_capacity(batch.len());

        for descriptor in batch {
            match self.launch(descriptor, epoch) {
                Ok(handle) => {
                    let mut handles = BTreeMap::new();
                    handles.insert(handle.id().to_string(), handle);
                    outcomes.extend(self.monitor.drive(&mut handles, epoch).await);
                }
                Err(outcome) => outcomes.push(outcome),
            }
        }

        outcomes
    }

    /// Spawn one job; a spawn failure becomes the job's outcome right away.
    fn launch(
        &self,
        descriptor: JobDescriptor,
        epoch: Instant,
    ) -> std::result::Result<WorkerHandle, RunOutcome> {
        if self.clean_outputs {
            remove_stale_artifact(&descriptor);
        }

        // Backends only write the file; its directory is ours to provide.
        if let Err(e) = create_artifact_dir(&descriptor) {
            error!(
                job = %descriptor.id,
                artifact = %descriptor.expected_artifact_path.display(),
                error = %e,
                "could not create artifact directory"
            );
            let offset = Instant::now().saturating_duration_since(epoch);
            let message = format!("failed to create artifact directory: {e}");
            return Err(RunOutcome::spawn_failed(&descriptor, message, offset));
        }

        let descriptor = Arc::new(descriptor);
        match WorkerHandle::spawn(Arc::clone(&descriptor), &self.log_dir) {
            Ok(handle) => Ok(handle),
            Err(err) => {
                error!(job = %descriptor.id, error = %err, "could not start job");
                let offset = Instant::now().saturating_duration_since(epoch);
                Err(RunOutcome::spawn_failed(&descriptor, err.to_string(), offset))
            }
        }
    }
}

fn create_artifact_dir(descriptor: &JobDescriptor) -> std::io::Result<()> {
    match descriptor.expected_artifact_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

fn remove_stale_artifact(descriptor: &JobDescriptor) {
    let path = &descriptor.expected_artifact_path;
    if !path.exists() {
        return;
    }
    match std::fs::remove_file(path) {
        Ok(()) => debug!(
            job = %descriptor.id,
            artifact = %path.display(),
            "removed stale artifact"
        ),
        Err(e) => warn!(
            job = %descriptor.id,
            artifact = %path.display(),
            error = %e,
            "could not remove stale artifact; presence check may be unreliable"
        ),
    }
}

fn validate_batch(batch: &[JobDescriptor]) -> Result<()> {
    if batch.is_empty() {
        return Err(BenchError::config("batch must contain at least one job"));
    }

    let mut ids = HashSet::new();
    let mut paths = HashSet::new();
    for job in batch {
        if !ids.insert(job.id.as_str()) {
            return Err(BenchError::config(format!("duplicate job id '{}'", job.id)));
        }
        if !paths.insert(job.expected_artifact_path.as_path()) {
            return Err(BenchError::config(format!(
                "artifact path {} is shared by more than one job",
                job.expected_artifact_path.display()
            )));
        }
    }
    Ok(())
}
