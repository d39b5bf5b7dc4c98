// src/monitor/mod.rs

//! Liveness monitor.
//!
//! A polling state machine over the set of live `WorkerHandle`s. Each tick:
//! 1. refreshes log activity, memory and the success signature per handle,
//! 2. asks [`policy::next_transition`] what to do,
//! 3. applies it (enter grace, kill, record exit),
//! 4. retires terminal handles into `RunOutcome`s straight away, so the
//!    artifact check happens at the moment the job ends.
//!
//! The children are opaque: exit status, age and log contents/mtimes are the
//! only signals available.

pub mod policy;

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::exec::WorkerHandle;
use crate::job::{Classification, RunOutcome};
use crate::types::JobId;

pub use policy::{PollView, Transition, next_transition};

/// Tunables of the polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    pub poll_interval: Duration,
    pub grace_period: Duration,
    /// Warn once per silent stretch of this length. Never kills anything.
    pub idle_warning: Option<Duration>,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            grace_period: Duration::from_secs(2),
            idle_warning: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LivenessMonitor {
    settings: MonitorSettings,
}

impl LivenessMonitor {
    pub fn new(settings: MonitorSettings) -> Self {
        Self { settings }
    }

    /// Poll until every handle is terminal, returning outcomes in completion
    /// order. The map is empty afterwards.
    pub async fn drive(
        &self,
        handles: &mut BTreeMap<JobId, WorkerHandle>,
        epoch: Instant,
    ) -> Vec<RunOutcome> {
        let mut outcomes = Vec::with_capacity(handles.len());

        loop {
            outcomes.extend(self.tick(handles, epoch));
            if handles.is_empty() {
                break;
            }
            tokio::time::sleep(self.settings.poll_interval).await;
        }

        outcomes
    }

    /// One poll pass over all handles. Terminal handles are removed from the
    /// map and returned as outcomes.
    pub fn tick(
        &self,
        handles: &mut BTreeMap<JobId, WorkerHandle>,
        epoch: Instant,
    ) -> Vec<RunOutcome> {
        let now = Instant::now();
        let mut finished: Vec<JobId> = Vec::new();

        for (id, handle) in handles.iter_mut() {
            self.observe(handle);

            let exited = match handle.try_exit() {
                Ok(exited) => exited,
                Err(e) => {
                    warn!(job = %id, error = %e, "could not query job process status");
                    None
                }
            };

            let view = PollView {
                state: handle.state(),
                exited,
                age: handle.age(now),
                timeout: handle.descriptor().timeout,
                signature_seen: handle.check_success_signature(),
                grace_deadline: handle.grace_deadline(),
                now,
            };

            match next_transition(&view, self.settings.grace_period) {
                Transition::Stay => {}
                Transition::Exited { exit_code } => {
                    handle.mark_exited(exit_code, now);
                    finished.push(id.clone());
                }
                Transition::EnterGrace { deadline } => {
                    info!(
                        job = %id,
                        age_ms = view.age.as_millis() as u64,
                        grace_ms = self.settings.grace_period.as_millis() as u64,
                        "timeout reached after success signature; granting grace period"
                    );
                    handle.enter_grace(deadline);
                }
                Transition::Terminate => {
                    warn!(
                        job = %id,
                        age_ms = view.age.as_millis() as u64,
                        signature_seen = view.signature_seen,
                        "job exceeded its timeout; terminating"
                    );
                    handle.terminate();
                    finished.push(id.clone());
                }
            }
        }

        finished
            .into_iter()
            .filter_map(|id| handles.remove(&id))
            .map(|handle| {
                let outcome = handle.retire(epoch);
                log_outcome(&outcome);
                outcome
            })
            .collect()
    }

    fn observe(&self, handle: &mut WorkerHandle) {
        handle.sample_memory();
        match self.settings.idle_warning {
            Some(threshold) => {
                if let Some(idle) = handle.idle_warning_due(threshold) {
                    warn!(
                        job = %handle.id(),
                        idle_ms = idle.as_millis() as u64,
                        "no log output for a while; job may be stalled"
                    );
                }
            }
            None => {
                handle.poll_activity();
            }
        }
    }
}

fn log_outcome(outcome: &RunOutcome) {
    let elapsed_ms = outcome.elapsed.as_millis() as u64;
    match outcome.classification {
        Classification::Success => info!(
            job = %outcome.job_id,
            elapsed_ms,
            "job succeeded"
        ),
        Classification::FailedExit => warn!(
            job = %outcome.job_id,
            exit_code = ?outcome.exit_code,
            elapsed_ms,
            stderr_tail = %outcome.stderr_tail.join(" | "),
            "backend failure"
        ),
        Classification::MissingArtifact => warn!(
            job = %outcome.job_id,
            artifact = %outcome.artifact_path.display(),
            signature = outcome.had_success_signature,
            "job exited cleanly but its artifact is missing"
        ),
        other => warn!(
            job = %outcome.job_id,
            classification = %other,
            elapsed_ms,
            "job did not succeed"
        ),
    }
    debug!(job = %outcome.job_id, peak_memory_kb = ?outcome.peak_memory_kb, "job telemetry");
}
