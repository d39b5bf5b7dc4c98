// src/exec/handle.rs

//! Ownership of one spawned render backend process.

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::errors::{BenchError, Result};
use crate::job::{ExitDisposition, JobDescriptor, RunOutcome, classify};

use super::os;
use super::sinks::LogSinks;

/// Number of stderr lines attached to unsuccessful outcomes.
const STDERR_TAIL_LINES: usize = 10;

/// Liveness state of a worker.
///
/// `TimedOut` and `Exited` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Running,
    /// Still running, but the success signature has been seen.
    SucceededSignal,
    /// Past its timeout with the signature seen; waiting out the grace window.
    GracePeriod,
    TimedOut,
    Exited,
}

impl WorkerState {
    pub fn is_terminal(self) -> bool {
        matches!(self, WorkerState::TimedOut | WorkerState::Exited)
    }
}

/// A running (or just-finished) job process plus everything observed about it.
#[derive(Debug)]
pub struct WorkerHandle {
    descriptor: Arc<JobDescriptor>,
    child: Child,
    pid: Option<u32>,
    sinks: LogSinks,
    started_at: Instant,
    last_output_activity_at: SystemTime,
    state: WorkerState,
    grace_deadline: Option<Instant>,
    signature_seen: bool,
    scan_offset: u64,
    stderr_start: u64,
    exit_code: Option<i32>,
    finished_at: Option<Instant>,
    peak_memory_kb: Option<u64>,
    idle_warned: bool,
}

impl WorkerHandle {
    /// Start the job's process with stdout/stderr appended to its log sinks.
    ///
    /// The child gets a null stdin and, on Unix, its own process group so it
    /// is detached from the orchestrator's terminal.
    pub fn spawn(descriptor: Arc<JobDescriptor>, log_dir: &Path) -> Result<Self> {
        let sinks = LogSinks::for_job(log_dir, &descriptor.id);
        let spawn_err = |source| BenchError::SpawnError {
            job: descriptor.id.clone(),
            source,
        };

        let (stdout, stderr) = sinks.open().map_err(spawn_err)?;
        // Sinks are append-only; only bytes written by this run count.
        let stdout_start = stdout.metadata().map(|m| m.len()).unwrap_or(0);
        let stderr_start = stderr.metadata().map(|m| m.len()).unwrap_or(0);

        let mut cmd = Command::new(&descriptor.command);
        cmd.args(&descriptor.arguments)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let child = cmd.spawn().map_err(spawn_err)?;
        let pid = child.id();

        info!(
            job = %descriptor.id,
            pid = ?pid,
            cmd = %descriptor.command_line(),
            "spawned job process"
        );

        Ok(Self {
            descriptor,
            child,
            pid,
            sinks,
            started_at: Instant::now(),
            last_output_activity_at: SystemTime::now(),
            state: WorkerState::Running,
            grace_deadline: None,
            signature_seen: false,
            scan_offset: stdout_start,
            stderr_start,
            exit_code: None,
            finished_at: None,
            peak_memory_kb: None,
            idle_warned: false,
        })
    }

    pub fn descriptor(&self) -> &JobDescriptor {
        &self.descriptor
    }

    pub fn id(&self) -> &str {
        &self.descriptor.id
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn sinks(&self) -> &LogSinks {
        &self.sinks
    }

    pub fn grace_deadline(&self) -> Option<Instant> {
        self.grace_deadline
    }

    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started_at)
    }

    /// Refresh `last_output_activity_at` from the sinks' modification times
    /// and return how long the job has been silent.
    ///
    /// This is a heuristic: timestamp resolution and buffered writes make it
    /// unsuitable as a kill signal.
    pub fn poll_activity(&mut self) -> Duration {
        if let Some(modified) = self.sinks.latest_modification() {
            if modified > self.last_output_activity_at {
                self.last_output_activity_at = modified;
                self.idle_warned = false;
            }
        }
        SystemTime::now()
            .duration_since(self.last_output_activity_at)
            .unwrap_or(Duration::ZERO)
    }

    /// Returns the idle duration the first time a silent stretch crosses
    /// `threshold`; `None` otherwise.
    pub fn idle_warning_due(&mut self, threshold: Duration) -> Option<Duration> {
        let idle = self.poll_activity();
        if idle >= threshold && !self.idle_warned {
            self.idle_warned = true;
            Some(idle)
        } else {
            None
        }
    }

    /// Whether the success pattern has appeared in the stdout sink.
    ///
    /// Scans only bytes not seen before and stops scanning for good after the
    /// first hit.
    pub fn check_success_signature(&mut self) -> bool {
        if !self.signature_seen {
            self.scan_stdout(false);
        }
        self.signature_seen
    }

    fn scan_stdout(&mut self, include_partial_line: bool) {
        let bytes = match self.sinks.read_stdout_from(self.scan_offset) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(job = %self.id(), error = %e, "could not read stdout sink");
                return;
            }
        };

        let complete = match bytes.iter().rposition(|b| *b == b'\n') {
            Some(pos) => pos + 1,
            None => 0,
        };
        let scan_len = if include_partial_line { bytes.len() } else { complete };

        let text = String::from_utf8_lossy(&bytes[..scan_len]);
        if text.lines().any(|line| self.descriptor.success_pattern.is_match(line)) {
            self.signature_seen = true;
            if self.state == WorkerState::Running {
                self.state = WorkerState::SucceededSignal;
            }
            debug!(
                job = %self.id(),
                age_ms = self.age(Instant::now()).as_millis() as u64,
                "success signature observed"
            );
        }
        self.scan_offset += complete as u64;
    }

    /// Keep the highest memory reading seen for the process.
    pub fn sample_memory(&mut self) {
        if let Some(kb) = self.pid.and_then(os::peak_rss_kb) {
            self.peak_memory_kb = Some(self.peak_memory_kb.map_or(kb, |prev| prev.max(kb)));
        }
    }

    /// Non-blocking exit check. `Some(code)` once the process has ended;
    /// the inner `None` means it was ended by a signal.
    pub fn try_exit(&mut self) -> std::io::Result<Option<Option<i32>>> {
        if self.state == WorkerState::Exited {
            return Ok(Some(self.exit_code));
        }
        if self.state == WorkerState::TimedOut {
            return Ok(None);
        }
        Ok(self.child.try_wait()?.map(|status| status.code()))
    }

    /// `None` means the grace window has no end.
    pub fn enter_grace(&mut self, deadline: Option<Instant>) {
        self.state = WorkerState::GracePeriod;
        self.grace_deadline = deadline;
    }

    /// Record a natural exit observed at `now`.
    pub fn mark_exited(&mut self, exit_code: Option<i32>, now: Instant) {
        if self.state.is_terminal() {
            return;
        }
        // Pick up a marker printed right before exit, newline or not.
        if !self.signature_seen {
            self.scan_stdout(true);
        }
        self.state = WorkerState::Exited;
        self.exit_code = exit_code;
        self.finished_at = Some(now);
    }

    /// Forcibly kill the process (and its process group).
    ///
    /// Returns `true` if a kill was issued. Calling this on a handle that is
    /// already terminal, or whose process has already exited, does nothing
    /// beyond recording that exit.
    pub fn terminate(&mut self) -> bool {
        if self.state.is_terminal() {
            return false;
        }

        let now = Instant::now();
        if let Ok(Some(status)) = self.child.try_wait() {
            self.mark_exited(status.code(), now);
            return false;
        }

        if let Some(pid) = self.pid {
            if let Err(e) = os::kill_process_group(pid) {
                debug!(job = %self.id(), pid, error = %e, "killpg failed");
            }
        }
        if let Err(e) = self.child.start_kill() {
            warn!(job = %self.id(), error = %e, "failed to kill job process");
        }
        // Reap right away if the kill already landed.
        let _ = self.child.try_wait();

        let age = self.age(now);
        let note = format!(
            "[renderbench] forced termination of {} after {:.2}s (success signature observed: {})",
            self.descriptor.id,
            age.as_secs_f64(),
            if self.signature_seen { "yes" } else { "no" }
        );
        if let Err(e) = self.sinks.append_diagnostic(&note) {
            warn!(job = %self.id(), error = %e, "could not append termination note");
        }

        self.state = WorkerState::TimedOut;
        self.finished_at = Some(now);
        true
    }

    /// Turn a terminal handle into its outcome, checking the artifact now.
    ///
    /// `epoch` is the batch start that offsets are measured from.
    pub fn retire(self, epoch: Instant) -> RunOutcome {
        let finished_at = self.finished_at.unwrap_or_else(Instant::now);
        let disposition = match self.state {
            WorkerState::TimedOut => ExitDisposition::TimedOut,
            _ => ExitDisposition::Exited(self.exit_code),
        };
        let artifact_exists = self.descriptor.expected_artifact_path.exists();
        let classification = classify(disposition, self.signature_seen, artifact_exists);
        let stderr_tail = if classification == crate::job::Classification::Success {
            Vec::new()
        } else {
            self.sinks.stderr_tail(self.stderr_start, STDERR_TAIL_LINES)
        };

        RunOutcome {
            job_id: self.descriptor.id.clone(),
            artifact_path: self.descriptor.expected_artifact_path.clone(),
            exit_code: disposition.exit_code(),
            elapsed: finished_at.saturating_duration_since(self.started_at),
            started_offset: self.started_at.saturating_duration_since(epoch),
            finished_offset: finished_at.saturating_duration_since(epoch),
            had_success_signature: self.signature_seen,
            artifact_exists,
            classification,
            peak_memory_kb: self.peak_memory_kb,
            stderr_tail,
            error: None,
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        // `kill_on_drop` only reaches the direct child.
        if !self.state.is_terminal() {
            if let Some(pid) = self.pid {
                let _ = os::kill_process_group(pid);
            }
        }
    }
}
