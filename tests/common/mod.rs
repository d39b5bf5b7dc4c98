#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

use renderbench::engine::RunCoordinator;
use renderbench::monitor::{LivenessMonitor, MonitorSettings};

pub use renderbench_test_utils::fake_backend::FakeBackend;
pub use renderbench_test_utils::{count_occurrences, init_tracing, stderr_log, with_timeout};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub fn monitor(poll_ms: u64, grace_ms: u64) -> LivenessMonitor {
    LivenessMonitor::new(MonitorSettings {
        poll_interval: Duration::from_millis(poll_ms),
        grace_period: Duration::from_millis(grace_ms),
        idle_warning: None,
    })
}

pub fn coordinator(dir: &Path, poll_ms: u64, grace_ms: u64) -> RunCoordinator {
    RunCoordinator::new(monitor(poll_ms, grace_ms), dir.join("logs"))
}
