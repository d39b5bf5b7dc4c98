//! Shared helpers for renderbench integration tests.

pub mod builders;
pub mod fake_backend;

use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Upper bound for any single async test body. Generous because the tests
/// spawn real processes and sleep through real timeouts.
pub const TEST_DEADLINE: Duration = Duration::from_secs(20);

/// Install a test-writer subscriber once per test binary.
///
/// Output only shows for failing tests unless run with `--nocapture`;
/// `RUST_LOG=renderbench=debug` narrows it to the crate.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        fmt().with_env_filter(filter).with_test_writer().init();
    });
}

/// Await `f`, failing the test if it runs past [`TEST_DEADLINE`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(TEST_DEADLINE, f)
        .await
        .unwrap_or_else(|_| panic!("test exceeded {TEST_DEADLINE:?}"))
}

/// Stderr sink a coordinator writes for `job_id` under `log_dir`.
pub fn stderr_log(log_dir: &Path, job_id: &str) -> PathBuf {
    log_dir.join(format!("{job_id}.stderr.log"))
}

/// Number of times `needle` appears in the file; 0 if it does not exist.
pub fn count_occurrences(path: &Path, needle: &str) -> usize {
    std::fs::read_to_string(path)
        .map(|s| s.matches(needle).count())
        .unwrap_or(0)
}
