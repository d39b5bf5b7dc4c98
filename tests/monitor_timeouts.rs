// tests/monitor_timeouts.rs
#![cfg(unix)]

mod common;
use crate::common::{
    FakeBackend, TestResult, coordinator, count_occurrences, init_tracing, stderr_log, with_timeout,
};

use std::sync::Arc;
use std::time::Duration;

use renderbench::exec::{WorkerHandle, WorkerState};
use renderbench::job::{Classification, JobDescriptor, SuccessMatcher};
use renderbench::types::RunMode;

#[tokio::test]
async fn hung_job_without_signature_is_killed_at_timeout() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;

    let job = FakeBackend::new()
        .sleep_ms(10_000)
        .write_artifact()
        .descriptor(1, &dir.path().join("a.pdf"), Duration::from_millis(500));

    let coord = coordinator(dir.path(), 50, 1000);
    let report = with_timeout(coord.run(vec![job], RunMode::Parallel)).await?;
    let outcome = &report.outcomes[0];

    assert_eq!(outcome.classification, Classification::TimedOutNoSignal);
    assert_eq!(outcome.exit_code, None);
    assert!(!outcome.had_success_signature);
    assert!(outcome.elapsed >= Duration::from_millis(500));
    // No grace without a signature.
    assert!(
        outcome.elapsed < Duration::from_millis(1400),
        "elapsed {:?}",
        outcome.elapsed
    );

    let log = stderr_log(&dir.path().join("logs"), "job-001");
    assert_eq!(count_occurrences(&log, "forced termination"), 1);
    assert_eq!(count_occurrences(&log, "success signature observed: no"), 1);
    Ok(())
}

#[tokio::test]
async fn signature_before_timeout_earns_grace_and_succeeds() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;

    // Marker at timeout - 200ms, exit at timeout + grace/2.
    let job = FakeBackend::new()
        .sleep_ms(800)
        .print_signature()
        .write_artifact()
        .sleep_ms(1200)
        .descriptor(1, &dir.path().join("a.pdf"), Duration::from_millis(1000));

    let coord = coordinator(dir.path(), 50, 2000);
    let report = with_timeout(coord.run(vec![job], RunMode::Parallel)).await?;
    let outcome = &report.outcomes[0];

    assert_eq!(outcome.classification, Classification::Success);
    assert_eq!(outcome.exit_code, Some(0));
    assert!(outcome.had_success_signature);
    assert!(outcome.artifact_exists);
    let log = stderr_log(&dir.path().join("logs"), "job-001");
    assert_eq!(count_occurrences(&log, "forced termination"), 0);
    Ok(())
}

#[tokio::test]
async fn signature_then_hang_is_killed_after_grace() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;

    let job = FakeBackend::new()
        .print_signature()
        .write_artifact()
        .sleep_ms(10_000)
        .descriptor(1, &dir.path().join("a.pdf"), Duration::from_millis(400));

    let coord = coordinator(dir.path(), 50, 300);
    let report = with_timeout(coord.run(vec![job], RunMode::Parallel)).await?;
    let outcome = &report.outcomes[0];

    assert_eq!(outcome.classification, Classification::TimedOutAfterSignal);
    assert!(outcome.had_success_signature);
    assert!(outcome.elapsed >= Duration::from_millis(700), "elapsed {:?}", outcome.elapsed);
    assert_eq!(
        count_occurrences(
            &stderr_log(&dir.path().join("logs"), "job-001"),
            "success signature observed: yes"
        ),
        1
    );
    Ok(())
}

#[tokio::test]
async fn zero_grace_kills_at_the_timeout_boundary() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;

    let job = FakeBackend::new()
        .print_signature()
        .sleep_ms(10_000)
        .descriptor(1, &dir.path().join("a.pdf"), Duration::from_millis(300));

    let coord = coordinator(dir.path(), 50, 0);
    let report = with_timeout(coord.run(vec![job], RunMode::Sequential)).await?;
    assert_eq!(report.outcomes[0].classification, Classification::TimedOutAfterSignal);
    assert!(report.outcomes[0].elapsed < Duration::from_millis(1000));
    Ok(())
}

fn sleeper(dir: &std::path::Path, secs: u32) -> JobDescriptor {
    JobDescriptor {
        id: "job-001".into(),
        index: 1,
        command: "sleep".into(),
        arguments: vec![secs.to_string()],
        expected_artifact_path: dir.join("never.pdf"),
        timeout: Duration::from_secs(30),
        success_pattern: SuccessMatcher::default(),
    }
}

#[tokio::test]
async fn terminate_twice_is_a_no_op_the_second_time() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;

    let mut handle = WorkerHandle::spawn(Arc::new(sleeper(dir.path(), 30)), dir.path())?;
    assert_eq!(handle.state(), WorkerState::Running);

    assert!(handle.terminate());
    assert!(!handle.terminate());
    assert_eq!(handle.state(), WorkerState::TimedOut);

    let log = handle.sinks().stderr.clone();
    assert_eq!(count_occurrences(&log, "forced termination"), 1);

    let outcome = handle.retire(std::time::Instant::now());
    assert_eq!(outcome.classification, Classification::TimedOutNoSignal);
    Ok(())
}

#[tokio::test]
async fn terminate_after_natural_exit_records_the_exit() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;

    let job = FakeBackend::instant_success().descriptor(
        1,
        &dir.path().join("a.pdf"),
        Duration::from_secs(5),
    );
    let mut handle = WorkerHandle::spawn(Arc::new(job), dir.path())?;

    with_timeout(async {
        while handle.sinks().stdout.metadata().map(|m| m.len()).unwrap_or(0) == 0 {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert!(!handle.terminate());
    assert_eq!(handle.state(), WorkerState::Exited);
    assert_eq!(count_occurrences(&handle.sinks().stderr, "forced termination"), 0);

    let outcome = handle.retire(std::time::Instant::now());
    assert_eq!(outcome.classification, Classification::Success);
    Ok(())
}

#[tokio::test]
async fn marker_without_trailing_newline_is_seen_on_exit() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let artifact = dir.path().join("a.pdf");

    let job = JobDescriptor {
        id: "job-001".into(),
        index: 1,
        command: "sh".into(),
        arguments: vec![
            "-c".into(),
            "echo pdf > \"$1\"; printf 'PDF saved to: %s' \"$1\"".into(),
            "fake-backend".into(),
            artifact.to_string_lossy().into_owned(),
        ],
        expected_artifact_path: artifact.clone(),
        timeout: Duration::from_secs(5),
        success_pattern: SuccessMatcher::default(),
    };

    let coord = coordinator(dir.path(), 50, 500);
    let report = with_timeout(coord.run(vec![job], RunMode::Parallel)).await?;
    assert!(report.outcomes[0].had_success_signature);
    assert_eq!(report.outcomes[0].classification, Classification::Success);
    Ok(())
}

#[tokio::test]
async fn regex_success_pattern_is_matched_per_line() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;

    let mut job = FakeBackend::new()
        .stdout("rendered 3 pages")
        .write_artifact()
        .descriptor(1, &dir.path().join("a.pdf"), Duration::from_secs(5));
    job.success_pattern = SuccessMatcher::regex(r"^rendered \d+ pages$")?;

    let coord = coordinator(dir.path(), 50, 500);
    let report = with_timeout(coord.run(vec![job], RunMode::Parallel)).await?;
    assert!(report.outcomes[0].had_success_signature);
    Ok(())
}

#[tokio::test]
async fn idle_warning_fires_once_per_silent_stretch() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let threshold = Duration::from_millis(150);

    let job = FakeBackend::new()
        .sleep_ms(500)
        .stdout("still rendering")
        .sleep_ms(5_000)
        .descriptor(1, &dir.path().join("a.pdf"), Duration::from_secs(30));
    let mut handle = WorkerHandle::spawn(Arc::new(job), dir.path())?;

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(handle.idle_warning_due(threshold).is_some());
    assert!(handle.idle_warning_due(threshold).is_none());

    // New output at ~500ms re-arms the warning for the next silent stretch.
    tokio::time::sleep(Duration::from_millis(750)).await;
    let idle = handle.idle_warning_due(threshold);
    assert!(
        idle.is_some_and(|d| d < Duration::from_millis(900)),
        "idle {idle:?}"
    );
    assert!(handle.idle_warning_due(threshold).is_none());

    assert_eq!(handle.state(), WorkerState::Running);
    assert!(handle.terminate());
    Ok(())
}
