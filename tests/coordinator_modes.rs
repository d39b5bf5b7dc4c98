// tests/coordinator_modes.rs
#![cfg(unix)]

mod common;
use crate::common::{FakeBackend, TestResult, coordinator, init_tracing, with_timeout};

use std::collections::HashSet;
use std::time::Duration;

use renderbench::engine::RunCoordinator;
use renderbench::errors::BenchError;
use renderbench::job::{Classification, JobDescriptor};
use renderbench::monitor::{LivenessMonitor, MonitorSettings};
use renderbench::report::overall_exit_code;
use renderbench::types::RunMode;

fn timeout() -> Duration {
    Duration::from_secs(5)
}

#[tokio::test]
async fn every_job_yields_exactly_one_outcome_despite_failures() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let out = |i: usize| dir.path().join(format!("r-{i}.pdf"));

    let batch = vec![
        FakeBackend::instant_success().descriptor(1, &out(1), timeout()),
        FakeBackend::new()
            .stderr("boom")
            .exit_code(3)
            .descriptor(2, &out(2), timeout()),
        FakeBackend::new().print_signature().descriptor(3, &out(3), timeout()),
        FakeBackend::new()
            .sleep_ms(10_000)
            .descriptor(4, &out(4), Duration::from_millis(300)),
    ];

    let coord = coordinator(dir.path(), 50, 200);
    let report = with_timeout(coord.run(batch, RunMode::Parallel)).await?;

    assert_eq!(report.total, 4);
    assert_eq!(report.outcomes.len(), 4);
    let ids: HashSet<_> = report.outcomes.iter().map(|o| o.job_id.as_str()).collect();
    assert_eq!(ids.len(), 4);

    let by_id = report.outcomes_by_id();
    assert_eq!(by_id[0].classification, Classification::Success);
    assert_eq!(by_id[1].classification, Classification::FailedExit);
    assert_eq!(by_id[1].exit_code, Some(3));
    assert!(by_id[1].stderr_tail.iter().any(|l| l == "boom"));
    assert_eq!(by_id[2].classification, Classification::MissingArtifact);
    assert!(by_id[2].had_success_signature);
    assert_eq!(by_id[3].classification, Classification::TimedOutNoSignal);

    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 3);
    assert_eq!(overall_exit_code(std::slice::from_ref(&report)), 1);
    assert!(report.missing_artifacts.contains(&"job-003".to_string()));
    Ok(())
}

#[tokio::test]
async fn sequential_jobs_never_overlap() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;

    let batch: Vec<JobDescriptor> = (1..=3)
        .map(|i| {
            FakeBackend::new()
                .sleep_ms(150)
                .print_signature()
                .write_artifact()
                .descriptor(i, &dir.path().join(format!("r-{i}.pdf")), timeout())
        })
        .collect();

    let coord = coordinator(dir.path(), 30, 500);
    let report = with_timeout(coord.run(batch, RunMode::Sequential)).await?;

    assert!(report.all_succeeded());
    let ids: Vec<_> = report.outcomes.iter().map(|o| o.job_id.as_str()).collect();
    assert_eq!(ids, vec!["job-001", "job-002", "job-003"]);
    for pair in report.outcomes.windows(2) {
        assert!(
            pair[1].started_offset >= pair[0].finished_offset,
            "{} started at {:?} before {} finished at {:?}",
            pair[1].job_id,
            pair[1].started_offset,
            pair[0].job_id,
            pair[0].finished_offset
        );
    }

    let sum: Duration = report.outcomes.iter().map(|o| o.elapsed).sum();
    assert_eq!(report.batch_elapsed, sum);
    Ok(())
}

#[tokio::test]
async fn parallel_batch_elapsed_tracks_a_single_job() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let poll = Duration::from_millis(100);

    let batch: Vec<JobDescriptor> = (1..=10)
        .map(|i| {
            let artifact = dir.path().join(format!("r-{i}.pdf"));
            FakeBackend::instant_success().descriptor(i, &artifact, timeout())
        })
        .collect();

    let coord = coordinator(dir.path(), 100, 500);
    let report = with_timeout(coord.run(batch, RunMode::Parallel)).await?;

    assert_eq!(report.succeeded, 10);
    let longest = report.outcomes.iter().map(|o| o.elapsed).max().unwrap_or_default();
    assert!(
        report.batch_elapsed <= longest + 3 * poll,
        "batch {:?} vs longest job {:?}",
        report.batch_elapsed,
        longest
    );
    Ok(())
}

#[tokio::test]
async fn parallel_sleepers_overlap_in_time() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;

    let batch: Vec<JobDescriptor> = (1..=6)
        .map(|i| {
            FakeBackend::new()
                .sleep_ms(400)
                .print_signature()
                .write_artifact()
                .descriptor(i, &dir.path().join(format!("r-{i}.pdf")), timeout())
        })
        .collect();

    let coord = coordinator(dir.path(), 50, 500);
    let report = with_timeout(coord.run(batch, RunMode::Parallel)).await?;

    assert!(report.all_succeeded());
    // Six 400ms jobs back to back would take 2.4s.
    assert!(
        report.batch_elapsed < Duration::from_millis(1500),
        "{:?}",
        report.batch_elapsed
    );
    Ok(())
}

#[tokio::test]
async fn spawn_failure_is_recorded_and_the_batch_continues() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;

    let mut batch: Vec<JobDescriptor> = (1..=5)
        .map(|i| {
            let artifact = dir.path().join(format!("r-{i}.pdf"));
            FakeBackend::instant_success().descriptor(i, &artifact, timeout())
        })
        .collect();
    batch[2].command = "/nonexistent/render-backend".to_string();

    for mode in [RunMode::Parallel, RunMode::Sequential] {
        let coord = coordinator(dir.path(), 50, 500);
        let report = with_timeout(coord.run(batch.clone(), mode)).await?;

        assert_eq!(report.total, 5);
        assert_eq!(report.succeeded, 4);
        assert_eq!(report.count(Classification::SpawnFailed), 1);
        let failed = report
            .outcomes
            .iter()
            .find(|o| o.classification == Classification::SpawnFailed)
            .expect("spawn failure outcome");
        assert_eq!(failed.job_id, "job-003");
        assert!(failed.error.as_deref().unwrap_or("").contains("job-003"));
        assert_ne!(overall_exit_code(std::slice::from_ref(&report)), 0);
    }
    Ok(())
}

#[tokio::test]
async fn stale_artifacts_are_removed_before_spawn() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let artifact = dir.path().join("stale.pdf");

    // Exits 0 without writing anything.
    let job = FakeBackend::new().print_signature().descriptor(1, &artifact, timeout());

    std::fs::write(&artifact, b"left over")?;
    let coord = coordinator(dir.path(), 50, 500);
    let report = with_timeout(coord.run(vec![job.clone()], RunMode::Parallel)).await?;
    assert_eq!(report.outcomes[0].classification, Classification::MissingArtifact);

    std::fs::write(&artifact, b"left over")?;
    let keep = coordinator(dir.path(), 50, 500).with_clean_outputs(false);
    let report = with_timeout(keep.run(vec![job], RunMode::Parallel)).await?;
    assert_eq!(report.outcomes[0].classification, Classification::Success);
    Ok(())
}

#[tokio::test]
async fn invalid_batches_fail_before_spawning() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let coord = coordinator(dir.path(), 50, 500);

    let empty = coord.run(Vec::new(), RunMode::Parallel).await;
    assert!(matches!(empty, Err(BenchError::ConfigError(_))));

    let job = FakeBackend::instant_success().descriptor(1, &dir.path().join("a.pdf"), timeout());
    let mut twin = job.clone();
    twin.expected_artifact_path = dir.path().join("b.pdf");
    let dup = coord.run(vec![job, twin], RunMode::Parallel).await;
    assert!(matches!(
        dup,
        Err(BenchError::ConfigError(msg)) if msg.contains("duplicate job id")
    ));

    assert!(!dir.path().join("logs").exists());
    Ok(())
}

#[tokio::test]
async fn missing_artifact_directories_are_created() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let out_dir = dir.path().join("out").join("round-02");

    let batch: Vec<JobDescriptor> = (1..=2)
        .map(|i| {
            let artifact = out_dir.join(format!("render-{i:03}.pdf"));
            FakeBackend::instant_success().descriptor(i, &artifact, timeout())
        })
        .collect();

    let coord = coordinator(dir.path(), 50, 500);
    let report = with_timeout(coord.run(batch, RunMode::Parallel)).await?;

    assert_eq!(report.count(Classification::Success), 2, "{report:?}");
    assert!(out_dir.join("render-002.pdf").exists());
    Ok(())
}

#[tokio::test]
async fn uncreatable_artifact_directory_is_a_spawn_failure() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"not a directory")?;

    let batch = vec![
        FakeBackend::instant_success().descriptor(1, &blocker.join("a.pdf"), timeout()),
        FakeBackend::instant_success().descriptor(2, &dir.path().join("b.pdf"), timeout()),
    ];

    let coord = coordinator(dir.path(), 50, 500);
    let report = with_timeout(coord.run(batch, RunMode::Sequential)).await?;

    let by_id = report.outcomes_by_id();
    assert_eq!(by_id[0].classification, Classification::SpawnFailed);
    assert!(
        by_id[0]
            .error
            .as_deref()
            .unwrap_or("")
            .contains("artifact directory")
    );
    assert_eq!(by_id[1].classification, Classification::Success);
    Ok(())
}

#[tokio::test]
async fn idle_warnings_never_terminate_a_job() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;

    let monitor = LivenessMonitor::new(MonitorSettings {
        poll_interval: Duration::from_millis(25),
        grace_period: Duration::from_millis(500),
        idle_warning: Some(Duration::from_millis(100)),
    });
    let coord = RunCoordinator::new(monitor, dir.path().join("logs"));

    // Silent for six idle thresholds, well inside its timeout.
    let job = FakeBackend::new()
        .sleep_ms(600)
        .print_signature()
        .write_artifact()
        .descriptor(1, &dir.path().join("quiet.pdf"), Duration::from_secs(5));

    let report = with_timeout(coord.run(vec![job], RunMode::Parallel)).await?;
    let outcome = &report.outcomes[0];

    assert_eq!(outcome.classification, Classification::Success);
    assert_eq!(outcome.exit_code, Some(0));
    assert!(outcome.elapsed >= Duration::from_millis(600));
    Ok(())
}
