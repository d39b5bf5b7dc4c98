// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod job;
pub mod logging;
pub mod monitor;
pub mod report;
pub mod types;

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::ConfigFile;
use crate::config::load_with_overrides;
use crate::engine::RunCoordinator;
use crate::errors::{BenchError, Result};
use crate::job::build_batch;
use crate::monitor::LivenessMonitor;
use crate::report::{RunReport, render_text, write_json};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (file + CLI overrides)
/// - batch construction per round
/// - the run coordinator and liveness monitor
/// - text/JSON reporting
/// - Ctrl-C handling
///
/// Returns one report per round (none for `--dry-run`).
pub async fn run(args: CliArgs) -> Result<Vec<RunReport>> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_with_overrides(&config_path, &args)?;

    if args.dry_run {
        print_dry_run(&cfg)?;
        return Ok(Vec::new());
    }

    run_rounds(&cfg, ctrl_c()).await
}

/// Run every round of `cfg`, stopping early when `interrupt` completes.
///
/// On interrupt the live jobs are killed, the JSON report (if configured) is
/// written with the rounds finished so far, and `BenchError::Interrupted` is
/// returned.
pub async fn run_rounds<F>(cfg: &ConfigFile, interrupt: F) -> Result<Vec<RunReport>>
where
    F: Future<Output = ()>,
{
    tokio::pin!(interrupt);

    let coordinator = RunCoordinator::new(LivenessMonitor::new(cfg.monitor), &cfg.log_dir)
        .with_clean_outputs(cfg.clean_outputs);

    let mut reports = Vec::with_capacity(cfg.rounds as usize);
    for round in 1..=cfg.rounds {
        let outputs = cfg.outputs.paths_for_round(round, cfg.rounds)?;
        let batch = build_batch(&cfg.batch, &outputs)?;
        let coordinator = coordinator.clone().with_log_dir(cfg.log_dir_for_round(round));

        info!(round, rounds = cfg.rounds, jobs = batch.len(), "starting round");

        // Dropping the run future drops the live handles, which kills them.
        let report = tokio::select! {
            report = coordinator.run(batch, cfg.mode) => report?,
            () = &mut interrupt => {
                warn!(round, finished_rounds = reports.len(), "interrupted; terminating live jobs");
                save_json(cfg, &reports, true)?;
                return Err(BenchError::Interrupted);
            }
        };

        print!("{}", render_text(&report));
        reports.push(report);
    }

    save_json(cfg, &reports, false)?;
    Ok(reports)
}

/// Resolves on Ctrl-C. If the handler cannot be installed, never resolves.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C; interrupt disabled");
        std::future::pending::<()>().await;
    }
}

fn save_json(cfg: &ConfigFile, reports: &[RunReport], interrupted: bool) -> Result<()> {
    if let Some(ref path) = cfg.report_json {
        write_json(reports, interrupted, path)?;
        info!(path = %path.display(), rounds = reports.len(), interrupted, "wrote JSON report");
    }
    Ok(())
}

/// Dry-run output: resolved settings and every job of the first round.
fn print_dry_run(cfg: &ConfigFile) -> Result<()> {
    println!("renderbench dry-run");
    println!("  mode = {}", cfg.mode);
    println!("  rounds = {}", cfg.rounds);
    println!("  timeout = {:?}", cfg.batch.timeout);
    println!("  success_pattern = {:?}", cfg.batch.success_pattern.as_str());
    println!("  poll_interval = {:?}", cfg.monitor.poll_interval);
    println!("  grace_period = {:?}", cfg.monitor.grace_period);
    if let Some(idle) = cfg.monitor.idle_warning {
        println!("  idle_warning = {idle:?}");
    }
    println!("  log_dir = {}", cfg.log_dir_for_round(1).display());
    println!();

    let outputs = cfg.outputs.paths_for_round(1, cfg.rounds)?;
    let batch = build_batch(&cfg.batch, &outputs)?;
    println!("jobs ({}):", batch.len());
    for job in &batch {
        println!("  - {}", job.id);
        println!("      cmd: {}", job.command_line());
        println!("      artifact: {}", job.expected_artifact_path.display());
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}
