// src/report/render.rs

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Serialize;

use crate::errors::Result;
use crate::job::Classification;
use crate::types::RunMode;

use super::summary::RunReport;

/// Exit code of an invocation cut short by Ctrl-C.
pub const INTERRUPTED_EXIT_CODE: i32 = 2;

/// Process exit code for a whole invocation: 0 only if every round passed.
pub fn overall_exit_code(reports: &[RunReport]) -> i32 {
    if reports.iter().all(RunReport::all_succeeded) { 0 } else { 1 }
}

/// Human-readable report: counts, per-job table, missing artifacts.
pub fn render_text(report: &RunReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "renderbench report ({} mode, {} jobs)", report.mode, report.total);
    let _ = writeln!(
        out,
        "  succeeded: {}  failed: {}  batch elapsed: {}",
        report.succeeded,
        report.failed,
        secs(report.batch_elapsed)
    );

    let _ = writeln!(out, "  by classification:");
    for (class, n) in &report.by_classification {
        let _ = writeln!(out, "    {:<24} {n}", class.label());
    }

    let _ = writeln!(out, "  jobs:");
    let _ = writeln!(
        out,
        "    {:<10} {:<24} {:>5} {:>9} {:>7} {:>9} {:>12}",
        "ID", "RESULT", "EXIT", "ELAPSED", "SIGNAL", "ARTIFACT", "PEAK_MEM"
    );
    for o in &report.outcomes {
        let exit = o.exit_code.map_or_else(|| "-".to_string(), |c| c.to_string());
        let mem = o
            .peak_memory_kb
            .map_or_else(|| "-".to_string(), |kb| format!("{kb} KiB"));
        let _ = writeln!(
            out,
            "    {:<10} {:<24} {:>5} {:>9} {:>7} {:>9} {:>12}",
            o.job_id,
            o.classification.label(),
            exit,
            secs(o.elapsed),
            yes_no(o.had_success_signature),
            yes_no(o.artifact_exists),
            mem
        );
        if let Some(ref err) = o.error {
            let _ = writeln!(out, "      error: {err}");
        }
        for line in &o.stderr_tail {
            let _ = writeln!(out, "      stderr: {line}");
        }
    }

    if !report.missing_artifacts.is_empty() {
        let _ = writeln!(out, "  missing artifacts:");
        for o in report.outcomes.iter().filter(|o| !o.artifact_exists) {
            let _ = writeln!(out, "    {:<10} {}", o.job_id, o.artifact_path.display());
        }
    }

    out
}

fn secs(d: Duration) -> String {
    format!("{:.3}s", d.as_secs_f64())
}

fn yes_no(b: bool) -> &'static str {
    if b { "yes" } else { "no" }
}

#[derive(Debug, Serialize)]
struct JsonRun<'a> {
    exit_code: i32,
    interrupted: bool,
    rounds: Vec<JsonReport<'a>>,
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    mode: RunMode,
    total: usize,
    succeeded: usize,
    failed: usize,
    batch_elapsed_ms: u64,
    by_classification: BTreeMap<Classification, usize>,
    missing_artifacts: &'a [String],
    jobs: Vec<JsonJob<'a>>,
}

#[derive(Debug, Serialize)]
struct JsonJob<'a> {
    id: &'a str,
    artifact: String,
    classification: Classification,
    exit_code: Option<i32>,
    elapsed_ms: u64,
    started_offset_ms: u64,
    finished_offset_ms: u64,
    had_success_signature: bool,
    artifact_exists: bool,
    peak_memory_kb: Option<u64>,
    #[serde(skip_serializing_if = "is_empty_slice")]
    stderr_tail: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

fn is_empty_slice(lines: &&[String]) -> bool {
    lines.is_empty()
}

fn to_json(reports: &[RunReport], interrupted: bool) -> JsonRun<'_> {
    JsonRun {
        exit_code: if interrupted {
            INTERRUPTED_EXIT_CODE
        } else {
            overall_exit_code(reports)
        },
        interrupted,
        rounds: reports
            .iter()
            .map(|r| JsonReport {
                mode: r.mode,
                total: r.total,
                succeeded: r.succeeded,
                failed: r.failed,
                batch_elapsed_ms: r.batch_elapsed.as_millis() as u64,
                by_classification: r.by_classification.clone(),
                missing_artifacts: &r.missing_artifacts,
                jobs: r
                    .outcomes
                    .iter()
                    .map(|o| JsonJob {
                        id: &o.job_id,
                        artifact: o.artifact_path.display().to_string(),
                        classification: o.classification,
                        exit_code: o.exit_code,
                        elapsed_ms: o.elapsed.as_millis() as u64,
                        started_offset_ms: o.started_offset.as_millis() as u64,
                        finished_offset_ms: o.finished_offset.as_millis() as u64,
                        had_success_signature: o.had_success_signature,
                        artifact_exists: o.artifact_exists,
                        peak_memory_kb: o.peak_memory_kb,
                        stderr_tail: &o.stderr_tail,
                        error: o.error.as_deref(),
                    })
                    .collect(),
            })
            .collect(),
    }
}

/// Write all rounds as one pretty-printed JSON document.
///
/// With `interrupted` set, `reports` holds only the rounds that finished
/// before the run was cut short.
pub fn write_json(reports: &[RunReport], interrupted: bool, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(&to_json(reports, interrupted))?;
    fs::write(path, json)?;
    Ok(())
}
