// src/report/summary.rs

use std::collections::BTreeMap;
use std::time::Duration;

use crate::job::{Classification, RunOutcome};
use crate::types::{JobId, RunMode};

/// Frozen summary of one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub mode: RunMode,
    /// Outcomes in completion order.
    pub outcomes: Vec<RunOutcome>,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub by_classification: BTreeMap<Classification, usize>,
    /// Jobs whose artifact was absent when they ended.
    pub missing_artifacts: Vec<JobId>,
    pub batch_elapsed: Duration,
}

impl RunReport {
    /// The batch passes only if every job succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.succeeded == self.total
    }

    pub fn count(&self, classification: Classification) -> usize {
        self.by_classification.get(&classification).copied().unwrap_or(0)
    }

    /// Outcomes re-sorted by job id (submission order for generated batches).
    pub fn outcomes_by_id(&self) -> Vec<&RunOutcome> {
        let mut sorted: Vec<&RunOutcome> = self.outcomes.iter().collect();
        sorted.sort_by(|a, b| a.job_id.cmp(&b.job_id));
        sorted
    }
}

/// Aggregate outcomes into a report.
///
/// Batch elapsed is the span from the earliest start to the latest finish in
/// parallel mode, and the sum of per-job elapsed times in sequential mode.
pub fn summarize(mode: RunMode, outcomes: Vec<RunOutcome>) -> RunReport {
    let total = outcomes.len();
    let succeeded = outcomes.iter().filter(|o| o.is_success()).count();

    let mut by_classification = BTreeMap::new();
    for outcome in &outcomes {
        *by_classification.entry(outcome.classification).or_insert(0) += 1;
    }

    let missing_artifacts = outcomes
        .iter()
        .filter(|o| !o.artifact_exists)
        .map(|o| o.job_id.clone())
        .collect();

    let batch_elapsed = match mode {
        RunMode::Parallel => {
            let start = outcomes.iter().map(|o| o.started_offset).min();
            let end = outcomes.iter().map(|o| o.finished_offset).max();
            match (start, end) {
                (Some(start), Some(end)) => end.saturating_sub(start),
                _ => Duration::ZERO,
            }
        }
        RunMode::Sequential => outcomes.iter().map(|o| o.elapsed).sum(),
    };

    RunReport {
        mode,
        outcomes,
        total,
        succeeded,
        failed: total - succeeded,
        by_classification,
        missing_artifacts,
        batch_elapsed,
    }
}
