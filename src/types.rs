use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Identifier of a job, unique within one batch (e.g. `job-007`).
pub type JobId = String;

/// How the coordinator schedules the jobs of a batch.
///
/// - `Parallel`: spawn every job up front and monitor them together.
/// - `Sequential`: spawn one job, wait for it to reach a terminal state, then
///   spawn the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Parallel,
    Sequential,
}

impl Default for RunMode {
    fn default() -> Self {
        RunMode::Parallel
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Parallel => f.write_str("parallel"),
            RunMode::Sequential => f.write_str("sequential"),
        }
    }
}

impl FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "parallel" => Ok(RunMode::Parallel),
            "sequential" => Ok(RunMode::Sequential),
            other => Err(format!(
                "invalid mode: {other} (expected \"parallel\" or \"sequential\")"
            )),
        }
    }
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| format!("duration '{s}' is missing a unit suffix"))?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let secs_per_unit = match unit.as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => {
            return Err(format!(
                "unsupported duration unit '{unit}'; expected ms, s, m, or h"
            ));
        }
    };
    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{s}' is too large"))
}
