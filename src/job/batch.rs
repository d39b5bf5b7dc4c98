// src/job/batch.rs

//! Pure construction of a batch of `JobDescriptor`s.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{BenchError, Result};

use super::descriptor::{CommandTemplate, JobDescriptor, SuccessMatcher};

/// Everything shared by the jobs of one batch.
#[derive(Debug, Clone)]
pub struct BatchSpec {
    pub template: CommandTemplate,
    pub timeout: Duration,
    pub success_pattern: SuccessMatcher,
}

/// Build one descriptor per output path.
///
/// Fails with a configuration error when `outputs` is empty, a path is empty
/// or has no file name, or two jobs would share an artifact path. Nothing is
/// touched on disk.
pub fn build_batch(spec: &BatchSpec, outputs: &[PathBuf]) -> Result<Vec<JobDescriptor>> {
    if outputs.is_empty() {
        return Err(BenchError::config("batch must contain at least one job"));
    }
    if spec.template.program.trim().is_empty() {
        return Err(BenchError::config("backend command must not be empty"));
    }
    if spec.timeout.is_zero() {
        return Err(BenchError::config("job timeout must be greater than zero"));
    }

    let count = outputs.len();
    let mut seen = HashSet::with_capacity(count);
    let mut jobs = Vec::with_capacity(count);

    for (i, output) in outputs.iter().enumerate() {
        validate_output_path(output)?;
        if !seen.insert(output.clone()) {
            return Err(BenchError::config(format!(
                "output path {} is used by more than one job",
                output.display()
            )));
        }

        let index = i + 1;
        let id = job_id(index);
        let arguments = spec
            .template
            .render_args(&id, index, count, &output.to_string_lossy());

        jobs.push(JobDescriptor {
            id,
            index,
            command: spec.template.program.clone(),
            arguments,
            expected_artifact_path: output.clone(),
            timeout: spec.timeout,
            success_pattern: spec.success_pattern.clone(),
        });
    }

    Ok(jobs)
}

/// Generate `count` distinct artifact paths: `<dir>/<prefix>-NNN.<ext>`.
pub fn generated_outputs(
    dir: &Path,
    prefix: &str,
    extension: &str,
    count: usize,
) -> Result<Vec<PathBuf>> {
    if count == 0 {
        return Err(BenchError::config("job count must be >= 1 (got 0)"));
    }
    let ext = extension.trim_start_matches('.');
    Ok((1..=count)
        .map(|i| {
            let name = if ext.is_empty() {
                format!("{prefix}-{i:03}")
            } else {
                format!("{prefix}-{i:03}.{ext}")
            };
            dir.join(name)
        })
        .collect())
}

fn job_id(index: usize) -> String {
    format!("job-{index:03}")
}

fn validate_output_path(path: &Path) -> Result<()> {
    let text = path.to_string_lossy();
    if text.trim().is_empty() {
        return Err(BenchError::config("output path must not be empty"));
    }
    if text.contains('\0') {
        return Err(BenchError::config(format!(
            "output path {text:?} contains a NUL byte"
        )));
    }
    if path.file_name().is_none() || text.ends_with('/') || text.ends_with('\\') {
        return Err(BenchError::config(format!(
            "output path {text:?} does not name a file"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> BatchSpec {
        BatchSpec {
            template: CommandTemplate::new("render", vec!["{output}".into()]),
            timeout: Duration::from_secs(5),
            success_pattern: SuccessMatcher::default(),
        }
    }

    #[test]
    fn builds_one_job_per_output_with_distinct_ids() {
        let outputs = generated_outputs(Path::new("out"), "r", "pdf", 3).unwrap();
        let jobs = build_batch(&spec(), &outputs).unwrap();

        let ids: Vec<_> = jobs.iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, vec!["job-001", "job-002", "job-003"]);
        assert_eq!(jobs[1].expected_artifact_path, PathBuf::from("out/r-002.pdf"));
        assert_eq!(jobs[1].arguments, vec!["out/r-002.pdf".to_string()]);
    }

    #[test]
    fn empty_batch_is_a_configuration_error() {
        assert!(matches!(build_batch(&spec(), &[]), Err(BenchError::ConfigError(_))));
        assert!(matches!(
            generated_outputs(Path::new("out"), "r", "pdf", 0),
            Err(BenchError::ConfigError(_))
        ));
    }

    #[test]
    fn rejects_empty_directory_and_duplicate_paths() {
        for bad in [vec![PathBuf::from("")], vec![PathBuf::from("out/")], vec![
            PathBuf::from("a.pdf"),
            PathBuf::from("a.pdf"),
        ]] {
            assert!(
                matches!(build_batch(&spec(), &bad), Err(BenchError::ConfigError(_))),
                "expected config error for {bad:?}"
            );
        }
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut s = spec();
        s.timeout = Duration::ZERO;
        assert!(build_batch(&s, &[PathBuf::from("a.pdf")]).is_err());
    }
}
