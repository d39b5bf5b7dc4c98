//! Scriptable stand-in for a render backend.
//!
//! A `FakeBackend` renders to a small `sh -c` script that receives the
//! artifact path as `$1` and then, step by step, sleeps, prints the success
//! marker, writes the artifact, writes to stderr, and finally exits.

use std::path::Path;
use std::time::Duration;

use renderbench::job::{JobDescriptor, SuccessMatcher};

#[derive(Debug, Clone)]
enum Step {
    Sleep(Duration),
    Signature,
    Artifact,
    Stdout(String),
    Stderr(String),
}

#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    steps: Vec<Step>,
    exit_code: i32,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prints the marker, writes the artifact and exits 0 immediately.
    pub fn instant_success() -> Self {
        Self::new().print_signature().write_artifact()
    }

    pub fn sleep(mut self, d: Duration) -> Self {
        self.steps.push(Step::Sleep(d));
        self
    }

    pub fn sleep_ms(self, ms: u64) -> Self {
        self.sleep(Duration::from_millis(ms))
    }

    pub fn print_signature(mut self) -> Self {
        self.steps.push(Step::Signature);
        self
    }

    pub fn write_artifact(mut self) -> Self {
        self.steps.push(Step::Artifact);
        self
    }

    pub fn stdout(mut self, line: &str) -> Self {
        self.steps.push(Step::Stdout(line.to_string()));
        self
    }

    pub fn stderr(mut self, line: &str) -> Self {
        self.steps.push(Step::Stderr(line.to_string()));
        self
    }

    pub fn exit_code(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    /// The shell script body; `$1` is the artifact path.
    pub fn script(&self) -> String {
        let mut parts: Vec<String> = self
            .steps
            .iter()
            .map(|step| match step {
                Step::Sleep(d) => format!("sleep {:.3}", d.as_secs_f64()),
                Step::Signature => "echo \"PDF saved to: $1\"".to_string(),
                Step::Artifact => "echo fake-pdf > \"$1\"".to_string(),
                Step::Stdout(line) => format!("echo {}", quote(line)),
                Step::Stderr(line) => format!("echo {} >&2", quote(line)),
            })
            .collect();
        parts.push(format!("exit {}", self.exit_code));
        parts.join("; ")
    }

    /// Descriptor running this script through `sh`.
    pub fn descriptor(&self, index: usize, artifact: &Path, timeout: Duration) -> JobDescriptor {
        JobDescriptor {
            id: format!("job-{index:03}"),
            index,
            command: "sh".to_string(),
            arguments: vec![
                "-c".to_string(),
                self.script(),
                "fake-backend".to_string(),
                artifact.to_string_lossy().into_owned(),
            ],
            expected_artifact_path: artifact.to_path_buf(),
            timeout,
            success_pattern: SuccessMatcher::default(),
        }
    }
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}
