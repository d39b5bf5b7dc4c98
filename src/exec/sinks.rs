// src/exec/sinks.rs

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Paths of the two append-only log files belonging to one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSinks {
    pub stdout: PathBuf,
    pub stderr: PathBuf,
}

impl LogSinks {
    /// `<log_dir>/<job_id>.stdout.log` and `<log_dir>/<job_id>.stderr.log`.
    pub fn for_job(log_dir: &Path, job_id: &str) -> Self {
        Self {
            stdout: log_dir.join(format!("{job_id}.stdout.log")),
            stderr: log_dir.join(format!("{job_id}.stderr.log")),
        }
    }

    /// Create the log directory and open both files for appending.
    ///
    /// The returned handles are meant to be handed to the child process.
    pub fn open(&self) -> io::Result<(File, File)> {
        for path in [&self.stdout, &self.stderr] {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
        }
        Ok((open_append(&self.stdout)?, open_append(&self.stderr)?))
    }

    /// Append one line of orchestrator diagnostics to the stderr sink.
    pub fn append_diagnostic(&self, line: &str) -> io::Result<()> {
        let mut file = open_append(&self.stderr)?;
        writeln!(file, "{line}")
    }

    /// Most recent modification time across both sinks.
    pub fn latest_modification(&self) -> Option<SystemTime> {
        [&self.stdout, &self.stderr]
            .into_iter()
            .filter_map(|p| fs::metadata(p).and_then(|m| m.modified()).ok())
            .max()
    }

    /// Read stdout bytes starting at `offset`.
    pub fn read_stdout_from(&self, offset: u64) -> io::Result<Vec<u8>> {
        read_from(&self.stdout, offset)
    }

    /// Last `n` non-empty lines of the stderr sink written after `offset`.
    pub fn stderr_tail(&self, offset: u64, n: usize) -> Vec<String> {
        let Ok(bytes) = read_from(&self.stderr, offset) else {
            return Vec::new();
        };
        let text = String::from_utf8_lossy(&bytes);
        let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
        let start = lines.len().saturating_sub(n);
        lines[start..].iter().map(|l| l.to_string()).collect()
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn read_from(path: &Path, offset: u64) -> io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(offset))?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;
    Ok(buf)
}
