#![allow(dead_code)]

use renderbench::config::{BackendSection, BenchSection, ConfigFile, MonitorSection, RawConfigFile};
use renderbench::types::RunMode;

/// Builder for `RawConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new(command: &str) -> Self {
        Self {
            config: RawConfigFile {
                bench: BenchSection::default(),
                backend: BackendSection::new(command),
                monitor: MonitorSection::default(),
            },
        }
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.config.backend.args.push(arg.to_string());
        self
    }

    pub fn mode(mut self, mode: RunMode) -> Self {
        self.config.bench.mode = mode;
        self
    }

    pub fn count(mut self, count: usize) -> Self {
        self.config.bench.count = Some(count);
        self
    }

    pub fn output(mut self, path: &str) -> Self {
        self.config
            .bench
            .outputs
            .get_or_insert_with(Vec::new)
            .push(path.to_string());
        self
    }

    pub fn rounds(mut self, rounds: u32) -> Self {
        self.config.bench.rounds = rounds;
        self
    }

    pub fn output_dir(mut self, dir: &str) -> Self {
        self.config.bench.output_dir = dir.to_string();
        self
    }

    pub fn log_dir(mut self, dir: &str) -> Self {
        self.config.bench.log_dir = dir.to_string();
        self
    }

    pub fn report_json(mut self, path: &str) -> Self {
        self.config.bench.report_json = Some(path.to_string());
        self
    }

    pub fn timeout(mut self, timeout: &str) -> Self {
        self.config.backend.timeout = timeout.to_string();
        self
    }

    pub fn success_regex(mut self, pattern: &str) -> Self {
        self.config.backend.success_pattern = pattern.to_string();
        self.config.backend.pattern_is_regex = true;
        self
    }

    pub fn poll_interval(mut self, interval: &str) -> Self {
        self.config.monitor.poll_interval = interval.to_string();
        self
    }

    pub fn grace_period(mut self, grace: &str) -> Self {
        self.config.monitor.grace_period = grace.to_string();
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}
