// src/config/mod.rs

//! Configuration loading and validation for renderbench.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk and layer CLI overrides on top (`loader.rs`).
//! - Validate it into a typed `ConfigFile` (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{apply_overrides, load_and_validate, load_from_path, load_with_overrides};
pub use model::{
    BackendSection, BenchSection, ConfigFile, MonitorSection, OutputPlan, RawConfigFile,
};
