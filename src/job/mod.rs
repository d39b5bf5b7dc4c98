// src/job/mod.rs

//! Job-level data model.
//!
//! - [`descriptor`] holds the immutable `JobDescriptor`, the command template
//!   it is rendered from and the success-signature matcher.
//! - [`batch`] turns a list of artifact paths into a validated batch.
//! - [`outcome`] holds the terminal `RunOutcome` and its classification rules.

pub mod batch;
pub mod descriptor;
pub mod outcome;

pub use batch::{BatchSpec, build_batch, generated_outputs};
pub use descriptor::{CommandTemplate, JobDescriptor, SuccessMatcher};
pub use outcome::{Classification, ExitDisposition, RunOutcome, classify};
