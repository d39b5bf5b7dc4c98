// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`handle`] owns one spawned render backend (`WorkerHandle`) and exposes
//!   the observations the liveness monitor needs: exit status, log activity,
//!   success signature, memory.
//! - [`sinks`] manages the append-only stdout/stderr log files of a job.
//! - [`os`] holds the platform-specific bits (process groups, `/proc`).

pub mod handle;
pub mod os;
pub mod sinks;

pub use handle::{WorkerHandle, WorkerState};
pub use sinks::LogSinks;
