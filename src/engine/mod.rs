// src/engine/mod.rs

//! Orchestration engine for renderbench.
//!
//! The [`coordinator`] owns every `WorkerHandle` of a batch in a single map
//! keyed by job id, spawns them according to the `RunMode`, and hands the
//! map to the liveness monitor until all of them are terminal.

pub mod coordinator;

pub use coordinator::RunCoordinator;
