// src/report/mod.rs

//! Run-level aggregation and output.
//!
//! - [`summary`]: the pure `summarize` function and `RunReport`.
//! - [`render`]: text report for humans, JSON report for machines.

pub mod render;
pub mod summary;

pub use render::{INTERRUPTED_EXIT_CODE, overall_exit_code, render_text, write_json};
pub use summary::{RunReport, summarize};
