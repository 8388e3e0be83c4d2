//! Output writers for trace summaries.
//!
//! This module handles writing data to disk:
//! - JSON summaries (pretty printed)
//! - Collapsed stack files for external flamegraph tooling
//! - Per-thread call trees as JSON

pub mod json;

// Re-export main functions
pub use json::{
    read_summary, summary_to_string, validate_output_path, write_call_trees, write_collapsed,
    write_summary,
};
