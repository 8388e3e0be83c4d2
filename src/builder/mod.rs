//! Trace building from the decoded record stream.
//!
//! This module handles:
//! - Maintaining the running file, thread and per-process map tables
//! - Resolving sample frames to (file, symbol, offset)
//! - Validating cross-record invariants

pub mod address_space;
pub mod trace_builder;

// Re-export main types
pub use address_space::{ActiveMapping, AddressSpace};
pub use trace_builder::TraceBuilder;
