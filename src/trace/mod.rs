//! Parsed trace data model and summaries.
//!
//! `schema` holds the read-only `Trace` handed to downstream tooling;
//! `summary` condenses it into a versioned, serializable report.

pub mod schema;
pub mod summary;

// Re-export main types
pub use schema::{BuildStats, FrameResolution, ResolvedFrame, ResolvedSample, Trace};
pub use summary::{summarize, HotPath, ThreadSummary, TimeRange, TraceSummary};
