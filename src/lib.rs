//! simpleperf-trace
//!
//! Parses simpleperf binary CPU captures into a resolved, read-only `Trace`:
//! file header and record framing, typed record decoding, and frame address
//! resolution against per-process memory maps and per-file symbol tables.
//!
//! ## Getting Started
//!
//! ```ignore
//! use simpleperf_trace::{parse_file, ParseOptions};
//!
//! let trace = parse_file("perf.data", &ParseOptions::default())?;
//! for sample in trace.samples() {
//!     let leaf = sample.frames.first().map(|frame| trace.frame_label(frame));
//!     println!("{} {:?}", sample.thread_id, leaf);
//! }
//! ```
//!
//! The `simpleperf-trace` binary wraps this library with `inspect` and
//! `validate` commands.

pub mod aggregator;
pub mod builder;
pub mod commands;
pub mod output;
pub mod parser;
pub mod trace;
pub mod utils;

pub use parser::{parse_bytes, parse_file, parse_trace};
pub use trace::{FrameResolution, ResolvedFrame, ResolvedSample, Trace};
pub use utils::{ErrorKind, ParseMode, ParseOptions, TraceError};
