//! Summary schema definitions for parsed traces.
//!
//! This module defines the structure of summary JSON files we write to disk.
//! Schema is versioned to allow future evolution.

use super::schema::{BuildStats, Trace};
use crate::aggregator::{build_collapsed_stacks, calculate_hot_paths, StackWeight};
use crate::utils::config::SCHEMA_VERSION;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Top-level summary structure written to JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceSummary {
    /// Schema version for compatibility checking
    pub version: String,

    /// Capture the summary was computed from
    pub source: String,

    pub sample_count: u64,

    /// Lost samples reported by the recorder
    pub lost_sample_count: u64,

    pub thread_count: usize,
    pub file_count: usize,

    /// First and last sample timestamps
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_range: Option<TimeRange>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_thread_id: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_package_name: Option<String>,

    #[serde(default)]
    pub event_types: Vec<String>,

    pub stats: BuildStats,

    /// Per-thread sample counts, busiest first
    pub threads: Vec<ThreadSummary>,

    /// Top hot paths (ranked by weight)
    pub hot_paths: Vec<HotPath>,

    /// Timestamp when summary was generated
    pub generated_at: String,
}

/// Capture time span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: u64,
    pub end: u64,
}

impl TimeRange {
    pub fn duration(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }
}

/// Sample count for one thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadSummary {
    pub thread_id: u32,
    pub process_id: u32,
    pub name: String,
    pub sample_count: u64,
}

/// A hot path in the capture (call chain with weight)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotPath {
    /// Collapsed stack representation (e.g., "main;Looper::loop;DrawFrame")
    pub stack: String,

    /// Weight attributed to this path
    pub weight: u64,

    /// Percentage of total weight
    pub percentage: f64,

    /// Leaf address as hex, when the path has frames
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leaf_address: Option<String>,
}

/// Condense a trace into a summary
///
/// **Public** - used by commands to create the final output
///
/// # Arguments
/// * `trace` - Parsed trace
/// * `source` - Label for the capture (usually its path)
/// * `top_paths` - Number of hot paths to include
/// * `weight` - What each sample contributes to hot paths
pub fn summarize(trace: &Trace, source: &str, top_paths: usize, weight: StackWeight) -> TraceSummary {
    let stacks = build_collapsed_stacks(trace, weight);
    let total_weight: u64 = stacks.iter().map(|stack| stack.weight).sum();
    let hot_paths = calculate_hot_paths(&stacks, total_weight, top_paths);

    let counts = trace.sample_counts_by_thread();
    let mut threads: Vec<ThreadSummary> = trace
        .threads()
        .values()
        .map(|thread| ThreadSummary {
            thread_id: thread.thread_id,
            process_id: thread.process_id,
            name: thread.name.clone(),
            sample_count: counts.get(&thread.thread_id).copied().unwrap_or(0),
        })
        .collect();
    threads.sort_by(|a, b| {
        b.sample_count
            .cmp(&a.sample_count)
            .then_with(|| a.thread_id.cmp(&b.thread_id))
    });

    TraceSummary {
        version: SCHEMA_VERSION.to_string(),
        source: source.to_string(),
        sample_count: trace.sample_count() as u64,
        lost_sample_count: trace.lost_sample_count(),
        thread_count: trace.threads().len(),
        file_count: trace.files().len(),
        time_range: trace
            .time_range()
            .map(|(start, end)| TimeRange { start, end }),
        main_thread_id: trace.main_thread_id(),
        app_package_name: trace.meta().and_then(|meta| meta.app_package_name.clone()),
        event_types: trace
            .meta()
            .map(|meta| meta.event_types.clone())
            .unwrap_or_default(),
        stats: *trace.stats(),
        threads,
        hot_paths,
        generated_at: Utc::now().to_rfc3339(),
    }
}

impl TraceSummary {
    /// Plain-text rendering for terminal output
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Source:        {}\n", self.source));
        out.push_str(&format!("Samples:       {}\n", self.sample_count));
        out.push_str(&format!("Lost samples:  {}\n", self.lost_sample_count));
        out.push_str(&format!("Threads:       {}\n", self.thread_count));
        out.push_str(&format!("Files:         {}\n", self.file_count));
        if let Some(range) = &self.time_range {
            out.push_str(&format!(
                "Time range:    {} .. {} ({} ns)\n",
                range.start,
                range.end,
                range.duration()
            ));
        }
        if let Some(tid) = self.main_thread_id {
            out.push_str(&format!("Main thread:   {}\n", tid));
        }
        out.push_str(&format!(
            "Frames:        {} symbolized, {} file-only, {} unresolved\n",
            self.stats.symbolized_frames, self.stats.file_only_frames, self.stats.unresolved_frames
        ));
        if self.stats.dropped_samples > 0 || self.stats.non_monotonic_samples > 0 {
            out.push_str(&format!(
                "Best-effort:   {} dropped, {} out-of-order\n",
                self.stats.dropped_samples, self.stats.non_monotonic_samples
            ));
        }

        if !self.hot_paths.is_empty() {
            out.push_str("\nHot paths:\n");
            for (i, path) in self.hot_paths.iter().enumerate() {
                out.push_str(&format!(
                    "{:>3}. {:>6.2}% {:>8}  {}\n",
                    i + 1,
                    path.percentage,
                    path.weight,
                    path.stack
                ));
            }
        }

        out
    }
}
