//! Build collapsed stack format from a resolved trace.
//!
//! Collapsed stacks are the input format for flamegraph tooling.
//! Format: "thread;outermost;...;leaf weight"
//!
//! Example: "RenderThread;__start_thread;__pthread_start;DrawFrame 42"
//! This means: 42 units of weight were sampled in DrawFrame on RenderThread.

use crate::trace::schema::{ResolvedSample, Trace};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What each sample contributes to its stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StackWeight {
    /// One per sample
    #[default]
    Samples,

    /// The sample's event count (e.g. cpu-cycles period)
    EventCount,
}

impl StackWeight {
    pub(crate) fn of(&self, sample: &ResolvedSample) -> u64 {
        match self {
            Self::Samples => 1,
            Self::EventCount => sample.event_count,
        }
    }
}

/// A single collapsed stack entry
///
/// **Public** - used by metrics and summaries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollapsedStack {
    /// Stack trace as semicolon-separated string, thread name first
    pub stack: String,

    /// Summed weight of every sample with this stack
    pub weight: u64,

    /// Leaf address of the first sample seen with this stack
    pub leaf_address: Option<u64>,
}

impl CollapsedStack {
    /// Create a new collapsed stack
    ///
    /// **Public** - constructor
    pub fn new(stack: String, weight: u64, leaf_address: Option<u64>) -> Self {
        Self {
            stack,
            weight,
            leaf_address,
        }
    }

    /// Render as a folded-stack line
    pub fn to_line(&self) -> String {
        format!("{} {}", self.stack, self.weight)
    }
}

/// Build collapsed stacks from a resolved trace
///
/// **Public** - main entry point for stack building
///
/// # Arguments
/// * `trace` - Resolved trace from the parser
/// * `weight` - What each sample contributes
///
/// # Returns
/// Vector of collapsed stacks, one per unique (thread, call chain),
/// sorted by weight descending and then by stack text
///
/// # Algorithm
/// 1. Label every frame (symbol, `path+offset`, or raw address)
/// 2. Root each stack at the thread name, outermost frame next, leaf last
/// 3. Aggregate by unique stack (sum weights)
pub fn build_collapsed_stacks(trace: &Trace, weight: StackWeight) -> Vec<CollapsedStack> {
    debug!(
        "Building collapsed stacks from {} samples",
        trace.sample_count()
    );

    // Map to aggregate stacks: stack_string -> (total_weight, leaf address)
    let mut stack_map: HashMap<String, (u64, Option<u64>)> = HashMap::new();

    for sample in trace.samples() {
        let stack = stack_for_sample(trace, sample);
        let leaf = sample.frames.first().map(|frame| frame.address);

        let entry = stack_map.entry(stack).or_insert((0, leaf));
        entry.0 = entry.0.saturating_add(weight.of(sample));
    }

    let mut stacks: Vec<CollapsedStack> = stack_map
        .into_iter()
        .map(|(stack, (weight, leaf))| CollapsedStack::new(stack, weight, leaf))
        .collect();

    stacks.sort_by(|a, b| b.weight.cmp(&a.weight).then_with(|| a.stack.cmp(&b.stack)));

    debug!("Built {} unique collapsed stacks", stacks.len());

    stacks
}

/// Collapsed stack text for one sample
///
/// **Public** - also used by per-thread views
pub fn stack_for_sample(trace: &Trace, sample: &ResolvedSample) -> String {
    let thread_name = trace
        .thread(sample.thread_id)
        .map(|thread| sanitize_label(&thread.name))
        .unwrap_or_else(|| format!("[tid {}]", sample.thread_id));

    let mut parts = Vec::with_capacity(sample.frames.len() + 1);
    parts.push(thread_name);

    // Frames are stored leaf first; collapsed stacks read root first
    for frame in sample.frames.iter().rev() {
        parts.push(sanitize_label(&trace.frame_label(frame)));
    }

    parts.join(";")
}

/// Collapsed-stack separators must not appear inside a label
fn sanitize_label(label: &str) -> String {
    label.replace(';', ":").replace('\n', " ")
}

/// Merge stacks below `min_weight` into a single "other" entry
///
/// **Public** - keeps summaries readable for noisy captures
pub fn merge_small_stacks(stacks: Vec<CollapsedStack>, min_weight: u64) -> Vec<CollapsedStack> {
    let (mut kept, small): (Vec<_>, Vec<_>) =
        stacks.into_iter().partition(|stack| stack.weight >= min_weight);

    let other_weight: u64 = small.iter().map(|stack| stack.weight).sum();
    if other_weight > 0 {
        kept.push(CollapsedStack::new("other".to_string(), other_weight, None));
        kept.sort_by(|a, b| b.weight.cmp(&a.weight).then_with(|| a.stack.cmp(&b.stack)));
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapsed_stack_to_line() {
        let stack = CollapsedStack::new("main;execute;storage_read".to_string(), 1000, None);
        assert_eq!(stack.to_line(), "main;execute;storage_read 1000");
    }

    #[test]
    fn test_merge_small_stacks() {
        let stacks = vec![
            CollapsedStack::new("big_stack".to_string(), 1000, None),
            CollapsedStack::new("small_stack_1".to_string(), 10, None),
            CollapsedStack::new("small_stack_2".to_string(), 15, None),
            CollapsedStack::new("medium_stack".to_string(), 500, None),
        ];

        let merged = merge_small_stacks(stacks, 100);

        // Should have: big_stack (1000), medium_stack (500), other (25)
        assert_eq!(merged.len(), 3);

        let other = merged.iter().find(|s| s.stack == "other").unwrap();
        assert_eq!(other.weight, 25);
        assert_eq!(merged[2].stack, "other");
    }

    #[test]
    fn test_sanitize_label() {
        assert_eq!(sanitize_label("a;b\nc"), "a:b c");
    }
}
