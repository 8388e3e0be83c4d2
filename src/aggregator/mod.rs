//! Aggregation of resolved samples into collapsed stacks and metrics.
//!
//! This module transforms a parsed trace into:
//! - Per-thread call trees with depths and time spans
//! - Collapsed stack format rooted at the thread name
//! - Hot path analysis (top sample consumers)
//! - Weight distribution statistics

pub mod call_tree;
pub mod metrics;
pub mod stack_builder;

// Re-export main types and functions
pub use call_tree::{build_call_tree, build_call_trees, CallNode, CallTree};
pub use metrics::{
    calculate_hot_paths, calculate_weight_distribution, create_hot_path, WeightDistribution,
};
pub use stack_builder::{
    build_collapsed_stacks, merge_small_stacks, stack_for_sample, CollapsedStack, StackWeight,
};
