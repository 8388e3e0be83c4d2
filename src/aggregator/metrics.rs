//! Calculate hot paths and weight distribution from collapsed stacks.
//!
//! Hot paths are the call chains that account for the most samples.
//! These are the primary targets for optimization.

use super::stack_builder::CollapsedStack;
use crate::trace::summary::HotPath;
use log::debug;

/// Calculate hot paths from collapsed stacks
///
/// **Public** - main entry point for metrics calculation
///
/// # Arguments
/// * `stacks` - Collapsed stacks from stack_builder, sorted by weight
/// * `total_weight` - Total weight of the trace
/// * `top_n` - Number of top paths to return (e.g., 10)
///
/// # Returns
/// Vector of hot paths, sorted by weight (descending)
pub fn calculate_hot_paths(
    stacks: &[CollapsedStack],
    total_weight: u64,
    top_n: usize,
) -> Vec<HotPath> {
    debug!(
        "Calculating top {} hot paths from {} stacks",
        top_n,
        stacks.len()
    );

    // Stacks are already sorted by weight from stack_builder
    stacks
        .iter()
        .take(top_n)
        .map(|stack| create_hot_path(stack, total_weight))
        .collect()
}

/// Create a HotPath from a CollapsedStack
///
/// **Public** - conversion used by summaries and tests
pub fn create_hot_path(stack: &CollapsedStack, total_weight: u64) -> HotPath {
    let percentage = if total_weight > 0 {
        (stack.weight as f64 / total_weight as f64) * 100.0
    } else {
        0.0
    };

    HotPath {
        stack: stack.stack.clone(),
        weight: stack.weight,
        percentage,
        leaf_address: stack.leaf_address.map(|address| format!("{:#x}", address)),
    }
}

/// Calculate weight distribution statistics
///
/// **Public** - provides summary statistics
pub fn calculate_weight_distribution(stacks: &[CollapsedStack]) -> WeightDistribution {
    if stacks.is_empty() {
        return WeightDistribution::default();
    }

    let total: u64 = stacks.iter().map(|s| s.weight).sum();
    let count = stacks.len();
    let mean = total / count as u64;

    let mut weights: Vec<u64> = stacks.iter().map(|s| s.weight).collect();
    weights.sort_unstable();
    let median = weights[weights.len() / 2];

    // Top 10% of stacks
    let top_10_percent_count = (count as f64 * 0.1).ceil() as usize;
    let top_10_percent_weight: u64 = stacks
        .iter()
        .take(top_10_percent_count)
        .map(|s| s.weight)
        .sum();

    WeightDistribution {
        total_weight: total,
        stack_count: count,
        mean_weight_per_stack: mean,
        median_weight_per_stack: median,
        top_10_percent_weight,
        top_10_percent_percentage: if total > 0 {
            (top_10_percent_weight as f64 / total as f64) * 100.0
        } else {
            0.0
        },
    }
}

/// Weight distribution statistics
///
/// **Public** - returned from calculate_weight_distribution
#[derive(Debug, Clone, Default)]
pub struct WeightDistribution {
    /// Total weight across all stacks
    pub total_weight: u64,

    /// Number of unique stacks
    pub stack_count: usize,

    pub mean_weight_per_stack: u64,
    pub median_weight_per_stack: u64,

    /// Weight of the top 10% of stacks
    pub top_10_percent_weight: u64,

    /// Percentage of total weight in the top 10%
    pub top_10_percent_percentage: f64,
}

impl WeightDistribution {
    /// Check if weight is highly concentrated
    ///
    /// Returns true if the top 10% of stacks carry >80% of the weight
    pub fn is_highly_concentrated(&self) -> bool {
        self.top_10_percent_percentage > 80.0
    }

    /// Get human-readable summary
    ///
    /// **Public** - for logging and debugging
    pub fn summary(&self) -> String {
        format!(
            "Total: {} | Stacks: {} | Mean: {} | Median: {} | Top 10%: {:.1}%",
            self.total_weight,
            self.stack_count,
            self.mean_weight_per_stack,
            self.median_weight_per_stack,
            self.top_10_percent_percentage
        )
    }
}
