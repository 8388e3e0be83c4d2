//! Inspect command implementation.
//!
//! The inspect command:
//! 1. Parses the capture into a resolved trace
//! 2. Builds collapsed stacks, call trees and hot paths
//! 3. Writes the requested outputs

use super::models::InspectArgs;
use crate::aggregator::{
    build_call_trees, build_collapsed_stacks, calculate_weight_distribution, merge_small_stacks,
};
use crate::output::{validate_output_path, write_call_trees, write_collapsed, write_summary};
use crate::parser::parse_file;
use crate::trace::summary::{summarize, TraceSummary};
use anyhow::{Context, Result};
use log::{debug, info};
use std::time::Instant;

/// Execute the inspect command
///
/// **Public** - main entry point called from main.rs
///
/// # Arguments
/// * `args` - Inspect command arguments
///
/// # Returns
/// The summary that was computed
///
/// # Errors
/// * Capture parse errors (context names the error kind)
/// * File write errors
pub fn execute_inspect(args: &InspectArgs) -> Result<TraceSummary> {
    let start_time = Instant::now();

    // Fail on a bad output path before spending time on the capture
    if let Some(path) = &args.output_json {
        validate_output_path(path).context("Invalid summary output path")?;
    }
    if let Some(path) = &args.output_collapsed {
        validate_output_path(path).context("Invalid collapsed stack output path")?;
    }
    if let Some(path) = &args.output_call_trees {
        validate_output_path(path).context("Invalid call tree output path")?;
    }

    info!("Step 1/3: Parsing capture {}...", args.input.display());
    let trace = match parse_file(&args.input, &args.options) {
        Ok(trace) => trace,
        Err(err) => {
            let kind = err.kind();
            return Err(anyhow::Error::new(err).context(format!(
                "Failed to parse capture {} ({})",
                args.input.display(),
                kind
            )));
        }
    };

    debug!(
        "Parsed trace: {} samples, {} threads, {} files",
        trace.sample_count(),
        trace.threads().len(),
        trace.files().len()
    );

    info!("Step 2/3: Building collapsed stacks...");
    let stacks = build_collapsed_stacks(&trace, args.weight);
    let distribution = calculate_weight_distribution(&stacks);
    info!("Weight distribution: {}", distribution.summary());

    let source = args.input.display().to_string();
    let summary = summarize(&trace, &source, args.top_paths, args.weight);

    info!("Step 3/3: Writing output files...");
    if let Some(path) = &args.output_json {
        write_summary(&summary, path).context("Failed to write summary JSON")?;
        info!("✓ Summary written to: {}", path.display());
    }
    if let Some(path) = &args.output_collapsed {
        let stacks = merge_small_stacks(stacks, args.min_stack_weight);
        write_collapsed(&stacks, path).context("Failed to write collapsed stacks")?;
        info!("✓ Collapsed stacks written to: {}", path.display());
    }
    if let Some(path) = &args.output_call_trees {
        let trees = build_call_trees(&trace, args.weight);
        write_call_trees(&trees, path).context("Failed to write call trees")?;
        info!("✓ {} call trees written to: {}", trees.len(), path.display());
    }

    if args.print_summary {
        println!("\n{}", "=".repeat(80));
        println!("TRACE SUMMARY");
        println!("{}", "=".repeat(80));
        print!("{}", summary.to_text());
        println!("{}", "=".repeat(80));
    }

    let elapsed = start_time.elapsed();
    info!("Inspect completed in {:.2}s", elapsed.as_secs_f64());

    Ok(summary)
}

/// Validate inspect arguments
///
/// **Public** - can be called before execute_inspect for early validation
pub fn validate_args(args: &InspectArgs) -> Result<()> {
    if args.input.as_os_str().is_empty() {
        anyhow::bail!("Capture path cannot be empty");
    }

    if !args.input.is_file() {
        anyhow::bail!("Capture file not found: {}", args.input.display());
    }

    if args.top_paths == 0 {
        anyhow::bail!("top_paths must be greater than 0");
    }

    if args.top_paths > 1000 {
        anyhow::bail!("top_paths is too large (max 1000)");
    }

    Ok(())
}
