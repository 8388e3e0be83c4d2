use crate::parser::parse_file;
use crate::utils::config::{ParseOptions, SCHEMA_VERSION, TRACE_FORMAT_VERSION};
use anyhow::Result;
use std::path::Path;

/// Parse a capture and report whether it is well formed
///
/// Prints the sample and thread counts on success. On failure prints the
/// error kind and message and returns the error.
pub fn validate_capture(file_path: &Path, options: &ParseOptions) -> Result<()> {
    println!("Validating capture: {}", file_path.display());

    match parse_file(file_path, options) {
        Ok(trace) => {
            println!("✓ OK");
            println!("  Samples: {}", trace.sample_count());
            println!("  Lost samples: {}", trace.lost_sample_count());
            println!("  Threads: {}", trace.threads().len());
            println!("  Files: {}", trace.files().len());
            let stats = trace.stats();
            if stats.dropped_samples > 0 || stats.non_monotonic_samples > 0 {
                println!(
                    "  Tolerated: {} dropped, {} out-of-order",
                    stats.dropped_samples, stats.non_monotonic_samples
                );
            }
            Ok(())
        }
        Err(err) => {
            println!("✗ {}: {}", err.kind(), err);
            Err(err.into())
        }
    }
}

/// Display version information
pub fn display_version() {
    println!("simpleperf-trace v{}", env!("CARGO_PKG_VERSION"));
    println!("Capture format: v{}", TRACE_FORMAT_VERSION);
    println!("Summary schema: v{}", SCHEMA_VERSION);
}
