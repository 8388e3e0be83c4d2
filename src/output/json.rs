//! JSON summary output writer.
//!
//! Writes `TraceSummary` structs to JSON files with proper formatting.

use crate::aggregator::{CallTree, CollapsedStack};
use crate::trace::summary::TraceSummary;
use crate::utils::error::OutputError;
use log::{debug, info};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write a summary to a JSON file
///
/// **Public** - main entry point for JSON output
///
/// # Arguments
/// * `summary` - Summary data to write
/// * `output_path` - Path to output JSON file
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
pub fn write_summary(summary: &TraceSummary, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing summary to: {}", output_path.display());

    validate_output_path(output_path)?;
    create_parent_dirs(output_path)?;

    let file = File::create(output_path)?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, summary)?;
    writer.flush()?;

    info!(
        "Summary written successfully ({} bytes)",
        calculate_file_size(output_path)
    );

    Ok(())
}

/// Write collapsed stacks, one `stack weight` line each
///
/// **Public** - feeds external flamegraph tooling
pub fn write_collapsed(stacks: &[CollapsedStack], output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    validate_output_path(output_path)?;
    create_parent_dirs(output_path)?;

    let mut writer = BufWriter::new(File::create(output_path)?);
    for stack in stacks {
        writeln!(writer, "{}", stack.to_line())?;
    }
    writer.flush()?;

    debug!("Wrote {} collapsed stacks to {}", stacks.len(), output_path.display());

    Ok(())
}

/// Write per-thread call trees as a JSON array
///
/// **Public** - full tree output for external viewers
pub fn write_call_trees(trees: &[CallTree], output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    validate_output_path(output_path)?;
    create_parent_dirs(output_path)?;

    let mut writer = BufWriter::new(File::create(output_path)?);
    serde_json::to_writer_pretty(&mut writer, trees)?;
    writer.flush()?;

    debug!("Wrote {} call trees to {}", trees.len(), output_path.display());

    Ok(())
}

/// Serialize a summary to a pretty JSON string
///
/// **Public** - used for stdout output and tests
pub fn summary_to_string(summary: &TraceSummary) -> Result<String, OutputError> {
    Ok(serde_json::to_string_pretty(summary)?)
}

/// Validate that output path is writable
///
/// **Public** - commands check this before parsing a large capture
pub fn validate_output_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    // Refuse to overwrite a directory
    if path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}

fn create_parent_dirs(path: &Path) -> Result<(), OutputError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }
    Ok(())
}

fn calculate_file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// Read a summary from a JSON file
///
/// **Public** - useful for validation and testing
///
/// # Errors
/// * `OutputError::WriteFailed` - File read error (reusing WriteFailed for I/O)
/// * `OutputError::SerializationFailed` - JSON parse error
pub fn read_summary(input_path: impl AsRef<Path>) -> Result<TraceSummary, OutputError> {
    let input_path = input_path.as_ref();

    debug!("Reading summary from: {}", input_path.display());

    let file = File::open(input_path)?;
    let summary: TraceSummary = serde_json::from_reader(std::io::BufReader::new(file))?;

    debug!(
        "Summary loaded: version {}, {} samples",
        summary.version, summary.sample_count
    );

    Ok(summary)
}
