use crate::aggregator::StackWeight;
use crate::utils::config::{ParseOptions, DEFAULT_TOP_PATHS};
use std::path::PathBuf;

/// Arguments for the inspect command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct InspectArgs {
    /// Capture file to parse
    pub input: PathBuf,

    /// Output path for the JSON summary (optional)
    pub output_json: Option<PathBuf>,

    /// Output path for collapsed stacks (optional)
    pub output_collapsed: Option<PathBuf>,

    /// Output path for per-thread call trees (optional)
    pub output_call_trees: Option<PathBuf>,

    /// Collapsed stacks lighter than this are folded into "other"
    pub min_stack_weight: u64,

    /// Number of top hot paths to include in the summary
    pub top_paths: usize,

    /// What each sample contributes to hot paths
    pub weight: StackWeight,

    /// Parser behavior
    pub options: ParseOptions,

    /// Print text summary to stdout
    pub print_summary: bool,
}

impl Default for InspectArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::from("perf.data"),
            output_json: None,
            output_collapsed: None,
            output_call_trees: None,
            min_stack_weight: 0,
            top_paths: DEFAULT_TOP_PATHS,
            weight: StackWeight::Samples,
            options: ParseOptions::default(),
            print_summary: false,
        }
    }
}
