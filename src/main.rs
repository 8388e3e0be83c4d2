//! simpleperf-trace CLI
//!
//! Parses simpleperf captures and reports samples, threads and hot paths.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use env_logger::Env;
use std::path::PathBuf;

use simpleperf_trace::aggregator::StackWeight;
use simpleperf_trace::commands::{
    display_version, execute_inspect, validate_args, validate_capture, InspectArgs,
};
use simpleperf_trace::utils::config::{
    ParseMode, ParseOptions, DEFAULT_DECODE_BATCH_SIZE, DEFAULT_TOP_PATHS,
};

/// simpleperf-trace - Inspect simpleperf CPU captures
#[derive(Parser, Debug)]
#[command(name = "simpleperf-trace")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse a capture and summarize it
    Inspect {
        /// Path to the capture file
        #[arg(short, long, env = "SIMPLEPERF_TRACE_FILE")]
        file: PathBuf,

        /// Output path for JSON summary (optional)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output path for collapsed stacks (optional)
        #[arg(long)]
        collapsed: Option<PathBuf>,

        /// Fold collapsed stacks lighter than this into "other"
        #[arg(long, default_value_t = 0)]
        min_weight: u64,

        /// Output path for per-thread call trees as JSON (optional)
        #[arg(long)]
        call_trees: Option<PathBuf>,

        /// Number of top hot paths to include
        #[arg(long, default_value_t = DEFAULT_TOP_PATHS)]
        top: usize,

        /// What each sample contributes to hot paths
        #[arg(long, value_enum, default_value = "samples")]
        weight: WeightArg,

        /// Drop samples of unknown threads and accept out-of-order timestamps
        #[arg(long)]
        best_effort: bool,

        /// Decode records on all cores
        #[arg(long)]
        parallel: bool,

        /// Records per parallel decode batch
        #[arg(long, default_value_t = DEFAULT_DECODE_BATCH_SIZE)]
        batch_size: usize,

        /// Print text summary to stdout
        #[arg(long)]
        summary: bool,
    },

    /// Check that a capture parses
    Validate {
        /// Path to the capture file
        #[arg(short, long, env = "SIMPLEPERF_TRACE_FILE")]
        file: PathBuf,

        /// Drop samples of unknown threads and accept out-of-order timestamps
        #[arg(long)]
        best_effort: bool,
    },

    /// Display version information
    Version,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum WeightArg {
    /// One per sample
    Samples,
    /// Sample event counts
    Events,
}

impl From<WeightArg> for StackWeight {
    fn from(arg: WeightArg) -> Self {
        match arg {
            WeightArg::Samples => StackWeight::Samples,
            WeightArg::Events => StackWeight::EventCount,
        }
    }
}

fn parse_options(best_effort: bool) -> ParseOptions {
    let mode = if best_effort {
        ParseMode::BestEffort
    } else {
        ParseMode::Strict
    };
    ParseOptions::new().with_mode(mode)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Inspect {
            file,
            output,
            collapsed,
            min_weight,
            call_trees,
            top,
            weight,
            best_effort,
            parallel,
            batch_size,
            summary,
        } => {
            let args = InspectArgs {
                input: file,
                output_json: output,
                output_collapsed: collapsed,
                output_call_trees: call_trees,
                min_stack_weight: min_weight,
                top_paths: top,
                weight: weight.into(),
                options: parse_options(best_effort)
                    .with_parallel_decode(parallel)
                    .with_decode_batch_size(batch_size),
                print_summary: summary,
            };

            validate_args(&args)?;
            execute_inspect(&args)?;
        }

        Commands::Validate { file, best_effort } => {
            validate_capture(&file, &parse_options(best_effort))?;
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
