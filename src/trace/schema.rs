//! Resolved trace data model.
//!
//! A `Trace` is produced once by the builder and is read-only afterwards. It
//! owns every record it references and holds nothing borrowed from the input.

use crate::parser::records::{FileRecord, LostRecord, MetaRecord, Symbol, ThreadRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where a frame address landed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameResolution {
    /// Inside symbol `symbol_index` of file `file_id`, `offset` bytes past its start
    Symbol {
        file_id: u32,
        symbol_index: usize,
        offset: u64,
    },

    /// Inside a mapping of `file_id`, but no symbol covers `file_offset`
    File { file_id: u32, file_offset: u64 },

    /// No mapping (or no known file) covers the address
    Unresolved,
}

/// One call-stack frame after resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedFrame {
    /// Raw instruction address, always kept
    pub address: u64,
    pub resolution: FrameResolution,
}

impl ResolvedFrame {
    pub fn unresolved(address: u64) -> Self {
        Self {
            address,
            resolution: FrameResolution::Unresolved,
        }
    }

    pub fn file_id(&self) -> Option<u32> {
        match self.resolution {
            FrameResolution::Symbol { file_id, .. } | FrameResolution::File { file_id, .. } => {
                Some(file_id)
            }
            FrameResolution::Unresolved => None,
        }
    }

    /// Offset within the symbol, or within the file when no symbol matched
    pub fn offset(&self) -> Option<u64> {
        match self.resolution {
            FrameResolution::Symbol { offset, .. } => Some(offset),
            FrameResolution::File { file_offset, .. } => Some(file_offset),
            FrameResolution::Unresolved => None,
        }
    }

    pub fn is_unresolved(&self) -> bool {
        self.resolution == FrameResolution::Unresolved
    }
}

/// A sample with its frames resolved against the tables as of its position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSample {
    pub timestamp: u64,
    pub thread_id: u32,
    pub process_id: u32,
    pub event_count: u64,

    /// Leaf frame first
    pub frames: Vec<ResolvedFrame>,
}

/// Counters collected while building
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStats {
    /// Every framed record, header included
    pub records: u64,
    pub unrecognized_records: u64,

    /// Best-effort only: samples citing an undeclared thread
    pub dropped_samples: u64,

    /// Best-effort only: samples accepted despite a decreasing timestamp
    pub non_monotonic_samples: u64,

    pub symbolized_frames: u64,
    pub file_only_frames: u64,
    pub unresolved_frames: u64,
}

/// The finalized, normalized result of parsing one capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    pub(crate) meta: Option<MetaRecord>,
    pub(crate) samples: Vec<ResolvedSample>,
    pub(crate) threads: BTreeMap<u32, ThreadRecord>,
    pub(crate) files: BTreeMap<u32, FileRecord>,
    pub(crate) lost: LostRecord,
    pub(crate) stats: BuildStats,
}

impl Trace {
    pub fn meta(&self) -> Option<&MetaRecord> {
        self.meta.as_ref()
    }

    /// Samples in stream order
    pub fn samples(&self) -> &[ResolvedSample] {
        &self.samples
    }

    pub fn threads(&self) -> &BTreeMap<u32, ThreadRecord> {
        &self.threads
    }

    pub fn files(&self) -> &BTreeMap<u32, FileRecord> {
        &self.files
    }

    pub fn thread(&self, thread_id: u32) -> Option<&ThreadRecord> {
        self.threads.get(&thread_id)
    }

    pub fn file(&self, file_id: u32) -> Option<&FileRecord> {
        self.files.get(&file_id)
    }

    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Samples the recorder reported as lost, summed over all lost records
    pub fn lost_sample_count(&self) -> u64 {
        self.lost.lost_count
    }

    /// Samples the recorder reported as taken, summed over all lost records
    pub fn recorded_sample_count(&self) -> u64 {
        self.lost.sample_count
    }

    /// First and last sample timestamps
    pub fn time_range(&self) -> Option<(u64, u64)> {
        let first = self.samples.first()?.timestamp;
        let last = self.samples.last()?.timestamp;
        Some((first, last))
    }

    /// Symbol a frame resolved to, if any
    pub fn symbol(&self, frame: &ResolvedFrame) -> Option<&Symbol> {
        match frame.resolution {
            FrameResolution::Symbol {
                file_id,
                symbol_index,
                ..
            } => self.files.get(&file_id)?.symbols.get(symbol_index),
            _ => None,
        }
    }

    pub fn symbol_name(&self, frame: &ResolvedFrame) -> Option<&str> {
        self.symbol(frame).map(|symbol| symbol.name.as_str())
    }

    /// Main thread of the profiled app
    ///
    /// A main thread is one whose id equals its process id. When several
    /// processes were captured, the one with the most samples wins.
    pub fn main_thread_id(&self) -> Option<u32> {
        let mut per_process: BTreeMap<u32, usize> = BTreeMap::new();
        for sample in &self.samples {
            *per_process.entry(sample.process_id).or_insert(0) += 1;
        }

        self.threads
            .values()
            .filter(|thread| thread.thread_id == thread.process_id)
            .max_by_key(|thread| {
                let samples = per_process.get(&thread.process_id).copied().unwrap_or(0);
                // Prefer the lowest pid on ties
                (samples, std::cmp::Reverse(thread.process_id))
            })
            .map(|thread| thread.thread_id)
    }

    /// Samples for one thread, in stream order
    pub fn samples_for_thread(&self, thread_id: u32) -> impl Iterator<Item = &ResolvedSample> {
        self.samples
            .iter()
            .filter(move |sample| sample.thread_id == thread_id)
    }

    /// Sample count per thread id
    pub fn sample_counts_by_thread(&self) -> BTreeMap<u32, u64> {
        let mut counts = BTreeMap::new();
        for sample in &self.samples {
            *counts.entry(sample.thread_id).or_insert(0) += 1;
        }
        counts
    }

    /// Human-readable label for a frame: symbol name, `path+0xoffset`, or raw address
    pub fn frame_label(&self, frame: &ResolvedFrame) -> String {
        match frame.resolution {
            FrameResolution::Symbol { .. } => match self.symbol_name(frame) {
                Some(name) => name.to_string(),
                None => format!("{:#x}", frame.address),
            },
            FrameResolution::File {
                file_id,
                file_offset,
            } => match self.files.get(&file_id) {
                Some(file) => format!("{}+{:#x}", file.path, file_offset),
                None => format!("{:#x}", frame.address),
            },
            FrameResolution::Unresolved => format!("{:#x}", frame.address),
        }
    }
}
