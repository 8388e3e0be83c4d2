//! Typed record definitions.
//!
//! One struct per record kind, plus the closed `Record` enum the decoder
//! produces and the builder consumes.

use serde::{Deserialize, Serialize};

/// One framed record, before decoding
///
/// Owned only by the framer-to-decoder handoff; never retained by a trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub discriminant: u16,

    /// Stream offset of the record header
    pub offset: u64,

    pub payload: Vec<u8>,
}

impl RawRecord {
    pub fn length(&self) -> usize {
        self.payload.len()
    }

    /// Stream offset of the first payload byte
    pub fn payload_offset(&self) -> u64 {
        self.offset + crate::utils::config::RECORD_HEADER_LEN as u64
    }
}

/// Capture-wide metadata; when present it is the first record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaRecord {
    /// Number of records following this one
    pub expected_record_count: u64,

    /// Event types recorded (e.g. "cpu-cycles")
    pub event_types: Vec<String>,

    pub app_package_name: Option<String>,

    /// Whether off-CPU time was traced
    pub trace_offcpu: bool,
}

/// One symbol in a file's symbol table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub start_offset: u64,
    pub length: u64,
}

impl Symbol {
    /// Whether `file_offset` lies in `[start_offset, start_offset + length)`
    pub fn contains(&self, file_offset: u64) -> bool {
        file_offset >= self.start_offset && file_offset - self.start_offset < self.length
    }

    pub fn end_offset(&self) -> u64 {
        self.start_offset + self.length
    }
}

/// A mapped binary or library referenced by samples
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub file_id: u32,
    pub path: String,
    pub build_id: Option<Vec<u8>>,

    /// Sorted by `start_offset`, non-overlapping
    pub symbols: Vec<Symbol>,
}

impl FileRecord {
    /// Binary-search the symbol table for the symbol covering `file_offset`
    pub fn symbol_index_for(&self, file_offset: u64) -> Option<usize> {
        let candidate = self
            .symbols
            .partition_point(|symbol| symbol.start_offset <= file_offset)
            .checked_sub(1)?;

        self.symbols[candidate]
            .contains(file_offset)
            .then_some(candidate)
    }

    /// Build id rendered as lowercase hex
    pub fn build_id_hex(&self) -> Option<String> {
        self.build_id
            .as_ref()
            .map(|bytes| bytes.iter().map(|b| format!("{:02x}", b)).collect())
    }
}

/// An observed thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadRecord {
    pub thread_id: u32,
    pub process_id: u32,
    pub name: String,
}

/// A memory mapping in one process's address space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapRecord {
    pub process_id: u32,
    pub start_addr: u64,

    /// Exclusive
    pub end_addr: u64,

    pub file_id: Option<u32>,
    pub page_offset: u64,
}

/// One captured call stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleRecord {
    pub timestamp: u64,
    pub thread_id: u32,

    /// Event count (e.g. cycles) attributed to this sample
    pub event_count: u64,

    /// Instruction addresses, leaf frame first
    pub frames: Vec<u64>,
}

/// Lost-sample accounting emitted by the recorder
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LostRecord {
    pub sample_count: u64,
    pub lost_count: u64,
}

/// A decoded record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Meta(MetaRecord),
    File(FileRecord),
    Thread(ThreadRecord),
    Map(MapRecord),
    Sample(SampleRecord),
    Lost(LostRecord),

    /// A record kind from a newer minor format version, forwarded untouched
    Unrecognized { discriminant: u16, payload: Vec<u8> },
}

impl Record {
    /// Short name for logging
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Meta(_) => "meta",
            Self::File(_) => "file",
            Self::Thread(_) => "thread",
            Self::Map(_) => "map",
            Self::Sample(_) => "sample",
            Self::Lost(_) => "lost",
            Self::Unrecognized { .. } => "unrecognized",
        }
    }
}
