//! Capture framing, record decoding and the parse pipeline.
//!
//! This module handles:
//! - Validating the file header and splitting the stream into records
//! - Decoding each record payload into a typed `Record`
//! - Driving framer, decoder and builder to produce a `Trace`

pub mod decoder;
pub mod framer;
pub mod records;
pub mod simpleperf;

// Re-export main types
pub use decoder::decode_record;
pub use framer::RecordFramer;
pub use records::{
    FileRecord, LostRecord, MapRecord, MetaRecord, RawRecord, Record, SampleRecord, Symbol,
    ThreadRecord,
};
pub use simpleperf::{parse_bytes, parse_file, parse_trace, read_records};
