//! Parsing pipeline for simpleperf captures.
//!
//! Drives the three stages as a pull chain: the framer yields raw records,
//! the decoder turns them into typed records, and the builder folds them into
//! a `Trace`. With parallel decoding, batches of framed records are decoded on
//! the rayon pool and handed to the builder in their original order.

use super::decoder::decode_record;
use super::framer::RecordFramer;
use super::records::{RawRecord, Record};
use crate::builder::TraceBuilder;
use crate::trace::schema::Trace;
use crate::utils::config::{ParseOptions, DEFAULT_DECODE_BATCH_SIZE};
use crate::utils::error::TraceError;
use log::debug;
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Parse a capture from any byte stream
///
/// **Public** - main entry point for parsing
///
/// # Arguments
/// * `reader` - Finite stream positioned at the file header
/// * `options` - Strict/best-effort mode and decode strategy
///
/// # Returns
/// The resolved trace
///
/// # Errors
/// The first fatal `TraceError` in stream order. Nothing is retried.
pub fn parse_trace<R: Read>(reader: R, options: &ParseOptions) -> Result<Trace, TraceError> {
    let mut framer = RecordFramer::new(reader)?;
    debug!("Parsing simpleperf capture, format version {}", framer.version());

    let mut builder = TraceBuilder::new(options.clone());

    if options.parallel_decode {
        build_parallel(&mut framer, &mut builder, options.decode_batch_size)?;
    } else {
        for raw in framer.by_ref() {
            let raw = raw?;
            let record = decode_record(&raw)?;
            builder.push(record, raw.offset)?;
        }
    }

    builder.finish(framer.offset())
}

/// Parse a capture file from disk
///
/// The file handle lives only for the duration of this call and is released
/// on every exit path, including early failure.
pub fn parse_file(path: impl AsRef<Path>, options: &ParseOptions) -> Result<Trace, TraceError> {
    let path = path.as_ref();
    debug!("Opening capture: {}", path.display());

    let file = File::open(path)?;
    parse_trace(BufReader::new(file), options)
}

/// Parse a capture already held in memory
pub fn parse_bytes(bytes: &[u8], options: &ParseOptions) -> Result<Trace, TraceError> {
    parse_trace(bytes, options)
}

/// Frame and decode a capture without building a trace
///
/// Useful for tooling that inspects the raw typed record stream. Stops at the
/// first error.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<(u64, Record)>, TraceError> {
    RecordFramer::new(reader)?
        .map(|raw| {
            let raw = raw?;
            let record = decode_record(&raw)?;
            Ok((raw.offset, record))
        })
        .collect()
}

/// Frame up to `batch_size` records, decode them in parallel, build in order
///
/// A framing error is held back until every record framed before it has been
/// decoded and built, so the error reported is always the first in stream order.
fn build_parallel<R: Read>(
    framer: &mut RecordFramer<R>,
    builder: &mut TraceBuilder,
    batch_size: usize,
) -> Result<(), TraceError> {
    let batch_size = batch_size.max(1);

    loop {
        let mut batch: Vec<RawRecord> =
            Vec::with_capacity(batch_size.min(DEFAULT_DECODE_BATCH_SIZE));
        let mut framing_error = None;

        for raw in framer.by_ref() {
            match raw {
                Ok(raw) => {
                    batch.push(raw);
                    if batch.len() == batch_size {
                        break;
                    }
                }
                Err(e) => {
                    framing_error = Some(e);
                    break;
                }
            }
        }

        if batch.is_empty() && framing_error.is_none() {
            return Ok(());
        }

        let reached_end = batch.len() < batch_size;

        // collect() on an indexed parallel iterator keeps input order
        let decoded: Vec<(u64, Result<Record, TraceError>)> = batch
            .into_par_iter()
            .map(|raw| (raw.offset, decode_record(&raw)))
            .collect();

        for (offset, record) in decoded {
            builder.push(record?, offset)?;
        }

        if let Some(e) = framing_error {
            return Err(e);
        }
        if reached_end {
            return Ok(());
        }
    }
}
