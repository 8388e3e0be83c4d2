//! Record framer.
//!
//! Splits a capture byte stream into length-prefixed `RawRecord`s. The framer
//! knows the file header and the record header layout, nothing about record
//! payloads.

use super::records::RawRecord;
use crate::utils::config::{
    FILE_HEADER_LEN, FORWARD_COMPATIBLE_DISCRIMINANTS, RECORD_HEADER_LEN, TRACE_FORMAT_VERSION,
    TRACE_MAGIC,
};
use crate::utils::error::TraceError;
use byteorder::{ByteOrder, LittleEndian};
use log::trace;
use std::io::{self, Read};

/// Lazy iterator over the records of one capture
///
/// Fused after the first error or at end of stream. To re-read a capture,
/// construct a new framer over a fresh reader.
pub struct RecordFramer<R: Read> {
    reader: R,
    version: u16,
    offset: u64,
    finished: bool,
}

impl<R: Read> RecordFramer<R> {
    /// Read and validate the file header
    ///
    /// # Errors
    /// * `TraceError::TruncatedStream` - fewer bytes than the header needs
    /// * `TraceError::BadMagic` - the stream is not a simpleperf capture
    /// * `TraceError::UnsupportedVersion` - incompatible major version
    pub fn new(mut reader: R) -> Result<Self, TraceError> {
        let mut header = [0u8; FILE_HEADER_LEN];
        let read = fill(&mut reader, &mut header)?;
        if read < FILE_HEADER_LEN {
            return Err(TraceError::TruncatedStream {
                offset: 0,
                needed: FILE_HEADER_LEN as u64,
                available: read as u64,
            });
        }

        let (magic, version) = header.split_at(TRACE_MAGIC.len());
        if magic != TRACE_MAGIC {
            return Err(TraceError::BadMagic {
                found: magic.to_vec(),
            });
        }

        let version = LittleEndian::read_u16(version);
        if version != TRACE_FORMAT_VERSION {
            return Err(TraceError::UnsupportedVersion { found: version });
        }

        Ok(Self {
            reader,
            version,
            offset: FILE_HEADER_LEN as u64,
            finished: false,
        })
    }

    /// Format version from the file header
    pub fn version(&self) -> u16 {
        self.version
    }

    /// Bytes consumed so far, file header included
    pub fn offset(&self) -> u64 {
        self.offset
    }

    fn next_record(&mut self) -> Result<Option<RawRecord>, TraceError> {
        let record_offset = self.offset;

        let mut header = [0u8; RECORD_HEADER_LEN];
        let read = fill(&mut self.reader, &mut header)?;
        if read == 0 {
            return Ok(None);
        }
        if read < RECORD_HEADER_LEN {
            return Err(TraceError::TruncatedStream {
                offset: record_offset,
                needed: RECORD_HEADER_LEN as u64,
                available: read as u64,
            });
        }

        let discriminant = LittleEndian::read_u16(&header[0..2]);
        let length = LittleEndian::read_u32(&header[2..6]) as u64;

        if !is_framable(discriminant) {
            return Err(TraceError::UnknownDiscriminant {
                discriminant,
                offset: record_offset,
            });
        }

        // Bounded read: a bogus length cannot force a large allocation up front
        let mut payload = Vec::new();
        (&mut self.reader).take(length).read_to_end(&mut payload)?;
        if (payload.len() as u64) < length {
            return Err(TraceError::TruncatedStream {
                offset: record_offset + RECORD_HEADER_LEN as u64,
                needed: length,
                available: payload.len() as u64,
            });
        }

        self.offset = record_offset + RECORD_HEADER_LEN as u64 + length;

        trace!(
            "Framed record discriminant={} length={} at offset {}",
            discriminant,
            length,
            record_offset
        );

        Ok(Some(RawRecord {
            discriminant,
            offset: record_offset,
            payload,
        }))
    }
}

impl<R: Read> Iterator for RecordFramer<R> {
    type Item = Result<RawRecord, TraceError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Known discriminants plus the forward-compatible range
fn is_framable(discriminant: u16) -> bool {
    discriminant != 0 && *FORWARD_COMPATIBLE_DISCRIMINANTS.end() >= discriminant
}

/// Read until `buf` is full or the stream ends; returns the bytes read
fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
