//! Record decoder.
//!
//! Pure function from one framed record to one typed `Record`. Decoding a
//! record never depends on any other record, so batches can be decoded in
//! parallel as long as the output order is kept.

use super::records::{
    FileRecord, LostRecord, MapRecord, MetaRecord, RawRecord, Record, SampleRecord, Symbol,
    ThreadRecord,
};
use crate::utils::config::{
    DISCRIMINANT_FILE, DISCRIMINANT_LOST, DISCRIMINANT_MAP, DISCRIMINANT_META,
    DISCRIMINANT_SAMPLE, DISCRIMINANT_THREAD, FORWARD_COMPATIBLE_DISCRIMINANTS,
};
use crate::utils::error::TraceError;
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

/// Decode one framed record
///
/// **Public** - the decode stage of the pipeline
///
/// # Errors
/// * `TraceError::MalformedRecord` - internal framing or encoding is invalid;
///   the offset points at the offending field
/// * `TraceError::UnknownDiscriminant` - discriminant outside the versioned range
pub fn decode_record(raw: &RawRecord) -> Result<Record, TraceError> {
    let mut reader = PayloadReader::new(raw);

    let record = match raw.discriminant {
        DISCRIMINANT_META => Record::Meta(decode_meta(&mut reader)?),
        DISCRIMINANT_FILE => Record::File(decode_file(&mut reader)?),
        DISCRIMINANT_THREAD => Record::Thread(decode_thread(&mut reader)?),
        DISCRIMINANT_MAP => Record::Map(decode_map(&mut reader)?),
        DISCRIMINANT_SAMPLE => Record::Sample(decode_sample(&mut reader)?),
        DISCRIMINANT_LOST => Record::Lost(decode_lost(&mut reader)?),
        d if FORWARD_COMPATIBLE_DISCRIMINANTS.contains(&d) => {
            return Ok(Record::Unrecognized {
                discriminant: d,
                payload: raw.payload.clone(),
            })
        }
        d => {
            return Err(TraceError::UnknownDiscriminant {
                discriminant: d,
                offset: raw.offset,
            })
        }
    };

    reader.expect_end()?;
    Ok(record)
}

fn decode_meta(reader: &mut PayloadReader<'_>) -> Result<MetaRecord, TraceError> {
    let expected_record_count = reader.u64("expected record count")?;

    // Each event type needs at least its u32 length prefix
    let event_type_count = reader.count("event type count", 4)?;
    let mut event_types = Vec::with_capacity(event_type_count);
    for _ in 0..event_type_count {
        event_types.push(reader.string("event type")?);
    }

    let app_package_name = reader.string("app package name")?;
    let trace_offcpu = reader.bool("trace_offcpu flag")?;

    Ok(MetaRecord {
        expected_record_count,
        event_types,
        app_package_name: (!app_package_name.is_empty()).then_some(app_package_name),
        trace_offcpu,
    })
}

fn decode_file(reader: &mut PayloadReader<'_>) -> Result<FileRecord, TraceError> {
    let file_id = reader.u32("file id")?;
    let path = reader.string("file path")?;
    let build_id = reader.bytes("build id")?;

    // name length prefix + start + length
    let symbol_count = reader.count("symbol count", 4 + 8 + 8)?;
    let mut symbols: Vec<Symbol> = Vec::with_capacity(symbol_count);
    for index in 0..symbol_count {
        let symbol_start = reader.position();
        let name = reader.string("symbol name")?;
        let start_offset = reader.u64("symbol start offset")?;
        let length = reader.u64("symbol length")?;

        if start_offset.checked_add(length).is_none() {
            return Err(reader.malformed_at(
                symbol_start,
                format!("symbol {} range overflows: {:#x} + {:#x}", index, start_offset, length),
            ));
        }

        if let Some(previous) = symbols.last() {
            if start_offset < previous.start_offset {
                return Err(reader.malformed_at(
                    symbol_start,
                    format!(
                        "symbol table not sorted: {:#x} follows {:#x}",
                        start_offset, previous.start_offset
                    ),
                ));
            }
            if start_offset < previous.end_offset() {
                return Err(reader.malformed_at(
                    symbol_start,
                    format!(
                        "symbol '{}' at {:#x} overlaps '{}' ending at {:#x}",
                        name,
                        start_offset,
                        previous.name,
                        previous.end_offset()
                    ),
                ));
            }
        }

        symbols.push(Symbol {
            name,
            start_offset,
            length,
        });
    }

    Ok(FileRecord {
        file_id,
        path,
        build_id: (!build_id.is_empty()).then_some(build_id),
        symbols,
    })
}

fn decode_thread(reader: &mut PayloadReader<'_>) -> Result<ThreadRecord, TraceError> {
    Ok(ThreadRecord {
        thread_id: reader.u32("thread id")?,
        process_id: reader.u32("process id")?,
        name: reader.string("thread name")?,
    })
}

fn decode_map(reader: &mut PayloadReader<'_>) -> Result<MapRecord, TraceError> {
    let process_id = reader.u32("process id")?;
    let start_position = reader.position();
    let start_addr = reader.u64("start address")?;
    let end_addr = reader.u64("end address")?;
    let has_file = reader.bool("has_file flag")?;
    let file_id = reader.u32("file id")?;
    let page_offset = reader.u64("page offset")?;

    if start_addr >= end_addr {
        return Err(reader.malformed_at(
            start_position,
            format!("empty or inverted mapping [{:#x}, {:#x})", start_addr, end_addr),
        ));
    }

    Ok(MapRecord {
        process_id,
        start_addr,
        end_addr,
        file_id: has_file.then_some(file_id),
        page_offset,
    })
}

fn decode_sample(reader: &mut PayloadReader<'_>) -> Result<SampleRecord, TraceError> {
    let timestamp = reader.u64("timestamp")?;
    let thread_id = reader.u32("thread id")?;
    let event_count = reader.u64("event count")?;

    let frame_count = reader.count("frame count", 8)?;
    let mut frames = Vec::with_capacity(frame_count);
    for _ in 0..frame_count {
        frames.push(reader.u64("frame address")?);
    }

    Ok(SampleRecord {
        timestamp,
        thread_id,
        event_count,
        frames,
    })
}

fn decode_lost(reader: &mut PayloadReader<'_>) -> Result<LostRecord, TraceError> {
    Ok(LostRecord {
        sample_count: reader.u64("sample count")?,
        lost_count: reader.u64("lost count")?,
    })
}

/// Cursor over one record payload that reports failures with absolute offsets
struct PayloadReader<'a> {
    cursor: Cursor<&'a [u8]>,
    discriminant: u16,
    base_offset: u64,
}

impl<'a> PayloadReader<'a> {
    fn new(raw: &'a RawRecord) -> Self {
        Self {
            cursor: Cursor::new(raw.payload.as_slice()),
            discriminant: raw.discriminant,
            base_offset: raw.payload_offset(),
        }
    }

    fn position(&self) -> u64 {
        self.cursor.position()
    }

    fn remaining(&self) -> u64 {
        let len = self.cursor.get_ref().len() as u64;
        len.saturating_sub(self.cursor.position())
    }

    fn malformed_at(&self, position: u64, reason: String) -> TraceError {
        TraceError::MalformedRecord {
            discriminant: self.discriminant,
            offset: self.base_offset + position,
            reason,
        }
    }

    fn truncated(&self, field: &str) -> TraceError {
        self.malformed_at(
            self.position(),
            format!("truncated {} ({} bytes left)", field, self.remaining()),
        )
    }

    fn u8(&mut self, field: &str) -> Result<u8, TraceError> {
        let position = self.position();
        self.cursor.read_u8().map_err(|_| {
            self.cursor.set_position(position);
            self.truncated(field)
        })
    }

    fn u32(&mut self, field: &str) -> Result<u32, TraceError> {
        let position = self.position();
        self.cursor.read_u32::<LittleEndian>().map_err(|_| {
            self.cursor.set_position(position);
            self.truncated(field)
        })
    }

    fn u64(&mut self, field: &str) -> Result<u64, TraceError> {
        let position = self.position();
        self.cursor.read_u64::<LittleEndian>().map_err(|_| {
            self.cursor.set_position(position);
            self.truncated(field)
        })
    }

    fn bool(&mut self, field: &str) -> Result<bool, TraceError> {
        let position = self.position();
        match self.u8(field)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(self.malformed_at(position, format!("invalid {} byte {}", field, other))),
        }
    }

    /// Read a u32 element count and check that `min_element_size * count`
    /// bytes can still follow
    fn count(&mut self, field: &str, min_element_size: u64) -> Result<usize, TraceError> {
        let position = self.position();
        let count = self.u32(field)? as u64;
        let needed = count.saturating_mul(min_element_size);
        if needed > self.remaining() {
            return Err(self.malformed_at(
                position,
                format!(
                    "{} {} needs at least {} bytes, {} left",
                    field,
                    count,
                    needed,
                    self.remaining()
                ),
            ));
        }
        Ok(count as usize)
    }

    fn bytes(&mut self, field: &str) -> Result<Vec<u8>, TraceError> {
        let position = self.position();
        let length = self.u32(field)? as u64;
        if length > self.remaining() {
            return Err(self.malformed_at(
                position,
                format!(
                    "{} length {} exceeds remaining {} bytes",
                    field,
                    length,
                    self.remaining()
                ),
            ));
        }

        let start = self.position() as usize;
        let end = start + length as usize;
        let data = self.cursor.get_ref()[start..end].to_vec();
        self.cursor.set_position(end as u64);
        Ok(data)
    }

    fn string(&mut self, field: &str) -> Result<String, TraceError> {
        let position = self.position();
        let data = self.bytes(field)?;
        String::from_utf8(data).map_err(|e| {
            self.malformed_at(position, format!("{} is not valid UTF-8: {}", field, e))
        })
    }

    fn expect_end(&self) -> Result<(), TraceError> {
        match self.remaining() {
            0 => Ok(()),
            left => Err(self.malformed_at(
                self.position(),
                format!("{} trailing bytes after record body", left),
            )),
        }
    }
}
