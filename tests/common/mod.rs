//! Capture fixture encoder shared by the integration tests.
#![allow(dead_code)]

use byteorder::{LittleEndian, WriteBytesExt};

pub const META: u16 = 1;
pub const FILE: u16 = 2;
pub const THREAD: u16 = 3;
pub const MAP: u16 = 4;
pub const SAMPLE: u16 = 5;
pub const LOST: u16 = 6;

/// Builds capture bytes record by record
pub struct StreamWriter {
    buf: Vec<u8>,
}

impl StreamWriter {
    /// Start a stream with a valid file header
    pub fn new() -> Self {
        Self::with_header(b"SIMPLEPERF", 1)
    }

    pub fn with_header(magic: &[u8], version: u16) -> Self {
        let mut buf = magic.to_vec();
        buf.write_u16::<LittleEndian>(version).unwrap();
        Self { buf }
    }

    /// Current length, i.e. the offset the next record will start at
    pub fn offset(&self) -> u64 {
        self.buf.len() as u64
    }

    pub fn raw(mut self, discriminant: u16, payload: &[u8]) -> Self {
        self.buf.write_u16::<LittleEndian>(discriminant).unwrap();
        self.buf
            .write_u32::<LittleEndian>(payload.len() as u32)
            .unwrap();
        self.buf.extend_from_slice(payload);
        self
    }

    pub fn meta(self, expected_record_count: u64, event_types: &[&str], app: &str) -> Self {
        let mut p = Payload::new();
        p.u64(expected_record_count);
        p.u32(event_types.len() as u32);
        for event in event_types {
            p.string(event);
        }
        p.string(app);
        p.bool(false);
        self.raw(META, &p.0)
    }

    /// `symbols` are (name, start offset, length)
    pub fn file(self, file_id: u32, path: &str, symbols: &[(&str, u64, u64)]) -> Self {
        let mut p = Payload::new();
        p.u32(file_id);
        p.string(path);
        p.bytes(&[]);
        p.u32(symbols.len() as u32);
        for (name, start, len) in symbols {
            p.string(name);
            p.u64(*start);
            p.u64(*len);
        }
        self.raw(FILE, &p.0)
    }

    pub fn thread(self, tid: u32, pid: u32, name: &str) -> Self {
        let mut p = Payload::new();
        p.u32(tid);
        p.u32(pid);
        p.string(name);
        self.raw(THREAD, &p.0)
    }

    pub fn map(self, pid: u32, start: u64, end: u64, file_id: Option<u32>, page_offset: u64) -> Self {
        let mut p = Payload::new();
        p.u32(pid);
        p.u64(start);
        p.u64(end);
        p.bool(file_id.is_some());
        p.u32(file_id.unwrap_or(0));
        p.u64(page_offset);
        self.raw(MAP, &p.0)
    }

    /// `frames` are leaf first
    pub fn sample(self, timestamp: u64, tid: u32, event_count: u64, frames: &[u64]) -> Self {
        let mut p = Payload::new();
        p.u64(timestamp);
        p.u32(tid);
        p.u64(event_count);
        p.u32(frames.len() as u32);
        for frame in frames {
            p.u64(*frame);
        }
        self.raw(SAMPLE, &p.0)
    }

    pub fn lost(self, sample_count: u64, lost_count: u64) -> Self {
        let mut p = Payload::new();
        p.u64(sample_count);
        p.u64(lost_count);
        self.raw(LOST, &p.0)
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Little-endian payload builder
pub struct Payload(pub Vec<u8>);

impl Payload {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn u32(&mut self, value: u32) {
        self.0.write_u32::<LittleEndian>(value).unwrap();
    }

    pub fn u64(&mut self, value: u64) {
        self.0.write_u64::<LittleEndian>(value).unwrap();
    }

    pub fn bool(&mut self, value: bool) {
        self.0.push(value as u8);
    }

    pub fn bytes(&mut self, value: &[u8]) {
        self.u32(value.len() as u32);
        self.0.extend_from_slice(value);
    }

    pub fn string(&mut self, value: &str) {
        self.bytes(value.as_bytes());
    }
}

/// The worked example: one process, `libfoo.so` mapped at 0x1000 with
/// symbol `foo` covering file offsets 0x10..0x30
pub fn foo_capture() -> Vec<u8> {
    StreamWriter::new()
        .meta(6, &["cpu-clock"], "com.example.app")
        .file(7, "/system/lib64/libfoo.so", &[("foo", 0x10, 0x20)])
        .thread(100, 100, "example.app")
        .map(100, 0x1000, 0x2000, Some(7), 0)
        .sample(1_000, 100, 250_000, &[0x1015, 0x3000])
        .sample(2_000, 100, 250_000, &[0x1015])
        .lost(3, 1)
        .finish()
}
