//! Configuration and constants for the parser and CLI.

/// Current summary output schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

// File header: b"SIMPLEPERF" followed by a little-endian u16 major version
pub const TRACE_MAGIC: &[u8; 10] = b"SIMPLEPERF";
pub const TRACE_FORMAT_VERSION: u16 = 1;
pub const FILE_HEADER_LEN: usize = TRACE_MAGIC.len() + 2;

/// Record header: u16 discriminant + u32 payload length
pub const RECORD_HEADER_LEN: usize = 6;

// Record discriminants understood by this version of the decoder
pub const DISCRIMINANT_META: u16 = 1;
pub const DISCRIMINANT_FILE: u16 = 2;
pub const DISCRIMINANT_THREAD: u16 = 3;
pub const DISCRIMINANT_MAP: u16 = 4;
pub const DISCRIMINANT_SAMPLE: u16 = 5;
pub const DISCRIMINANT_LOST: u16 = 6;

/// Discriminants reserved for newer minor format versions.
/// Records in this range are forwarded as `Record::Unrecognized`.
pub const FORWARD_COMPATIBLE_DISCRIMINANTS: std::ops::RangeInclusive<u16> = 7..=255;

/// Number of framed records decoded together when parallel decoding is on
pub const DEFAULT_DECODE_BATCH_SIZE: usize = 1024;

/// Upper bound on the parallel decode batch size
pub const MAX_DECODE_BATCH_SIZE: usize = 1 << 16;

/// Default number of hot paths reported by `inspect`
pub const DEFAULT_TOP_PATHS: usize = 20;

/// How the builder treats recoverable integrity violations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Every structural violation aborts the parse
    #[default]
    Strict,

    /// Samples citing unknown threads are dropped and decreasing timestamps
    /// are accepted; both are counted in the trace's build statistics
    BestEffort,
}

/// Options controlling a single parse
#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub mode: ParseMode,

    /// Decode framed records on the rayon pool before building
    pub parallel_decode: bool,

    /// Records per parallel decode batch
    pub decode_batch_size: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            mode: ParseMode::Strict,
            parallel_decode: false,
            decode_batch_size: DEFAULT_DECODE_BATCH_SIZE,
        }
    }
}

impl ParseOptions {
    /// Create options with defaults (strict, sequential)
    pub fn new() -> Self {
        Self::default()
    }

    /// Opt into best-effort parsing
    pub fn best_effort(mut self) -> Self {
        self.mode = ParseMode::BestEffort;
        self
    }

    pub fn with_mode(mut self, mode: ParseMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_parallel_decode(mut self, enabled: bool) -> Self {
        self.parallel_decode = enabled;
        self
    }

    /// Set the parallel decode batch size (clamped to `1..=MAX_DECODE_BATCH_SIZE`)
    pub fn with_decode_batch_size(mut self, size: usize) -> Self {
        self.decode_batch_size = size.clamp(1, MAX_DECODE_BATCH_SIZE);
        self
    }

    pub fn is_best_effort(&self) -> bool {
        self.mode == ParseMode::BestEffort
    }
}
