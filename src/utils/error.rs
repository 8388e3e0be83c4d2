//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use thiserror::Error;

/// Errors that abort a trace parse
///
/// Every variant is fatal for the current parse. Offsets are absolute byte
/// offsets into the input stream.
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("I/O error while reading trace: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a simpleperf trace: magic number mismatch (found {found:?})")]
    BadMagic { found: Vec<u8> },

    #[error("unsupported trace format version {found}")]
    UnsupportedVersion { found: u16 },

    #[error("truncated stream at offset {offset}: needed {needed} bytes, only {available} available")]
    TruncatedStream {
        offset: u64,
        needed: u64,
        available: u64,
    },

    #[error("unknown record discriminant {discriminant} at offset {offset}")]
    UnknownDiscriminant { discriminant: u16, offset: u64 },

    #[error("malformed record (discriminant {discriminant}) at offset {offset}: {reason}")]
    MalformedRecord {
        discriminant: u16,
        offset: u64,
        reason: String,
    },

    #[error("duplicate file id {file_id} at offset {offset}")]
    DuplicateFileId { file_id: u32, offset: u64 },

    #[error("duplicate thread id {thread_id} at offset {offset}")]
    DuplicateThreadId { thread_id: u32, offset: u64 },

    #[error("sample at offset {offset} references unknown thread {thread_id}")]
    UnknownThreadReference { thread_id: u32, offset: u64 },

    #[error("sample timestamp {timestamp} at offset {offset} is earlier than previous timestamp {previous}")]
    NonMonotonicTimestamp {
        previous: u64,
        timestamp: u64,
        offset: u64,
    },

    #[error("header declared {declared} records but {actual} were found (offset {offset})")]
    RecordCountMismatch {
        declared: u64,
        actual: u64,
        offset: u64,
    },

    #[error("header record at offset {offset} is not the first record")]
    MisplacedHeader { offset: u64 },
}

/// Discriminant-only view of a `TraceError`, for matching and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Io,
    BadMagic,
    UnsupportedVersion,
    TruncatedStream,
    UnknownDiscriminant,
    MalformedRecord,
    DuplicateFileId,
    DuplicateThreadId,
    UnknownThreadReference,
    NonMonotonicTimestamp,
    RecordCountMismatch,
    MisplacedHeader,
}

impl TraceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::Io,
            Self::BadMagic { .. } => ErrorKind::BadMagic,
            Self::UnsupportedVersion { .. } => ErrorKind::UnsupportedVersion,
            Self::TruncatedStream { .. } => ErrorKind::TruncatedStream,
            Self::UnknownDiscriminant { .. } => ErrorKind::UnknownDiscriminant,
            Self::MalformedRecord { .. } => ErrorKind::MalformedRecord,
            Self::DuplicateFileId { .. } => ErrorKind::DuplicateFileId,
            Self::DuplicateThreadId { .. } => ErrorKind::DuplicateThreadId,
            Self::UnknownThreadReference { .. } => ErrorKind::UnknownThreadReference,
            Self::NonMonotonicTimestamp { .. } => ErrorKind::NonMonotonicTimestamp,
            Self::RecordCountMismatch { .. } => ErrorKind::RecordCountMismatch,
            Self::MisplacedHeader { .. } => ErrorKind::MisplacedHeader,
        }
    }

    /// Stream offset the error points at, when it has one
    pub fn offset(&self) -> Option<u64> {
        match self {
            Self::Io(_) | Self::BadMagic { .. } | Self::UnsupportedVersion { .. } => None,
            Self::TruncatedStream { offset, .. }
            | Self::UnknownDiscriminant { offset, .. }
            | Self::MalformedRecord { offset, .. }
            | Self::DuplicateFileId { offset, .. }
            | Self::DuplicateThreadId { offset, .. }
            | Self::UnknownThreadReference { offset, .. }
            | Self::NonMonotonicTimestamp { offset, .. }
            | Self::RecordCountMismatch { offset, .. }
            | Self::MisplacedHeader { offset } => Some(*offset),
        }
    }
}

impl ErrorKind {
    /// Stable name used in CLI output
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Io => "Io",
            Self::BadMagic => "BadMagic",
            Self::UnsupportedVersion => "UnsupportedVersion",
            Self::TruncatedStream => "TruncatedStream",
            Self::UnknownDiscriminant => "UnknownDiscriminant",
            Self::MalformedRecord => "MalformedRecord",
            Self::DuplicateFileId => "DuplicateFileId",
            Self::DuplicateThreadId => "DuplicateThreadId",
            Self::UnknownThreadReference => "UnknownThreadReference",
            Self::NonMonotonicTimestamp => "NonMonotonicTimestamp",
            Self::RecordCountMismatch => "RecordCountMismatch",
            Self::MisplacedHeader => "MisplacedHeader",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
