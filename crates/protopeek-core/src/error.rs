//! Error types for the protopeek-core library.
//!
//! Schema extraction and payload decoding each have their own error type so
//! that callers working with in-memory data only match on what can actually
//! happen. [`Error`] wraps both together with the file-level failures of the
//! `*_file` convenience helpers.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for protopeek operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for all protopeek operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Failed to read input file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Schema text could not be extracted
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Payload did not follow the wire format
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Requested message is not defined in the schema
    #[error("message '{name}' not found in schema")]
    MessageNotFound {
        /// The requested message name
        name: String,
    },
}

impl Error {
    /// Creates a new file read error
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a new message lookup error
    pub fn message_not_found(name: impl Into<String>) -> Self {
        Self::MessageNotFound { name: name.into() }
    }
}

/// Errors raised while extracting a schema.
///
/// Text that simply does not look like a schema is not an error: it yields an
/// empty [`Schema`](crate::Schema).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SchemaError {
    /// Input bytes are not UTF-8 text
    #[error("schema input is not valid UTF-8 (valid up to byte {valid_up_to})")]
    NotText {
        /// Length of the valid UTF-8 prefix
        valid_up_to: usize,
    },

    /// A field number does not fit the field number range
    #[error("field '{field}' in message '{message}' has out-of-range number {literal}")]
    FieldNumberOverflow {
        /// Enclosing message name
        message: String,
        /// Field name
        field: String,
        /// The number literal as written
        literal: String,
    },
}

/// Discriminant of a [`DecodeError`], without the positional details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeErrorKind {
    /// Buffer ended inside a varint
    TruncatedVarint,
    /// Varint continued past 64 bits
    VarintTooLong,
    /// Not enough bytes for a 4- or 8-byte value
    TruncatedFixedWidth,
    /// Declared length exceeds the remaining bytes
    TruncatedLengthDelimited,
    /// Wire type other than 0, 1, 2 or 5
    UnsupportedWireType,
}

/// Errors raised while decoding a payload.
///
/// Every variant carries the byte offset into the decoded buffer at which the
/// offending value starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeError {
    /// Buffer ended before a varint terminating byte
    #[error("truncated varint at offset {offset}")]
    TruncatedVarint {
        /// Offset of the first varint byte
        offset: usize,
    },

    /// Varint longer than 10 bytes
    #[error("varint at offset {offset} exceeds 64 bits")]
    VarintTooLong {
        /// Offset of the first varint byte
        offset: usize,
    },

    /// Fixed-width value cut short
    #[error("need {needed} bytes for fixed-width value at offset {offset}, have {available}")]
    TruncatedFixedWidth {
        /// Offset of the value
        offset: usize,
        /// Width of the value (4 or 8)
        needed: usize,
        /// Bytes left in the buffer
        available: usize,
    },

    /// Length-delimited payload cut short
    #[error("length-delimited value at offset {offset} declares {declared} bytes, have {available}")]
    TruncatedLengthDelimited {
        /// Offset of the payload (just past the length prefix)
        offset: usize,
        /// Declared payload length
        declared: u64,
        /// Bytes left in the buffer
        available: usize,
    },

    /// Unknown or deprecated wire type
    #[error("unsupported wire type {wire_type} at offset {offset}")]
    UnsupportedWireType {
        /// Offset of the tag
        offset: usize,
        /// The raw wire type bits
        wire_type: u8,
    },
}

impl DecodeError {
    /// Byte offset at which the error occurred
    pub fn offset(&self) -> usize {
        match *self {
            Self::TruncatedVarint { offset }
            | Self::VarintTooLong { offset }
            | Self::TruncatedFixedWidth { offset, .. }
            | Self::TruncatedLengthDelimited { offset, .. }
            | Self::UnsupportedWireType { offset, .. } => offset,
        }
    }

    /// The kind of failure
    pub fn kind(&self) -> DecodeErrorKind {
        match self {
            Self::TruncatedVarint { .. } => DecodeErrorKind::TruncatedVarint,
            Self::VarintTooLong { .. } => DecodeErrorKind::VarintTooLong,
            Self::TruncatedFixedWidth { .. } => DecodeErrorKind::TruncatedFixedWidth,
            Self::TruncatedLengthDelimited { .. } => DecodeErrorKind::TruncatedLengthDelimited,
            Self::UnsupportedWireType { .. } => DecodeErrorKind::UnsupportedWireType,
        }
    }
}
