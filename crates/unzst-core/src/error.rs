//! Error types for decode operations.

use thiserror::Error;

/// Result type alias for decode operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Decode error types.
///
/// Every error aborts the frame being decoded. Bytes already appended to the
/// caller's output are left in place.
#[derive(Debug, Error)]
pub enum Error {
    /// Input ended in the middle of a structure.
    #[error("unexpected EOF after {bytes_read} bytes")]
    UnexpectedEof { bytes_read: u64 },

    /// Leading four bytes are neither a content nor a skippable frame magic.
    #[error("bad magic number 0x{magic:08x}")]
    BadMagicNumber { magic: u32 },

    /// Structural violation inside a frame.
    #[error("invalid format: {message}")]
    InvalidFormat {
        message: String,
        offset: Option<u64>,
    },

    /// Frame trailer does not match the content hash.
    #[error("checksum mismatch: expected 0x{expected:08x}, got 0x{actual:08x}")]
    BadChecksum { expected: u32, actual: u32 },

    /// A declared size could not be represented or allocated.
    #[error("allocation failed: could not allocate {requested_bytes} bytes")]
    AllocationFailed { requested_bytes: u64 },

    /// I/O error from the input source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid format error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidFormat {
            message: message.into(),
            offset: None,
        }
    }

    /// Create an invalid format error with input offset context.
    pub fn invalid_at(message: impl Into<String>, offset: u64) -> Self {
        Error::InvalidFormat {
            message: format!("{} at offset {}", message.into(), offset),
            offset: Some(offset),
        }
    }

    /// Create an unexpected EOF error.
    pub fn unexpected_eof(bytes_read: u64) -> Self {
        Error::UnexpectedEof { bytes_read }
    }

    /// Create a checksum mismatch error.
    pub fn bad_checksum(expected: u32, actual: u32) -> Self {
        Error::BadChecksum { expected, actual }
    }

    /// Create an allocation failure error.
    pub fn allocation_failed(requested_bytes: u64) -> Self {
        Error::AllocationFailed { requested_bytes }
    }

    /// Whether the error only concerns integrity of otherwise decoded content.
    pub fn is_checksum(&self) -> bool {
        matches!(self, Error::BadChecksum { .. })
    }

    /// Get error category for logging.
    pub fn category(&self) -> &'static str {
        match self {
            Error::UnexpectedEof { .. } => "unexpected_eof",
            Error::BadMagicNumber { .. } => "bad_magic_number",
            Error::InvalidFormat { .. } => "invalid_format",
            Error::BadChecksum { .. } => "bad_checksum",
            Error::AllocationFailed { .. } => "allocation_failed",
            Error::Io(_) => "io_error",
        }
    }
}
