//! Error types for stream operations.

use std::io;
use thiserror::Error;

/// Result type for stream operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during stream operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Attempted to position the stream beyond its addressable range.
    #[error("seek beyond end of stream: position {position}, size {size}")]
    ReadPastEnd {
        /// The requested position.
        position: u64,
        /// The current stream size.
        size: u64,
    },

    /// The stream does not support random access.
    #[error("stream is not seekable")]
    NotSeekable,

    /// The stream is closed.
    #[error("stream is closed")]
    Closed,
}

impl StorageError {
    /// Returns `true` if this error reports an unexpected end of input.
    #[must_use]
    pub fn is_unexpected_eof(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof)
    }
}
