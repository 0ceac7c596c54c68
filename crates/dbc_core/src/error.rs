//! Error types for the DBC record store.

use dbc_storage::StorageError;
use thiserror::Error;

/// Result type for record store operations.
pub type DbcResult<T> = Result<T, DbcError>;

/// Errors that can occur while describing, loading or querying a DBC file.
#[derive(Debug, Error)]
pub enum DbcError {
    /// The stream ended before a complete header, record or string was read.
    #[error("truncated input while reading {context}")]
    TruncatedInput {
        /// What was being read when the stream ran out.
        context: String,
    },

    /// The header tag is not the DBC magic.
    #[error("bad magic: expected {expected:#010x}, found {found:#010x}")]
    BadMagic {
        /// The DBC magic.
        expected: u32,
        /// The tag found in the header.
        found: u32,
    },

    /// The record size in the header disagrees with the layout.
    #[error("record size mismatch: layout is {expected} bytes, file declares {actual}")]
    SizeMismatch {
        /// Size computed from the layout.
        expected: usize,
        /// Size declared by the header.
        actual: i32,
    },

    /// Record ids are not strictly increasing.
    #[error("record {index} has id {id}, which does not follow id {previous}")]
    OrderingViolation {
        /// Zero-based record position in the file.
        index: usize,
        /// Id of the previous record.
        previous: u32,
        /// Offending id.
        id: u32,
    },

    /// The schema cannot be mapped onto the layout.
    #[error("schema error: {message}")]
    SchemaError {
        /// Description of the problem.
        message: String,
    },

    /// A file offset does not fit in 31 bits.
    #[error("offset {offset:#x} does not fit in 31 bits")]
    OffsetOverflow {
        /// The offending offset.
        offset: u64,
    },

    /// Streaming mode was requested on a stream that cannot seek.
    #[error("streaming load requires a seekable stream")]
    NotSeekable,

    /// The id is not acceptable for the requested operation.
    #[error("invalid id {id}: {reason}")]
    InvalidId {
        /// The rejected id.
        id: u32,
        /// Why it was rejected.
        reason: String,
    },

    /// The store has already been torn down.
    #[error("record store used after teardown")]
    UseAfterTeardown,

    /// No record exists for the id.
    #[error("no record with id {id}")]
    NotFound {
        /// The missing id.
        id: u32,
    },

    /// The header carries values no valid file can have.
    #[error("invalid header: {message}")]
    InvalidHeader {
        /// Description of the problem.
        message: String,
    },

    /// The layout format string is malformed.
    #[error("invalid layout element '{element}' at position {position}")]
    LayoutFormat {
        /// Zero-based character position.
        position: usize,
        /// The rejected character.
        element: char,
    },

    /// The layout was mutated after being fixed.
    #[error("layout is fixed and can no longer be changed")]
    LayoutFixed,

    /// A string reference points outside the string pool.
    #[error("string offset {offset} is outside the {pool_size}-byte string pool")]
    StringOffsetOutOfBounds {
        /// The pool offset found in the record.
        offset: u32,
        /// Size of the string pool.
        pool_size: usize,
    },

    /// Stream error other than a short read.
    #[error("storage error: {0}")]
    Storage(StorageError),
}

impl DbcError {
    /// Creates a truncated input error.
    pub fn truncated(context: impl Into<String>) -> Self {
        Self::TruncatedInput {
            context: context.into(),
        }
    }

    /// Creates a schema error.
    pub fn schema(message: impl Into<String>) -> Self {
        Self::SchemaError {
            message: message.into(),
        }
    }

    /// Creates an invalid id error.
    pub fn invalid_id(id: u32, reason: impl Into<String>) -> Self {
        Self::InvalidId {
            id,
            reason: reason.into(),
        }
    }

    /// Creates an invalid header error.
    pub fn invalid_header(message: impl Into<String>) -> Self {
        Self::InvalidHeader {
            message: message.into(),
        }
    }
}

impl From<StorageError> for DbcError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotSeekable => Self::NotSeekable,
            e if e.is_unexpected_eof() => Self::truncated("stream"),
            e => Self::Storage(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn unexpected_eof_maps_to_truncated() {
        let err = StorageError::Io(io::Error::new(io::ErrorKind::UnexpectedEof, "eof"));
        assert!(matches!(DbcError::from(err), DbcError::TruncatedInput { .. }));
    }

    #[test]
    fn not_seekable_maps_through() {
        assert!(matches!(
            DbcError::from(StorageError::NotSeekable),
            DbcError::NotSeekable
        ));
    }

    #[test]
    fn other_storage_errors_are_wrapped() {
        assert!(matches!(
            DbcError::from(StorageError::Closed),
            DbcError::Storage(StorageError::Closed)
        ));
    }

    #[test]
    fn bad_magic_display() {
        let err = DbcError::BadMagic {
            expected: 0x4342_4457,
            found: 0x3242_4457,
        };
        assert_eq!(
            err.to_string(),
            "bad magic: expected 0x43424457, found 0x32424457"
        );
    }
}
