//! DBC file header.
//!
//! ```text
//! | magic (4) | record_count (4) | field_count (4) | record_size (4) | string_pool_size (4) |
//! ```
//!
//! All fields are little-endian. The header is followed by
//! `record_count * record_size` bytes of records and `string_pool_size`
//! bytes of null-terminated strings.

use crate::error::{DbcError, DbcResult};

/// Header tag of a DBC file, ASCII `"WDBC"` read as a little-endian `u32`.
pub const DBC_MAGIC: u32 = 0x4342_4457;

/// Size of the encoded header in bytes.
pub const HEADER_SIZE: usize = 20;

/// Decoded DBC header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbcHeader {
    /// Header tag.
    pub magic: u32,
    /// Number of records.
    pub record_count: i32,
    /// Number of fields per record. Informational only.
    pub field_count: i32,
    /// Size of one record in bytes.
    pub record_size: i32,
    /// Size of the string pool in bytes.
    pub string_pool_size: i32,
}

impl DbcHeader {
    /// Creates a header with the DBC magic.
    #[must_use]
    pub const fn new(
        record_count: i32,
        field_count: i32,
        record_size: i32,
        string_pool_size: i32,
    ) -> Self {
        Self {
            magic: DBC_MAGIC,
            record_count,
            field_count,
            record_size,
            string_pool_size,
        }
    }

    /// Decodes a header from its 20 raw bytes.
    #[must_use]
    pub fn decode(bytes: &[u8; HEADER_SIZE]) -> Self {
        let word = |at: usize| [bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]];
        Self {
            magic: u32::from_le_bytes(word(0)),
            record_count: i32::from_le_bytes(word(4)),
            field_count: i32::from_le_bytes(word(8)),
            record_size: i32::from_le_bytes(word(12)),
            string_pool_size: i32::from_le_bytes(word(16)),
        }
    }

    /// Encodes the header to its 20 raw bytes.
    #[must_use]
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&self.magic.to_le_bytes());
        buf[4..8].copy_from_slice(&self.record_count.to_le_bytes());
        buf[8..12].copy_from_slice(&self.field_count.to_le_bytes());
        buf[12..16].copy_from_slice(&self.record_size.to_le_bytes());
        buf[16..20].copy_from_slice(&self.string_pool_size.to_le_bytes());
        buf
    }

    /// Returns whether the tag is the DBC magic.
    #[must_use]
    pub const fn has_valid_magic(&self) -> bool {
        self.magic == DBC_MAGIC
    }

    /// Number of records as `usize`.
    ///
    /// # Errors
    ///
    /// Returns [`DbcError::InvalidHeader`] if the count is negative.
    pub fn records(&self) -> DbcResult<usize> {
        usize::try_from(self.record_count).map_err(|_| {
            DbcError::invalid_header(format!("negative record count {}", self.record_count))
        })
    }

    /// String pool size as `usize`.
    ///
    /// # Errors
    ///
    /// Returns [`DbcError::InvalidHeader`] if the size is negative.
    pub fn pool_size(&self) -> DbcResult<usize> {
        usize::try_from(self.string_pool_size).map_err(|_| {
            DbcError::invalid_header(format!(
                "negative string pool size {}",
                self.string_pool_size
            ))
        })
    }

    /// Size of the record array in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`DbcError::InvalidHeader`] if the count is negative or the
    /// product overflows.
    pub fn payload_size(&self, record_size: usize) -> DbcResult<usize> {
        self.records()?
            .checked_mul(record_size)
            .ok_or_else(|| DbcError::invalid_header("record array size overflows"))
    }
}
