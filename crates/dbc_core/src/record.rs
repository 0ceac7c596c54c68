//! Borrowed views over materialized records.

use crate::error::{DbcError, DbcResult};
use crate::layout::{Layout, LayoutElement};
use crate::lazy::{c_string_bytes, decode_c_string, LazyString};
use crate::plan::{FieldPlan, StringMode};
use crate::registry::{Address, ReleaseRegistry};
use bytes::Bytes;
use std::fmt;

/// Where the string references of a record point.
#[derive(Clone, Copy)]
pub(crate) enum StringSource<'a> {
    /// Each reference is an absolute position inside the store's single
    /// buffer (eager mode).
    Buffer(&'a Bytes),
    /// Each reference is the address of a separately registered,
    /// null-terminated allocation (streaming mode).
    Registry(&'a ReleaseRegistry),
}

/// A materialized record, borrowed from its store.
///
/// String references inside the record have already been fixed up by the
/// store; the view resolves them without further I/O.
#[derive(Clone, Copy)]
pub struct RecordView<'a> {
    bytes: &'a [u8],
    layout: &'a Layout,
    strings: StringSource<'a>,
    mode: StringMode,
}

impl<'a> RecordView<'a> {
    pub(crate) fn new(
        bytes: &'a [u8],
        layout: &'a Layout,
        strings: StringSource<'a>,
        mode: StringMode,
    ) -> Self {
        Self {
            bytes,
            layout,
            strings,
            mode,
        }
    }

    /// The record id (first field).
    #[must_use]
    pub fn id(&self) -> u32 {
        u32::from_le_bytes([self.bytes[0], self.bytes[1], self.bytes[2], self.bytes[3]])
    }

    /// The raw record bytes, with string references already fixed up.
    #[must_use]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// The layout describing this record.
    #[must_use]
    pub fn layout(&self) -> &'a Layout {
        self.layout
    }

    /// How lazy strings decoded from this view are materialized.
    #[must_use]
    pub fn string_mode(&self) -> StringMode {
        self.mode
    }

    /// The raw four bytes of field `index`.
    #[must_use]
    pub fn word(&self, index: usize) -> Option<[u8; 4]> {
        let at = self.layout.offset_of(index)?;
        let raw = self.bytes.get(at..at + 4)?;
        Some([raw[0], raw[1], raw[2], raw[3]])
    }

    /// Field `index` as an unsigned integer.
    #[must_use]
    pub fn u32(&self, index: usize) -> Option<u32> {
        self.word(index).map(u32::from_le_bytes)
    }

    /// Field `index` as a signed integer.
    #[must_use]
    pub fn i32(&self, index: usize) -> Option<i32> {
        self.word(index).map(i32::from_le_bytes)
    }

    /// Field `index` as a float.
    #[must_use]
    pub fn f32(&self, index: usize) -> Option<f32> {
        self.word(index).map(f32::from_le_bytes)
    }

    /// Bytes of the string referenced by field `index`, without the
    /// terminating null.
    ///
    /// # Errors
    ///
    /// Returns [`DbcError::SchemaError`] if the field is not a string
    /// reference.
    pub fn string_bytes(&self, index: usize) -> DbcResult<&'a [u8]> {
        let (pool, at) = self.string_location(index)?;
        Ok(c_string_bytes(&pool[at..]))
    }

    /// The string referenced by field `index`, decoded as lossy UTF-8.
    ///
    /// # Errors
    ///
    /// Returns [`DbcError::SchemaError`] if the field is not a string
    /// reference.
    pub fn string(&self, index: usize) -> DbcResult<String> {
        let (pool, at) = self.string_location(index)?;
        Ok(decode_c_string(&pool[at..]))
    }

    /// The string referenced by field `index`, left undecoded.
    ///
    /// # Errors
    ///
    /// Returns [`DbcError::SchemaError`] if the field is not a string
    /// reference.
    pub fn lazy_string(&self, index: usize) -> DbcResult<LazyString> {
        let (pool, at) = self.string_location(index)?;
        LazyString::pending(pool.clone(), at)
    }

    /// Decodes this record into `T` with `plan`.
    ///
    /// # Errors
    ///
    /// Returns an error if the plan was built for a different layout.
    pub fn decode<T: Default>(&self, plan: &FieldPlan<T>) -> DbcResult<T> {
        plan.decode(self, self.mode)
    }

    fn string_location(&self, index: usize) -> DbcResult<(&'a Bytes, usize)> {
        match self.layout.element(index) {
            Some(LayoutElement::StringRef) => {}
            Some(LayoutElement::FixedWord) => {
                return Err(DbcError::schema(format!(
                    "field {index} is not a string reference"
                )))
            }
            None => {
                return Err(DbcError::schema(format!(
                    "field {index} is outside the {}-field layout",
                    self.layout.len()
                )))
            }
        }
        let word = self.u32(index).unwrap_or_default();
        match self.strings {
            StringSource::Buffer(buffer) => Ok((buffer, word as usize)),
            StringSource::Registry(registry) => {
                let buffer = Address::from_raw(word)
                    .and_then(|address| registry.get(address))
                    .ok_or(DbcError::UseAfterTeardown)?;
                Ok((buffer, 0))
            }
        }
    }
}

impl fmt::Debug for RecordView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordView")
            .field("id", &self.id())
            .field("size", &self.bytes.len())
            .finish()
    }
}
