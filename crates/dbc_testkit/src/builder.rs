//! DBC image writer.
//!
//! Builds byte images record by record. Strings are interned into the pool
//! automatically; the `with_*` overrides produce files that break one
//! header invariant at a time.

use dbc_core::{DbcHeader, Layout, LayoutElement, DBC_MAGIC, HEADER_SIZE};
use std::collections::HashMap;

/// One field value of a record being built.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// Signed integer word.
    Int(i32),
    /// Unsigned integer word.
    UInt(u32),
    /// Float word.
    Float(f32),
    /// String, interned into the pool.
    Str(String),
    /// Raw pool offset, written as-is.
    PoolOffset(u32),
}

impl From<i32> for Field {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for Field {
    fn from(value: u32) -> Self {
        Self::UInt(value)
    }
}

impl From<f32> for Field {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Field {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Field {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

/// Writer for DBC byte images.
#[derive(Debug, Clone)]
pub struct DbcFileBuilder {
    layout: Layout,
    records: Vec<[u8; 4]>,
    pool: Vec<u8>,
    interned: HashMap<String, u32>,
    magic: u32,
    record_size: Option<i32>,
    record_count: Option<i32>,
    pool_size: Option<i32>,
    prefix: Vec<u8>,
    truncate: usize,
}

impl DbcFileBuilder {
    /// Starts an image for the layout `format` (see [`Layout::from_format`]).
    ///
    /// # Panics
    ///
    /// Panics if `format` is not a valid layout.
    pub fn new(format: &str) -> Self {
        Self {
            layout: Layout::from_format(format).expect("valid layout format"),
            records: Vec::new(),
            pool: Vec::new(),
            interned: HashMap::new(),
            magic: DBC_MAGIC,
            record_size: None,
            record_count: None,
            pool_size: None,
            prefix: Vec::new(),
            truncate: 0,
        }
    }

    /// Appends one record.
    ///
    /// # Panics
    ///
    /// Panics if the field count or a field's kind does not fit the layout.
    pub fn record<I>(mut self, fields: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Field>,
    {
        let fields: Vec<Field> = fields.into_iter().map(Into::into).collect();
        assert_eq!(
            fields.len(),
            self.layout.len(),
            "record has {} fields, layout has {}",
            fields.len(),
            self.layout.len()
        );
        for (field, element) in fields.into_iter().zip(self.layout.elements().to_vec()) {
            let word = match (field, element) {
                (Field::Int(v), LayoutElement::FixedWord) => v.to_le_bytes(),
                (Field::UInt(v), LayoutElement::FixedWord) => v.to_le_bytes(),
                (Field::Float(v), LayoutElement::FixedWord) => v.to_le_bytes(),
                (Field::Str(s), LayoutElement::StringRef) => self.intern(&s).to_le_bytes(),
                (Field::PoolOffset(v), LayoutElement::StringRef) => v.to_le_bytes(),
                (field, element) => panic!("{field:?} does not fit a {element:?} field"),
            };
            self.records.push(word);
        }
        self
    }

    /// Appends a record made only of unsigned words.
    pub fn words(self, words: &[u32]) -> Self {
        let layout = self.layout.clone();
        let fields: Vec<Field> = words
            .iter()
            .zip(layout.elements())
            .map(|(&word, element)| match element {
                LayoutElement::FixedWord => Field::UInt(word),
                LayoutElement::StringRef => Field::PoolOffset(word),
            })
            .collect();
        self.record(fields)
    }

    /// Appends raw bytes to the pool, bypassing interning.
    pub fn raw_pool(mut self, bytes: &[u8]) -> Self {
        self.pool.extend_from_slice(bytes);
        self
    }

    /// Writes a foreign header tag.
    pub fn with_magic(mut self, magic: u32) -> Self {
        self.magic = magic;
        self
    }

    /// Declares a record size other than the layout's.
    pub fn with_record_size(mut self, record_size: i32) -> Self {
        self.record_size = Some(record_size);
        self
    }

    /// Declares a record count other than the number of records written.
    pub fn with_record_count(mut self, record_count: i32) -> Self {
        self.record_count = Some(record_count);
        self
    }

    /// Declares a pool size other than the pool written.
    pub fn with_pool_size(mut self, pool_size: i32) -> Self {
        self.pool_size = Some(pool_size);
        self
    }

    /// Writes `bytes` before the header.
    pub fn with_prefix(mut self, bytes: &[u8]) -> Self {
        self.prefix = bytes.to_vec();
        self
    }

    /// Drops `count` bytes from the end of the image.
    pub fn truncated_by(mut self, count: usize) -> Self {
        self.truncate = count;
        self
    }

    /// The header that [`build`](Self::build) writes.
    pub fn header(&self) -> DbcHeader {
        let mut header = DbcHeader::new(
            self.record_count
                .unwrap_or((self.records.len() / self.layout.len()) as i32),
            self.layout.len() as i32,
            self.record_size.unwrap_or(self.layout.size() as i32),
            self.pool_size.unwrap_or(self.pool.len() as i32),
        );
        header.magic = self.magic;
        header
    }

    /// Absolute position of the first record in the built image.
    pub fn data_start(&self) -> u64 {
        (self.prefix.len() + HEADER_SIZE) as u64
    }

    /// Pool offset of `s`, if it has been interned.
    pub fn offset_of(&self, s: &str) -> Option<u32> {
        self.interned.get(s).copied()
    }

    /// Produces the image.
    pub fn build(&self) -> Vec<u8> {
        let mut out = self.prefix.clone();
        out.extend_from_slice(&self.header().encode());
        for word in &self.records {
            out.extend_from_slice(word);
        }
        out.extend_from_slice(&self.pool);
        out.truncate(out.len().saturating_sub(self.truncate));
        out
    }

    fn intern(&mut self, s: &str) -> u32 {
        if let Some(&offset) = self.interned.get(s) {
            return offset;
        }
        let offset = self.pool.len() as u32;
        self.pool.extend_from_slice(s.as_bytes());
        self.pool.push(0);
        self.interned.insert(s.to_string(), offset);
        offset
    }
}
