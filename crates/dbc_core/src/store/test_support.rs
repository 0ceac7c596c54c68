//! In-crate helpers for building small DBC images.

use crate::header::DbcHeader;
use crate::layout::Layout;

/// Minimal image writer; the testkit crate has the full builder.
pub(crate) struct FileImage {
    layout: Layout,
    records: Vec<Vec<u32>>,
    pool: Vec<u8>,
}

impl FileImage {
    pub(crate) fn new(format: &str) -> Self {
        Self {
            layout: Layout::from_format(format).unwrap(),
            records: Vec::new(),
            pool: Vec::new(),
        }
    }

    pub(crate) fn record(mut self, words: &[u32]) -> Self {
        assert_eq!(words.len(), self.layout.len());
        self.records.push(words.to_vec());
        self
    }

    pub(crate) fn pool(mut self, bytes: &[u8]) -> Self {
        self.pool.extend_from_slice(bytes);
        self
    }

    pub(crate) fn build(self) -> Vec<u8> {
        let header = DbcHeader::new(
            self.records.len() as i32,
            self.layout.len() as i32,
            self.layout.size() as i32,
            self.pool.len() as i32,
        );
        let mut out = header.encode().to_vec();
        for word in self.records.iter().flatten() {
            out.extend_from_slice(&word.to_le_bytes());
        }
        out.extend_from_slice(&self.pool);
        out
    }
}

/// Two records, ids 1 and 5, sharing the pool `"ab\0cd\0"`.
pub(crate) fn sample_file() -> Vec<u8> {
    FileImage::new("nis")
        .record(&[1, 7, 0])
        .record(&[5, 9, 3])
        .pool(b"ab\0cd\0")
        .build()
}
