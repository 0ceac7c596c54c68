//! Test fixtures and file helpers.

use crate::builder::{DbcFileBuilder, Field};
use dbc_core::{DbcRecord, FieldPlan, LazyString, Layout, Schema};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Layout format of [`sample_file`].
pub const SAMPLE_LAYOUT: &str = "nis";

/// The two-record sample file: ids 1 and 5, values 7 and 9, strings
/// `"ab"` and `"cd"` in the pool `"ab\0cd\0"`.
pub fn sample_builder() -> DbcFileBuilder {
    DbcFileBuilder::new(SAMPLE_LAYOUT)
        .record([Field::UInt(1), Field::Int(7), Field::PoolOffset(0)])
        .record([Field::UInt(5), Field::Int(9), Field::PoolOffset(3)])
        .raw_pool(b"ab\0cd\0")
}

/// Bytes of [`sample_builder`].
pub fn sample_file() -> Vec<u8> {
    sample_builder().build()
}

/// The fixed sample layout.
pub fn sample_layout() -> Layout {
    Layout::from_format(SAMPLE_LAYOUT)
        .expect("valid layout format")
        .fixed()
}

/// A typed row of the sample layout.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SampleRow {
    /// Record id.
    pub id: u32,
    /// Signed payload word.
    pub value: i32,
    /// Pool string.
    pub name: String,
}

impl DbcRecord for SampleRow {
    fn record_id(&self) -> u32 {
        self.id
    }
}

/// Decode plan for [`SampleRow`].
pub fn sample_plan() -> FieldPlan<SampleRow> {
    let schema = Schema::new()
        .uint32("id", |r: &mut SampleRow, v| r.id = v)
        .int32("value", |r, v| r.value = v)
        .string("name", |r, v| r.name = v);
    FieldPlan::new(&sample_layout(), schema).expect("sample plan")
}

/// A sample row whose string is decoded lazily.
#[derive(Debug, Default)]
pub struct LazySampleRow {
    /// Record id.
    pub id: u32,
    /// Signed payload word.
    pub value: i32,
    /// Pool string, possibly still pending.
    pub name: LazyString,
}

impl DbcRecord for LazySampleRow {
    fn record_id(&self) -> u32 {
        self.id
    }
}

/// Decode plan for [`LazySampleRow`].
pub fn lazy_sample_plan() -> FieldPlan<LazySampleRow> {
    let schema = Schema::new()
        .uint32("id", |r: &mut LazySampleRow, v| r.id = v)
        .int32("value", |r, v| r.value = v)
        .lazy_string("name", |r, v| r.name = v);
    FieldPlan::new(&sample_layout(), schema).expect("lazy sample plan")
}

/// A DBC image written to a temporary directory.
pub struct TempDbcFile {
    path: PathBuf,
    _dir: TempDir,
}

impl TempDbcFile {
    /// Writes `bytes` to `sample.dbc` in a fresh temporary directory.
    pub fn new(bytes: &[u8]) -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = dir.path().join("sample.dbc");
        std::fs::write(&path, bytes).expect("Failed to write DBC file");
        Self { path, _dir: dir }
    }

    /// Path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Runs `f` with the path of a temporary file holding `bytes`.
pub fn with_temp_file<F, R>(bytes: &[u8], f: F) -> R
where
    F: FnOnce(&Path) -> R,
{
    let file = TempDbcFile::new(bytes);
    f(file.path())
}
