//! Inspect command implementation.

use super::OutputFormat;
use dbc_core::{DbcHeader, DbcStorage, Layout, LoadConfig, DBC_MAGIC, HEADER_SIZE};
use dbc_storage::{ByteStream, FileStream};
use serde::Serialize;
use std::path::Path;
use tracing::warn;

/// File inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// File path.
    pub path: String,
    /// File size in bytes.
    pub file_size: u64,
    /// Header tag, as hex.
    pub magic: String,
    /// Whether the tag is the DBC magic.
    pub valid_magic: bool,
    /// Declared number of records.
    pub record_count: i32,
    /// Declared number of fields per record.
    pub field_count: i32,
    /// Declared record size in bytes.
    pub record_size: i32,
    /// Declared string pool size in bytes.
    pub string_pool_size: i32,
    /// Expected file size from the header.
    pub expected_size: Option<u64>,
    /// Smallest id (if the id column could be scanned).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_id: Option<u32>,
    /// Largest id (if the id column could be scanned).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_id: Option<u32>,
    /// Share of ids in `[min_id, max_id]` that are present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub density: Option<f64>,
}

/// Runs the inspect command.
pub fn run(path: &Path, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let result = inspect(path)?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::Text => {
            print_text_output(&result);
        }
    }

    Ok(())
}

/// Reads the header of `path` and scans its id column.
pub fn inspect(path: &Path) -> Result<InspectResult, Box<dyn std::error::Error>> {
    let mut stream = FileStream::open(path)?;
    let file_size = stream.size()?;
    let mut raw = [0u8; HEADER_SIZE];
    if stream.read_full(&mut raw)? != HEADER_SIZE {
        return Err(format!("{} is shorter than a DBC header", path.display()).into());
    }
    stream.close()?;
    let header = DbcHeader::decode(&raw);

    let mut result = InspectResult {
        path: path.display().to_string(),
        file_size,
        magic: format!("{:#010x}", header.magic),
        valid_magic: header.magic == DBC_MAGIC,
        record_count: header.record_count,
        field_count: header.field_count,
        record_size: header.record_size,
        string_pool_size: header.string_pool_size,
        expected_size: expected_size(&header),
        min_id: None,
        max_id: None,
        density: None,
    };

    if header.record_size <= 0 || header.record_size % 4 != 0 {
        warn!(
            record_size = header.record_size,
            "record size is not a whole number of words; skipping id scan"
        );
        return Ok(result);
    }

    // every field read as a raw word, so no layout is needed
    let layout = Layout::fixed_words((header.record_size / 4) as usize);
    let config = LoadConfig::new().ignore_wrong_magic(true);
    let mut storage = DbcStorage::open_file(path, &layout, &config)?;
    result.min_id = storage.min_id();
    result.max_id = storage.max_id();
    if let (Some(min), Some(max)) = (result.min_id, result.max_id) {
        let span = f64::from(max - min) + 1.0;
        result.density = Some(storage.record_count() as f64 / span);
    }
    storage.close();

    Ok(result)
}

fn expected_size(header: &DbcHeader) -> Option<u64> {
    let records = u64::try_from(header.record_count).ok()?;
    let record_size = u64::try_from(header.record_size).ok()?;
    let pool = u64::try_from(header.string_pool_size).ok()?;
    Some(HEADER_SIZE as u64 + records * record_size + pool)
}

fn print_text_output(result: &InspectResult) {
    println!("DBC File: {}", result.path);
    println!();
    println!("Header:");
    println!(
        "  Magic:            {}{}",
        result.magic,
        if result.valid_magic { "" } else { " (not WDBC)" }
    );
    println!("  Records:          {}", result.record_count);
    println!("  Fields:           {}", result.field_count);
    println!("  Record size:      {} bytes", result.record_size);
    println!("  String pool:      {} bytes", result.string_pool_size);
    println!();
    println!("File:");
    println!("  Size:             {} bytes", result.file_size);
    if let Some(expected) = result.expected_size {
        if expected != result.file_size {
            println!("  Expected size:    {expected} bytes");
        }
    }

    if let (Some(min), Some(max)) = (result.min_id, result.max_id) {
        println!();
        println!("Ids:");
        println!("  Range:            {min}..={max}");
        if let Some(density) = result.density {
            println!("  Density:          {:.1}%", density * 100.0);
        }
    }
}
