//! Get command implementation.

use super::OutputFormat;
use dbc_core::{DbcError, DbcStorage, Layout, LayoutElement, LoadConfig, RecordView};
use serde::Serialize;
use std::path::Path;

/// One decoded field.
#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldValue {
    /// A raw word, shown under every interpretation.
    Word {
        /// Field index.
        index: usize,
        /// As a signed integer.
        int: i32,
        /// As an unsigned integer.
        uint: u32,
        /// As a float.
        float: f32,
    },
    /// A string reference, resolved.
    String {
        /// Field index.
        index: usize,
        /// Decoded string.
        value: String,
    },
}

/// A record ready for printing.
#[derive(Debug, Serialize)]
pub struct RecordOutput {
    /// Record id.
    pub id: u32,
    /// Fields in layout order.
    pub fields: Vec<FieldValue>,
}

/// Runs the get command.
pub fn run(
    path: &Path,
    layout: &str,
    id: u32,
    stream: bool,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let record = read_record(path, layout, id, stream)?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        OutputFormat::Text => {
            print_text_output(&record);
        }
    }

    Ok(())
}

/// Loads `path` with `layout` and decodes record `id`.
pub fn read_record(
    path: &Path,
    layout: &str,
    id: u32,
    stream: bool,
) -> Result<RecordOutput, DbcError> {
    let layout = Layout::from_format(layout)?;
    let config = LoadConfig::new().complete_load(!stream);
    let mut storage = DbcStorage::open_file(path, &layout, &config)?;

    let record = match storage.get(id)? {
        Some(view) => describe(&view)?,
        None => return Err(DbcError::NotFound { id }),
    };
    storage.close();
    Ok(record)
}

fn describe(view: &RecordView<'_>) -> Result<RecordOutput, DbcError> {
    let mut fields = Vec::with_capacity(view.layout().len());
    for (index, element) in view.layout().elements().iter().enumerate() {
        let field = match element {
            LayoutElement::FixedWord => FieldValue::Word {
                index,
                int: view.i32(index).unwrap_or_default(),
                uint: view.u32(index).unwrap_or_default(),
                float: view.f32(index).unwrap_or_default(),
            },
            LayoutElement::StringRef => FieldValue::String {
                index,
                value: view.string(index)?,
            },
        };
        fields.push(field);
    }
    Ok(RecordOutput {
        id: view.id(),
        fields,
    })
}

fn print_text_output(record: &RecordOutput) {
    println!("Record {}", record.id);
    for field in &record.fields {
        match field {
            FieldValue::Word {
                index,
                int,
                uint,
                float,
            } => println!("  [{index}] word    int={int} uint={uint} float={float}"),
            FieldValue::String { index, value } => println!("  [{index}] string  {value:?}"),
        }
    }
}
