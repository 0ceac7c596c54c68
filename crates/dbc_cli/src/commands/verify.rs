//! Verify command implementation.

use dbc_core::{DbcError, DbcStorage, Layout, LayoutElement, LoadConfig};
use std::path::Path;

/// Verification result.
#[derive(Debug)]
pub struct VerifyReport {
    /// Number of records loaded.
    pub records: usize,
    /// Smallest id.
    pub min_id: Option<u32>,
    /// Largest id.
    pub max_id: Option<u32>,
    /// Number of string references resolved.
    pub strings_checked: usize,
    /// Ids of records with strings that are not valid UTF-8.
    pub non_utf8: Vec<u32>,
}

/// Runs the verify command.
pub fn run(path: &Path, layout: &str) -> Result<(), Box<dyn std::error::Error>> {
    println!("Verifying {}", path.display());
    println!();

    match verify(path, layout) {
        Ok(report) => {
            println!("  Records:          {}", report.records);
            if let (Some(min), Some(max)) = (report.min_id, report.max_id) {
                println!("  Id range:         {min}..={max}");
            }
            println!("  Strings checked:  {}", report.strings_checked);
            if !report.non_utf8.is_empty() {
                println!(
                    "  Non-UTF-8 strings in {} records (first: {})",
                    report.non_utf8.len(),
                    report.non_utf8[0]
                );
            }
            println!();
            println!("✓ OK");
            Ok(())
        }
        Err(error) => {
            println!("✗ {error}");
            Err("Verification failed".into())
        }
    }
}

/// Loads `path` eagerly and resolves every string reference.
pub fn verify(path: &Path, layout: &str) -> Result<VerifyReport, DbcError> {
    let layout = Layout::from_format(layout)?;
    let config = LoadConfig::new().complete_load(true);
    let mut storage = DbcStorage::open_file(path, &layout, &config)?;

    let string_fields: Vec<usize> = layout
        .elements()
        .iter()
        .enumerate()
        .filter(|(_, element)| **element == LayoutElement::StringRef)
        .map(|(index, _)| index)
        .collect();

    let mut report = VerifyReport {
        records: storage.record_count(),
        min_id: storage.min_id(),
        max_id: storage.max_id(),
        strings_checked: 0,
        non_utf8: Vec::new(),
    };

    for id in storage.ids()? {
        let Some(view) = storage.get(id)? else {
            return Err(DbcError::NotFound { id });
        };
        let mut valid = true;
        for &index in &string_fields {
            valid &= std::str::from_utf8(view.string_bytes(index)?).is_ok();
            report.strings_checked += 1;
        }
        if !valid {
            report.non_utf8.push(id);
        }
    }
    storage.close();

    Ok(report)
}
