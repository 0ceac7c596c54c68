//! Property-based test generators using proptest.
//!
//! Provides strategies for generating DBC tables that keep the format's
//! invariants: ids strictly increasing, strings free of null bytes.

use crate::builder::{DbcFileBuilder, Field};
use proptest::prelude::*;

/// One row of the `nis` sample layout.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    /// Record id.
    pub id: u32,
    /// Signed payload word.
    pub value: i32,
    /// Pool string.
    pub name: String,
}

/// Strategy for strings that can live in a string pool.
pub fn pool_string_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9 _.-]{0,24}").expect("Invalid regex")
}

/// Strategy for strictly ascending, non-zero ids.
pub fn ascending_ids_strategy(max_len: usize) -> impl Strategy<Value = Vec<u32>> {
    prop::collection::btree_set(1u32..5_000, 0..max_len)
        .prop_map(|ids| ids.into_iter().collect())
}

/// Strategy for complete `nis` tables.
pub fn table_strategy(max_rows: usize) -> impl Strategy<Value = Vec<TableRow>> {
    ascending_ids_strategy(max_rows).prop_flat_map(|ids| {
        let len = ids.len();
        (
            Just(ids),
            prop::collection::vec(any::<i32>(), len),
            prop::collection::vec(pool_string_strategy(), len),
        )
            .prop_map(|(ids, values, names)| {
                ids.into_iter()
                    .zip(values)
                    .zip(names)
                    .map(|((id, value), name)| TableRow { id, value, name })
                    .collect()
            })
    })
}

/// Writes `rows` as a `nis` image.
pub fn table_file(rows: &[TableRow]) -> Vec<u8> {
    rows.iter()
        .fold(DbcFileBuilder::new("nis"), |builder, row| {
            builder.record([
                Field::UInt(row.id),
                Field::Int(row.value),
                Field::Str(row.name.clone()),
            ])
        })
        .build()
}
