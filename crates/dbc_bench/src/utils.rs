//! Benchmark utilities.

use dbc_testkit::{table_file, TableRow};
use rand::seq::SliceRandom;
use rand::Rng;

/// Generates a `nis` table with `count` records.
///
/// Ids start at 1 and skip roughly one id in `gap_every`, so the index has
/// some empty slots. A `gap_every` of 0 gives contiguous ids.
pub fn generate_table(count: usize, gap_every: u32) -> (Vec<u8>, Vec<u32>) {
    let mut rng = rand::thread_rng();
    let mut rows = Vec::with_capacity(count);
    let mut id = 0u32;
    for i in 0..count {
        id += 1;
        if gap_every > 0 && rng.gen_range(0..gap_every) == 0 {
            id += 1;
        }
        rows.push(TableRow {
            id,
            value: rng.gen(),
            name: format!("record name {i}"),
        });
    }
    let ids = rows.iter().map(|row| row.id).collect();
    (table_file(&rows), ids)
}

/// Returns `ids` in random order.
pub fn shuffled(ids: &[u32]) -> Vec<u32> {
    let mut ids = ids.to_vec();
    ids.shuffle(&mut rand::thread_rng());
    ids
}
