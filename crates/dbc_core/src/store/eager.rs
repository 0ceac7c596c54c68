//! Eager loading: the whole file in one buffer.

use crate::config::LoadConfig;
use crate::error::{DbcError, DbcResult};
use crate::header::DbcHeader;
use crate::layout::Layout;
use crate::plan::StringMode;
use crate::record::{RecordView, StringSource};
use crate::registry::{Address, ReleaseRegistry};
use crate::store::io::{read_exact, IdScan, Preamble};
use bytes::{Bytes, BytesMut};
use dbc_storage::ByteStream;
use tracing::debug;

/// Bytes copied from the stream per read call.
const LOAD_CHUNK_SIZE: usize = 16 * 1024;

/// A record store that keeps the record array and string pool in memory.
///
/// Loading reads the payload into a single buffer, verifies that ids are
/// strictly increasing, rewrites every string reference into an absolute
/// position inside that buffer, and indexes records by `id - min_id`.
///
/// After loading, lookups are read-only and the store can be shared
/// between threads.
#[derive(Debug)]
pub struct EagerStore {
    header: DbcHeader,
    layout: Layout,
    registry: ReleaseRegistry,
    data: Option<Address>,
    index: Vec<Option<u32>>,
    range: Option<(u32, u32)>,
    records: usize,
    mode: StringMode,
    closed: bool,
}

impl EagerStore {
    /// Loads a DBC file from the current position of `stream`.
    ///
    /// The stream is left positioned after the string pool and is never
    /// closed here.
    ///
    /// # Errors
    ///
    /// Returns an error if the header is invalid, the stream is too short,
    /// ids are not strictly increasing, or a string reference points
    /// outside the pool.
    pub fn load<S: ByteStream + ?Sized>(
        stream: &mut S,
        layout: &Layout,
        config: &LoadConfig,
    ) -> DbcResult<Self> {
        let layout = layout.clone().fixed();
        layout.ensure_keyed()?;
        let preamble = Preamble::read(stream, &layout, config)?;
        Self::from_preamble(stream, preamble, layout, config)
    }

    pub(crate) fn from_preamble<S: ByteStream + ?Sized>(
        stream: &mut S,
        preamble: Preamble,
        layout: Layout,
        config: &LoadConfig,
    ) -> DbcResult<Self> {
        let Preamble {
            header,
            records,
            record_size,
            pool_size,
            payload,
            ..
        } = preamble;

        let total = payload
            .checked_add(pool_size)
            .filter(|&total| u32::try_from(total).is_ok())
            .ok_or_else(|| DbcError::invalid_header("file exceeds 32-bit addressing"))?;

        if stream.is_seekable() {
            let remaining = stream.size()?.saturating_sub(stream.position()?);
            if remaining < total as u64 {
                return Err(DbcError::truncated(if remaining < payload as u64 {
                    "record data"
                } else {
                    "string pool"
                }));
            }
        }

        let mut buffer = BytesMut::zeroed(total);
        let mut pos = 0;
        while pos < total {
            let end = (pos + LOAD_CHUNK_SIZE).min(total);
            let context = if pos < payload { "record data" } else { "string pool" };
            read_exact(stream, &mut buffer[pos..end], context)?;
            pos = end;
        }

        let mut scan = IdScan::default();
        for record in buffer[..payload].chunks_exact(record_size) {
            scan.push(read_u32(record, 0))?;
        }

        let mut index = vec![None; scan.span()];
        if let Some((min_id, _)) = scan.range() {
            let string_offsets: Vec<usize> = layout.string_offsets().collect();
            for (i, record) in buffer[..payload].chunks_exact_mut(record_size).enumerate() {
                for &at in &string_offsets {
                    let offset = read_u32(record, at);
                    if offset as usize >= pool_size {
                        return Err(DbcError::StringOffsetOutOfBounds { offset, pool_size });
                    }
                    // fits: total was checked against u32 above
                    let absolute = (payload + offset as usize) as u32;
                    record[at..at + 4].copy_from_slice(&absolute.to_le_bytes());
                }
                let id = read_u32(record, 0);
                index[(id - min_id) as usize] = Some((i * record_size) as u32);
            }
        }

        let mut registry = ReleaseRegistry::new(config.tracker.clone());
        let data = registry.register(buffer.freeze())?;

        debug!(
            records,
            record_size,
            pool_size,
            range = ?scan.range(),
            "eager load complete"
        );

        Ok(Self {
            header,
            layout,
            registry,
            data: Some(data),
            index,
            range: scan.range(),
            records,
            mode: StringMode::from(config),
            closed: false,
        })
    }

    /// Returns the record with `id`, or `None` if the file has no such id.
    ///
    /// # Errors
    ///
    /// Returns [`DbcError::UseAfterTeardown`] after [`close`](Self::close).
    pub fn get(&self, id: u32) -> DbcResult<Option<RecordView<'_>>> {
        let buffer = self.buffer()?;
        let Some(at) = self.slot(id) else {
            return Ok(None);
        };
        let size = self.layout.size();
        Ok(Some(RecordView::new(
            &buffer[at..at + size],
            &self.layout,
            StringSource::Buffer(buffer),
            self.mode,
        )))
    }

    /// Returns whether a record with `id` exists.
    ///
    /// # Errors
    ///
    /// Returns [`DbcError::UseAfterTeardown`] after [`close`](Self::close).
    pub fn contains(&self, id: u32) -> DbcResult<bool> {
        self.ensure_open()?;
        Ok(self.slot(id).is_some())
    }

    /// Iterates over the ids present in the file, ascending.
    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        let min_id = self.range.map_or(0, |(min, _)| min);
        self.index
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(move |(i, _)| min_id + i as u32)
    }

    /// The file header.
    #[must_use]
    pub fn header(&self) -> &DbcHeader {
        &self.header
    }

    /// The fixed layout records are read with.
    #[must_use]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Number of records in the file.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records
    }

    /// Size of one record in bytes.
    #[must_use]
    pub fn record_size(&self) -> usize {
        self.layout.size()
    }

    /// Smallest id, or `None` for an empty file.
    #[must_use]
    pub fn min_id(&self) -> Option<u32> {
        self.range.map(|(min, _)| min)
    }

    /// Largest id, or `None` for an empty file.
    #[must_use]
    pub fn max_id(&self) -> Option<u32> {
        self.range.map(|(_, max)| max)
    }

    /// Number of buffers the store still owns.
    #[must_use]
    pub fn live_allocations(&self) -> usize {
        self.registry.live_allocations()
    }

    /// Returns whether the store has been torn down.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Releases the buffer. Every view obtained earlier is gone by now (the
    /// borrow checker guarantees it); later lookups fail with
    /// [`DbcError::UseAfterTeardown`]. Closing twice is a no-op.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        let released = self.registry.release_all();
        self.data = None;
        self.index = Vec::new();
        self.closed = true;
        debug!(released, "eager store closed");
    }

    fn ensure_open(&self) -> DbcResult<()> {
        if self.closed {
            return Err(DbcError::UseAfterTeardown);
        }
        Ok(())
    }

    fn buffer(&self) -> DbcResult<&Bytes> {
        self.ensure_open()?;
        self.data
            .and_then(|address| self.registry.get(address))
            .ok_or(DbcError::UseAfterTeardown)
    }

    fn slot(&self, id: u32) -> Option<usize> {
        let (min_id, max_id) = self.range?;
        if id < min_id || id > max_id {
            return None;
        }
        self.index[(id - min_id) as usize].map(|at| at as usize)
    }
}

pub(crate) fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::{sample_file, FileImage};
    use crate::AllocationTracker;
    use dbc_storage::InMemoryStream;

    fn load(bytes: Vec<u8>, format: &str) -> DbcResult<EagerStore> {
        let mut stream = InMemoryStream::new(bytes);
        EagerStore::load(
            &mut stream,
            &Layout::from_format(format).unwrap(),
            &LoadConfig::default(),
        )
    }

    #[test]
    fn sample_file_lookup() {
        let store = load(sample_file(), "nis").unwrap();
        assert_eq!(store.record_count(), 2);
        assert_eq!(store.min_id(), Some(1));
        assert_eq!(store.max_id(), Some(5));

        let one = store.get(1).unwrap().unwrap();
        assert_eq!(one.id(), 1);
        assert_eq!(one.i32(1), Some(7));
        assert_eq!(one.string(2).unwrap(), "ab");

        let five = store.get(5).unwrap().unwrap();
        assert_eq!(five.i32(1), Some(9));
        assert_eq!(five.string_bytes(2).unwrap(), b"cd");

        assert!(store.get(3).unwrap().is_none());
        assert!(store.get(0).unwrap().is_none());
        assert!(store.get(6).unwrap().is_none());
        assert!(store.contains(5).unwrap());
        assert!(!store.contains(2).unwrap());
        assert_eq!(store.ids().collect::<Vec<_>>(), vec![1, 5]);
    }

    #[test]
    fn duplicate_ids_rejected() {
        let bytes = FileImage::new("ni").record(&[3, 1]).record(&[3, 2]).build();
        assert!(matches!(
            load(bytes, "ni"),
            Err(DbcError::OrderingViolation { id: 3, .. })
        ));
    }

    #[test]
    fn descending_ids_rejected() {
        let bytes = FileImage::new("ni").record(&[4, 1]).record(&[2, 2]).build();
        assert!(matches!(
            load(bytes, "ni"),
            Err(DbcError::OrderingViolation {
                previous: 4,
                id: 2,
                ..
            })
        ));
    }

    #[test]
    fn short_payload_is_truncated() {
        let mut bytes = sample_file();
        bytes.truncate(bytes.len() - 8);
        assert!(matches!(
            load(bytes, "nis"),
            Err(DbcError::TruncatedInput { .. })
        ));
    }

    #[test]
    fn oversized_header_rejected_before_reading() {
        let mut bytes = DbcHeader::new(1, 1, 4, 0x7000_0000).encode().to_vec();
        bytes.extend_from_slice(&1u32.to_le_bytes());
        let mut stream = InMemoryStream::new(bytes);
        let result = EagerStore::load(
            &mut stream,
            &Layout::from_format("n").unwrap(),
            &LoadConfig::default(),
        );
        assert!(matches!(result, Err(DbcError::TruncatedInput { .. })));
        // only the header was consumed
        assert_eq!(stream.position().unwrap(), 20);
    }

    #[test]
    fn string_offset_outside_pool() {
        let bytes = FileImage::new("ns")
            .record(&[1, 50])
            .pool(b"a\0")
            .build();
        assert!(matches!(
            load(bytes, "ns"),
            Err(DbcError::StringOffsetOutOfBounds {
                offset: 50,
                pool_size: 2
            })
        ));
    }

    #[test]
    fn empty_file() {
        let bytes = FileImage::new("ni").build();
        let store = load(bytes, "ni").unwrap();
        assert_eq!(store.record_count(), 0);
        assert_eq!(store.min_id(), None);
        assert!(store.get(1).unwrap().is_none());
    }

    #[test]
    fn close_is_idempotent_and_blocks_lookups() {
        let tracker = AllocationTracker::new();
        let mut stream = InMemoryStream::new(sample_file());
        let mut store = EagerStore::load(
            &mut stream,
            &Layout::from_format("nis").unwrap(),
            &LoadConfig::new().tracker(tracker.clone()),
        )
        .unwrap();
        assert_eq!(tracker.live_allocations(), 1);
        assert_eq!(store.live_allocations(), 1);

        store.close();
        store.close();
        assert!(store.is_closed());
        assert_eq!(tracker.live_allocations(), 0);
        assert!(matches!(store.get(1), Err(DbcError::UseAfterTeardown)));
        assert!(matches!(store.contains(1), Err(DbcError::UseAfterTeardown)));
    }

    #[test]
    fn id_zero_is_addressable() {
        let bytes = FileImage::new("ni").record(&[0, 10]).record(&[2, 20]).build();
        let store = load(bytes, "ni").unwrap();
        assert_eq!(store.get(0).unwrap().unwrap().i32(1), Some(10));
        assert!(store.get(1).unwrap().is_none());
    }
}
