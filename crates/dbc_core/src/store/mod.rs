//! Record stores.
//!
//! [`DbcStorage`] is the front door: it reads the header once and picks a
//! loading strategy.
//!
//! | strategy | chosen when | `get` |
//! |---|---|---|
//! | [`EagerStore`] | `complete_load`, or the file has no records | no I/O |
//! | [`StreamingStore`] | otherwise | one record read (plus its strings) on first access |
//!
//! Both strategies resolve string references before handing out a
//! [`RecordView`], so views behave identically whichever one produced them.

mod eager;
mod io;
mod streaming;
#[cfg(test)]
pub(crate) mod test_support;

pub use eager::EagerStore;
pub use streaming::StreamingStore;

use crate::config::LoadConfig;
use crate::error::{DbcError, DbcResult};
use crate::header::DbcHeader;
use crate::layout::Layout;
use crate::plan::FieldPlan;
use crate::record::RecordView;
use dbc_storage::{ByteStream, FileStream};
use io::{release_stream, Preamble};
use std::path::Path;
use tracing::debug;

enum Backend<S: ByteStream> {
    Eager(EagerStore),
    Streaming(StreamingStore<S>),
}

/// A loaded DBC file.
///
/// ```
/// use dbc_core::{DbcStorage, Layout, LoadConfig};
/// use dbc_storage::InMemoryStream;
///
/// # fn main() -> dbc_core::DbcResult<()> {
/// let mut bytes = vec![0x57, 0x44, 0x42, 0x43]; // "WDBC"
/// for word in [1i32, 2, 8, 2] {
///     bytes.extend_from_slice(&word.to_le_bytes());
/// }
/// for word in [7u32, 0] {
///     bytes.extend_from_slice(&word.to_le_bytes());
/// }
/// bytes.extend_from_slice(b"x\0");
///
/// let layout = Layout::from_format("ns")?;
/// let mut storage = DbcStorage::open(InMemoryStream::new(bytes), &layout, &LoadConfig::default())?;
/// assert!(storage.is_streaming());
///
/// let record = storage.get(7)?.expect("record 7");
/// assert_eq!(record.string(1)?, "x");
/// storage.close();
/// # Ok(())
/// # }
/// ```
pub struct DbcStorage<S: ByteStream> {
    backend: Backend<S>,
}

impl<S: ByteStream> DbcStorage<S> {
    /// Loads the DBC file at the current position of `stream`.
    ///
    /// The layout is copied and fixed. With [`LoadConfig::own_stream`] the
    /// stream is closed after an eager load, on any load error, and on
    /// teardown of a streaming store.
    ///
    /// # Errors
    ///
    /// Returns the first format, ordering or I/O error encountered. Nothing
    /// allocated during the failed load stays alive.
    pub fn open(mut stream: S, layout: &Layout, config: &LoadConfig) -> DbcResult<Self> {
        let layout = layout.clone().fixed();
        let preamble = match layout
            .ensure_keyed()
            .and_then(|()| Preamble::read(&mut stream, &layout, config))
        {
            Ok(preamble) => preamble,
            Err(error) => {
                release_stream(&mut stream, config.own_stream);
                return Err(error);
            }
        };

        let backend = if config.complete_load || preamble.records == 0 {
            debug!(
                records = preamble.records,
                complete_load = config.complete_load,
                "loading eagerly"
            );
            let result = EagerStore::from_preamble(&mut stream, preamble, layout, config);
            release_stream(&mut stream, config.own_stream);
            Backend::Eager(result?)
        } else {
            debug!(records = preamble.records, "loading in streaming mode");
            Backend::Streaming(StreamingStore::from_preamble(
                stream, preamble, layout, config,
            )?)
        };

        Ok(Self { backend })
    }

    /// Returns the record with `id`, or `None` if the file has no such id.
    ///
    /// # Errors
    ///
    /// Returns [`DbcError::UseAfterTeardown`] after [`close`](Self::close),
    /// or a read error if a streaming record cannot be materialized.
    pub fn get(&mut self, id: u32) -> DbcResult<Option<RecordView<'_>>> {
        match &mut self.backend {
            Backend::Eager(store) => store.get(id),
            Backend::Streaming(store) => store.get(id),
        }
    }

    /// Looks up `id` and decodes it with `plan`.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get), plus decode errors from the plan.
    pub fn get_record<T: Default>(&mut self, id: u32, plan: &FieldPlan<T>) -> DbcResult<Option<T>> {
        self.get(id)?.map(|view| view.decode(plan)).transpose()
    }

    /// Returns whether a record with `id` exists. Never reads the stream.
    ///
    /// # Errors
    ///
    /// Returns [`DbcError::UseAfterTeardown`] after [`close`](Self::close).
    pub fn contains(&self, id: u32) -> DbcResult<bool> {
        match &self.backend {
            Backend::Eager(store) => store.contains(id),
            Backend::Streaming(store) => store.contains(id),
        }
    }

    /// Ids present in the file, ascending.
    ///
    /// # Errors
    ///
    /// Returns [`DbcError::UseAfterTeardown`] after [`close`](Self::close).
    pub fn ids(&self) -> DbcResult<Vec<u32>> {
        if self.is_closed() {
            return Err(DbcError::UseAfterTeardown);
        }
        Ok(match &self.backend {
            Backend::Eager(store) => store.ids().collect(),
            Backend::Streaming(store) => store.ids().collect(),
        })
    }

    /// The file header.
    #[must_use]
    pub fn header(&self) -> &DbcHeader {
        match &self.backend {
            Backend::Eager(store) => store.header(),
            Backend::Streaming(store) => store.header(),
        }
    }

    /// The fixed layout records are read with.
    #[must_use]
    pub fn layout(&self) -> &Layout {
        match &self.backend {
            Backend::Eager(store) => store.layout(),
            Backend::Streaming(store) => store.layout(),
        }
    }

    /// Number of records in the file.
    #[must_use]
    pub fn record_count(&self) -> usize {
        match &self.backend {
            Backend::Eager(store) => store.record_count(),
            Backend::Streaming(store) => store.record_count(),
        }
    }

    /// Size of one record in bytes.
    #[must_use]
    pub fn record_size(&self) -> usize {
        self.layout().size()
    }

    /// Smallest id, or `None` for an empty file.
    #[must_use]
    pub fn min_id(&self) -> Option<u32> {
        match &self.backend {
            Backend::Eager(store) => store.min_id(),
            Backend::Streaming(store) => store.min_id(),
        }
    }

    /// Largest id, or `None` for an empty file.
    #[must_use]
    pub fn max_id(&self) -> Option<u32> {
        match &self.backend {
            Backend::Eager(store) => store.max_id(),
            Backend::Streaming(store) => store.max_id(),
        }
    }

    /// Returns whether records are read on demand.
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        matches!(self.backend, Backend::Streaming(_))
    }

    /// Number of buffers the store currently owns.
    #[must_use]
    pub fn live_allocations(&self) -> usize {
        match &self.backend {
            Backend::Eager(store) => store.live_allocations(),
            Backend::Streaming(store) => store.live_allocations(),
        }
    }

    /// Returns whether the store has been torn down.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        match &self.backend {
            Backend::Eager(store) => store.is_closed(),
            Backend::Streaming(store) => store.is_closed(),
        }
    }

    /// Tears the store down: every buffer is released exactly once and an
    /// owned stream is closed. Later calls return
    /// [`DbcError::UseAfterTeardown`]; closing twice is a no-op.
    pub fn close(&mut self) {
        match &mut self.backend {
            Backend::Eager(store) => store.close(),
            Backend::Streaming(store) => store.close(),
        }
    }
}

impl DbcStorage<FileStream> {
    /// Opens the file at `path` and loads it. The store always owns the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or loaded.
    pub fn open_file(path: &Path, layout: &Layout, config: &LoadConfig) -> DbcResult<Self> {
        let stream = FileStream::open(path)?;
        let config = config.clone().own_stream(true);
        Self::open(stream, layout, &config)
    }
}

impl<S: ByteStream> std::fmt::Debug for DbcStorage<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbcStorage")
            .field("streaming", &self.is_streaming())
            .field("records", &self.record_count())
            .field("layout", self.layout())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::Schema;
    use crate::AllocationTracker;
    use dbc_storage::InMemoryStream;
    use super::test_support::{sample_file, FileImage};

    #[derive(Debug, Default, PartialEq)]
    struct Row {
        id: u32,
        value: i32,
        name: String,
    }

    fn plan() -> FieldPlan<Row> {
        let schema = Schema::new()
            .uint32("id", |r: &mut Row, v| r.id = v)
            .int32("value", |r: &mut Row, v| r.value = v)
            .string("name", |r: &mut Row, v| r.name = v);
        FieldPlan::new(&Layout::from_format("nis").unwrap(), schema).unwrap()
    }

    fn open(config: &LoadConfig) -> DbcStorage<InMemoryStream> {
        DbcStorage::open(
            InMemoryStream::new(sample_file()),
            &Layout::from_format("nis").unwrap(),
            config,
        )
        .unwrap()
    }

    #[test]
    fn mode_selection() {
        assert!(open(&LoadConfig::default()).is_streaming());
        assert!(!open(&LoadConfig::new().complete_load(true)).is_streaming());

        let empty = FileImage::new("nis").build();
        let storage = DbcStorage::open(
            InMemoryStream::new(empty),
            &Layout::from_format("nis").unwrap(),
            &LoadConfig::default(),
        )
        .unwrap();
        assert!(!storage.is_streaming());
        assert_eq!(storage.min_id(), None);
        assert_eq!(storage.max_id(), None);
    }

    #[test]
    fn both_modes_decode_the_same_records() {
        let plan = plan();
        for config in [LoadConfig::default(), LoadConfig::new().complete_load(true)] {
            let mut storage = open(&config);
            assert_eq!(
                storage.get_record(1, &plan).unwrap(),
                Some(Row {
                    id: 1,
                    value: 7,
                    name: "ab".into()
                })
            );
            assert_eq!(
                storage.get_record(5, &plan).unwrap(),
                Some(Row {
                    id: 5,
                    value: 9,
                    name: "cd".into()
                })
            );
            assert_eq!(storage.get_record(3, &plan).unwrap(), None);
            assert_eq!(storage.ids().unwrap(), vec![1, 5]);
        }
    }

    #[test]
    fn layout_is_fixed_copy() {
        let mut layout = Layout::from_format("nis").unwrap();
        let storage = DbcStorage::open(
            InMemoryStream::new(sample_file()),
            &layout,
            &LoadConfig::default(),
        )
        .unwrap();
        assert!(storage.layout().is_fixed());
        assert!(!layout.is_fixed());
        layout.add_field(crate::LayoutElement::FixedWord).unwrap();
        assert_eq!(storage.record_size(), 12);
    }

    #[test]
    fn eager_load_closes_owned_stream() {
        let mut stream = InMemoryStream::new(sample_file());
        let config = LoadConfig::new().complete_load(true).own_stream(true);
        let mut storage =
            DbcStorage::open(&mut stream, &Layout::from_format("nis").unwrap(), &config).unwrap();
        assert!(storage.get(1).unwrap().is_some());
        drop(storage);
        assert!(stream.is_closed());
    }

    #[test]
    fn failed_load_releases_everything() {
        let tracker = AllocationTracker::new();
        let mut stream = InMemoryStream::new(sample_file());
        let config = LoadConfig::new().own_stream(true).tracker(tracker.clone());
        let result = DbcStorage::open(&mut stream, &Layout::from_format("ni").unwrap(), &config);
        assert!(matches!(result, Err(DbcError::SizeMismatch { .. })));
        drop(result);
        assert_eq!(tracker.live_allocations(), 0);
        assert!(stream.is_closed());
    }

    #[test]
    fn teardown_then_use() {
        let mut storage = open(&LoadConfig::default());
        storage.get(1).unwrap();
        storage.close();
        storage.close();
        assert!(storage.is_closed());
        assert!(matches!(storage.get(1), Err(DbcError::UseAfterTeardown)));
        assert!(matches!(storage.contains(1), Err(DbcError::UseAfterTeardown)));
        assert!(matches!(storage.ids(), Err(DbcError::UseAfterTeardown)));
        assert_eq!(storage.live_allocations(), 0);
    }

    #[test]
    fn strings_end_at_pool_boundary_in_both_modes() {
        let layout = Layout::from_format("ns").unwrap();
        let unterminated = FileImage::new("ns")
            .record(&[1, 0])
            .record(&[2, 3])
            .pool(b"ab\0cd")
            .build();
        let mut trailing = unterminated.clone();
        trailing.extend_from_slice(b"XYZ\0");

        for bytes in [unterminated, trailing] {
            for config in [LoadConfig::default(), LoadConfig::new().complete_load(true)] {
                let mut storage =
                    DbcStorage::open(InMemoryStream::new(bytes.clone()), &layout, &config)
                        .unwrap();
                let record = storage.get(2).unwrap().unwrap();
                assert_eq!(record.string(1).unwrap(), "cd");
                assert_eq!(record.string_bytes(1).unwrap(), b"cd");
            }
        }
    }

    #[test]
    fn unkeyed_layout_rejected() {
        let result = DbcStorage::open(
            InMemoryStream::new(sample_file()),
            &Layout::from_format("sis").unwrap(),
            &LoadConfig::default(),
        );
        assert!(matches!(result, Err(DbcError::SchemaError { .. })));
    }
}
