//! Streaming loading: index on load, materialize on first access.

use crate::config::LoadConfig;
use crate::error::{DbcError, DbcResult};
use crate::header::DbcHeader;
use crate::layout::Layout;
use crate::plan::StringMode;
use crate::record::{RecordView, StringSource};
use crate::registry::{Address, ReleaseRegistry};
use crate::slot::{SlotState, TaggedSlot};
use crate::store::eager::read_u32;
use crate::store::io::{read_c_string, read_exact, release_stream, IdScan, Preamble};
use bytes::Bytes;
use dbc_storage::ByteStream;
use tracing::{debug, trace};

/// A record store that reads records from its stream on first access.
///
/// Loading makes two passes over the id column: the first checks ordering
/// and finds the id range, the second stores each record's file offset in a
/// [`TaggedSlot`]. A lookup of an unresolved slot reads the record and each
/// of its strings, registers the buffers for release and resolves the slot;
/// later lookups of the same id do no I/O.
///
/// The store keeps the stream until [`close`](Self::close). When the stream
/// is owned ([`LoadConfig::own_stream`]) it is closed there as well; a
/// borrowed stream (pass `&mut stream`) is only returned to the position
/// `load` found it at.
#[derive(Debug)]
pub struct StreamingStore<S: ByteStream> {
    stream: Option<S>,
    own_stream: bool,
    header: DbcHeader,
    layout: Layout,
    registry: ReleaseRegistry,
    slots: Vec<TaggedSlot>,
    range: Option<(u32, u32)>,
    records: usize,
    pool_position: u64,
    pool_size: usize,
    mode: StringMode,
    closed: bool,
}

impl<S: ByteStream> StreamingStore<S> {
    /// Indexes the DBC file starting at the current position of `stream`.
    ///
    /// On failure an owned stream is closed before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`DbcError::NotSeekable`] for a forward-only stream, and the
    /// usual header, truncation and ordering errors.
    pub fn load(mut stream: S, layout: &Layout, config: &LoadConfig) -> DbcResult<Self> {
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
        Self::from_preamble(stream, preamble, layout, config)
    }

    pub(crate) fn from_preamble(
        mut stream: S,
        preamble: Preamble,
        layout: Layout,
        config: &LoadConfig,
    ) -> DbcResult<Self> {
        let (slots, range, pool_position) =
            match build_index(&mut stream, &preamble, config.own_stream) {
                Ok(index) => index,
                Err(error) => {
                    release_stream(&mut stream, config.own_stream);
                    return Err(error);
                }
            };

        debug!(
            records = preamble.records,
            record_size = preamble.record_size,
            slots = slots.len(),
            range = ?range,
            "streaming index built"
        );

        Ok(Self {
            stream: Some(stream),
            own_stream: config.own_stream,
            header: preamble.header,
            layout,
            registry: ReleaseRegistry::new(config.tracker.clone()),
            slots,
            range,
            records: preamble.records,
            pool_position,
            pool_size: preamble.pool_size,
            mode: StringMode::from(config),
            closed: false,
        })
    }

    /// Returns the record with `id`, reading it from the stream on first
    /// access.
    ///
    /// # Errors
    ///
    /// Returns [`DbcError::UseAfterTeardown`] after [`close`](Self::close),
    /// or a read error if materialization fails.
    pub fn get(&mut self, id: u32) -> DbcResult<Option<RecordView<'_>>> {
        self.ensure_open()?;
        let Some(index) = self.slot_index(id) else {
            return Ok(None);
        };

        let address = match self.slots[index].state() {
            SlotState::Empty => return Ok(None),
            SlotState::Resolved(address) => address,
            SlotState::Unresolved(offset) => {
                let address = self.materialize(offset)?;
                self.slots[index] = TaggedSlot::from_address(address);
                address
            }
        };

        let bytes = self
            .registry
            .get(address)
            .ok_or(DbcError::UseAfterTeardown)?;
        Ok(Some(RecordView::new(
            bytes,
            &self.layout,
            StringSource::Registry(&self.registry),
            self.mode,
        )))
    }

    /// Returns whether a record with `id` exists. Never touches the stream.
    ///
    /// # Errors
    ///
    /// Returns [`DbcError::UseAfterTeardown`] after [`close`](Self::close).
    pub fn contains(&self, id: u32) -> DbcResult<bool> {
        self.ensure_open()?;
        Ok(self
            .slot_index(id)
            .is_some_and(|index| !self.slots[index].is_empty()))
    }

    /// Iterates over the ids present in the file, ascending.
    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        let min_id = self.range.map_or(0, |(min, _)| min);
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| !slot.is_empty())
            .map(move |(i, _)| min_id + i as u32)
    }

    /// The index slot for `id`, or `None` outside the id range.
    #[must_use]
    pub fn slot(&self, id: u32) -> Option<TaggedSlot> {
        self.slot_index(id).map(|index| self.slots[index])
    }

    /// Number of records materialized so far.
    #[must_use]
    pub fn resolved_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_resolved()).count()
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

    /// Number of record and string buffers the store currently owns.
    #[must_use]
    pub fn live_allocations(&self) -> usize {
        self.registry.live_allocations()
    }

    /// Returns whether the store has been torn down.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Releases every materialized buffer and gives up the stream, closing
    /// it if owned. Closing twice is a no-op.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let released = self.registry.release_all();
        self.slots = Vec::new();
        if let Some(mut stream) = self.stream.take() {
            release_stream(&mut stream, self.own_stream);
        }
        debug!(released, "streaming store closed");
    }

    fn ensure_open(&self) -> DbcResult<()> {
        if self.closed {
            return Err(DbcError::UseAfterTeardown);
        }
        Ok(())
    }

    fn slot_index(&self, id: u32) -> Option<usize> {
        let (min_id, max_id) = self.range?;
        if id < min_id || id > max_id {
            return None;
        }
        Some((id - min_id) as usize)
    }

    fn materialize(&mut self, offset: u32) -> DbcResult<Address> {
        let stream = self.stream.as_mut().ok_or(DbcError::UseAfterTeardown)?;

        let mut record = vec![0u8; self.layout.size()];
        stream.seek(u64::from(offset))?;
        read_exact(stream, &mut record, "record")?;

        // Nothing is registered until every string has been read.
        let mut strings = Vec::new();
        for at in self.layout.string_offsets() {
            let pool_offset = read_u32(&record, at) as usize;
            if pool_offset >= self.pool_size {
                return Err(DbcError::StringOffsetOutOfBounds {
                    offset: pool_offset as u32,
                    pool_size: self.pool_size,
                });
            }
            stream.seek(self.pool_position + pool_offset as u64)?;
            let string = read_c_string(stream, self.pool_size - pool_offset)?;
            strings.push((at, Bytes::from(string)));
        }

        self.registry.reserve(strings.len() + 1)?;
        let count = strings.len();
        for (at, string) in strings {
            let address = self.registry.register(string)?;
            record[at..at + 4].copy_from_slice(&address.as_u32().to_le_bytes());
        }

        let address = self.registry.register(Bytes::from(record))?;
        trace!(offset, strings = count, ?address, "materialized record");
        Ok(address)
    }
}

impl<S: ByteStream> Drop for StreamingStore<S> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Both index passes. Returns the slots, the id range and the absolute
/// position of the string pool.
///
/// A borrowed stream is returned to where the header started, whether or
/// not indexing succeeds.
fn build_index<S: ByteStream + ?Sized>(
    stream: &mut S,
    preamble: &Preamble,
    own_stream: bool,
) -> DbcResult<(Vec<TaggedSlot>, Option<(u32, u32)>, u64)> {
    if !stream.is_seekable() {
        return Err(DbcError::NotSeekable);
    }

    let index = scan_index(stream, preamble);
    if !own_stream {
        let restored = stream.seek(preamble.start);
        let index = index?;
        restored?;
        return Ok(index);
    }
    index
}

fn scan_index<S: ByteStream + ?Sized>(
    stream: &mut S,
    preamble: &Preamble,
) -> DbcResult<(Vec<TaggedSlot>, Option<(u32, u32)>, u64)> {
    let record_size = preamble.record_size as u64;
    let data_start = stream.position()?;
    let pool_position = data_start + preamble.payload as u64;

    let available = stream.size()?;
    if available < pool_position + preamble.pool_size as u64 {
        return Err(DbcError::truncated(if available < pool_position {
            "record data"
        } else {
            "string pool"
        }));
    }

    let mut scan = IdScan::default();
    let mut id = [0u8; 4];
    for _ in 0..preamble.records {
        read_exact(stream, &mut id, "record id")?;
        scan.push(u32::from_le_bytes(id))?;
        stream.skip(record_size - 4)?;
    }

    let mut slots = vec![TaggedSlot::EMPTY; scan.span()];
    if let Some((min_id, _)) = scan.range() {
        stream.seek(data_start)?;
        for index in 0..preamble.records {
            let position = data_start + index as u64 * record_size;
            read_exact(stream, &mut id, "record id")?;
            let id = u32::from_le_bytes(id);
            let slot = id
                .checked_sub(min_id)
                .and_then(|at| slots.get_mut(at as usize))
                .ok_or_else(|| {
                    DbcError::invalid_header(format!("id {id} changed between index passes"))
                })?;
            *slot = TaggedSlot::from_offset(position)?;
            stream.skip(record_size - 4)?;
        }
    }

    Ok((slots, scan.range(), pool_position))
}
