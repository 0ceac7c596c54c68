//! Dense id-indexed collection of decoded records.

use crate::config::LoadConfig;
use crate::error::{DbcError, DbcResult};
use crate::plan::FieldPlan;
use crate::store::DbcStorage;
use dbc_storage::ByteStream;
use std::fmt;
use tracing::debug;

/// A record type that carries its own id.
pub trait DbcRecord: Default {
    /// The id stored in the record's first field.
    fn record_id(&self) -> u32;
}

/// A dictionary of records keyed by id.
///
/// Records live in one vector indexed by `id - min_id`, the same layout the
/// eager store uses. Adding an id outside the covered range grows the range
/// (reallocating and copying the existing slots); the range never shrinks,
/// even when records are removed.
///
/// Id `0` is reserved: every operation that takes an id rejects it with
/// [`DbcError::InvalidId`], and `contains(0)` is always `false`.
pub struct TypedCollection<T> {
    slots: Vec<Option<T>>,
    min_id: u32,
    len: usize,
}

impl<T: DbcRecord> TypedCollection<T> {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            min_id: 0,
            len: 0,
        }
    }

    /// Loads every record of a DBC file and decodes it with `plan`.
    ///
    /// The file is always loaded eagerly, whatever `config.complete_load`
    /// says. The collection does not keep the stream; with
    /// [`LoadConfig::own_stream`] it is closed once loading finishes.
    ///
    /// # Errors
    ///
    /// Returns any load error, a decode error from `plan`, or
    /// [`DbcError::InvalidId`] if the file uses id `0`.
    pub fn load<S: ByteStream>(
        stream: S,
        plan: &FieldPlan<T>,
        config: &LoadConfig,
    ) -> DbcResult<Self> {
        let config = config.clone().complete_load(true);
        let mut storage = DbcStorage::open(stream, plan.layout(), &config)?;

        let mut collection = Self::new();
        if let (Some(min_id), Some(max_id)) = (storage.min_id(), storage.max_id()) {
            if min_id == 0 {
                return Err(reserved_id());
            }
            collection.min_id = min_id;
            collection
                .slots
                .resize_with((max_id - min_id) as usize + 1, || None);
            for id in storage.ids()? {
                let record = storage
                    .get_record(id, plan)?
                    .ok_or(DbcError::NotFound { id })?;
                collection.slots[(id - min_id) as usize] = Some(record);
                collection.len += 1;
            }
        }
        storage.close();

        debug!(
            records = collection.len,
            span = collection.slots.len(),
            "typed collection loaded"
        );
        Ok(collection)
    }

    /// Returns whether a record with `id` is present.
    #[must_use]
    pub fn contains(&self, id: u32) -> bool {
        self.index(id)
            .is_some_and(|index| self.slots[index].is_some())
    }

    /// Returns the record with `id`.
    ///
    /// # Errors
    ///
    /// Returns [`DbcError::NotFound`] if absent, or
    /// [`DbcError::InvalidId`] for id `0`.
    pub fn get(&self, id: u32) -> DbcResult<&T> {
        check_id(id)?;
        self.index(id)
            .and_then(|index| self.slots[index].as_ref())
            .ok_or(DbcError::NotFound { id })
    }

    /// Returns the record with `id` for modification.
    ///
    /// Changing the record's own id through this reference breaks the
    /// collection's key invariant; use [`set`](Self::set) to re-key.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get).
    pub fn get_mut(&mut self, id: u32) -> DbcResult<&mut T> {
        check_id(id)?;
        match self.index(id) {
            Some(index) => self.slots[index]
                .as_mut()
                .ok_or(DbcError::NotFound { id }),
            None => Err(DbcError::NotFound { id }),
        }
    }

    /// Stores `record` under `id`, replacing and returning any previous
    /// record.
    ///
    /// # Errors
    ///
    /// Returns [`DbcError::InvalidId`] for id `0` or when
    /// `record.record_id() != id`.
    pub fn set(&mut self, id: u32, record: T) -> DbcResult<Option<T>> {
        check_id(id)?;
        check_matches(id, &record)?;
        let index = self.cover(id);
        let previous = self.slots[index].replace(record);
        if previous.is_none() {
            self.len += 1;
        }
        Ok(previous)
    }

    /// Adds `record` under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`DbcError::InvalidId`] for id `0`, when
    /// `record.record_id() != id`, or when `id` is already present.
    pub fn add(&mut self, id: u32, record: T) -> DbcResult<()> {
        check_id(id)?;
        check_matches(id, &record)?;
        if self.contains(id) {
            return Err(DbcError::invalid_id(id, "a record with this id already exists"));
        }
        let index = self.cover(id);
        self.slots[index] = Some(record);
        self.len += 1;
        Ok(())
    }

    /// Removes and returns the record with `id`, if present. The covered id
    /// range is kept.
    ///
    /// # Errors
    ///
    /// Returns [`DbcError::InvalidId`] for id `0`.
    pub fn remove(&mut self, id: u32) -> DbcResult<Option<T>> {
        check_id(id)?;
        let removed = self.index(id).and_then(|index| self.slots[index].take());
        if removed.is_some() {
            self.len -= 1;
        }
        Ok(removed)
    }

    /// Number of records present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns whether no record is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Lowest id of the covered range, or `None` if nothing was ever stored.
    #[must_use]
    pub fn min_id(&self) -> Option<u32> {
        (!self.slots.is_empty()).then_some(self.min_id)
    }

    /// Highest id of the covered range, or `None` if nothing was ever
    /// stored.
    #[must_use]
    pub fn max_id(&self) -> Option<u32> {
        (!self.slots.is_empty()).then(|| self.min_id + (self.slots.len() - 1) as u32)
    }

    /// Iterates over `(id, record)` pairs in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> + '_ {
        let min_id = self.min_id;
        self.slots
            .iter()
            .enumerate()
            .filter_map(move |(i, slot)| slot.as_ref().map(|record| (min_id + i as u32, record)))
    }

    fn index(&self, id: u32) -> Option<usize> {
        let offset = id.checked_sub(self.min_id)? as usize;
        (offset < self.slots.len()).then_some(offset)
    }

    /// Grows the covered range to include `id` and returns its slot index.
    fn cover(&mut self, id: u32) -> usize {
        if self.slots.is_empty() {
            self.min_id = id;
            self.slots.push(None);
            return 0;
        }
        if id < self.min_id {
            let prefix = (self.min_id - id) as usize;
            let mut grown = Vec::with_capacity(prefix + self.slots.len());
            grown.resize_with(prefix, || None);
            grown.append(&mut self.slots);
            self.slots = grown;
            self.min_id = id;
            return 0;
        }
        let index = (id - self.min_id) as usize;
        if index >= self.slots.len() {
            self.slots.resize_with(index + 1, || None);
        }
        index
    }
}

impl<T: DbcRecord> Default for TypedCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DbcRecord + fmt::Debug> fmt::Debug for TypedCollection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

fn reserved_id() -> DbcError {
    DbcError::invalid_id(0, "id 0 is reserved")
}

fn check_id(id: u32) -> DbcResult<()> {
    if id == 0 {
        return Err(reserved_id());
    }
    Ok(())
}

fn check_matches<T: DbcRecord>(id: u32, record: &T) -> DbcResult<()> {
    let own = record.record_id();
    if own != id {
        return Err(DbcError::invalid_id(
            id,
            format!("record carries id {own}"),
        ));
    }
    Ok(())
}
