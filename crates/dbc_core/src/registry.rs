//! Release registry for store-owned allocations.
//!
//! Every buffer a store allocates while loading or materializing records is
//! registered here and addressed by an [`Address`] handle. Teardown releases
//! each allocation exactly once, in any order; releasing twice is a no-op.

use crate::error::{DbcError, DbcResult};
use bytes::Bytes;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Handle to an allocation owned by a [`ReleaseRegistry`].
///
/// Addresses are always even and never zero, so they can share a word with
/// an odd-tagged file offset (see [`TaggedSlot`](crate::TaggedSlot)) and with
/// the all-zero "empty" marker.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(u32);

impl Address {
    /// Largest number of allocations a single registry can address.
    pub const MAX_ALLOCATIONS: usize = (u32::MAX >> 1) as usize;

    /// Reinterprets a raw word as an address.
    ///
    /// Returns `None` for zero or odd words.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Option<Self> {
        if raw == 0 || raw & 1 != 0 {
            None
        } else {
            Some(Self(raw))
        }
    }

    /// Returns the raw word.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    fn from_index(index: usize) -> Option<Self> {
        let handle = u32::try_from(index.checked_add(1)?).ok()?;
        handle.checked_mul(2).map(Self)
    }

    fn index(self) -> usize {
        (self.0 >> 1) as usize - 1
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({:#x})", self.0)
    }
}

#[derive(Debug, Default)]
struct TrackerCounters {
    live_allocations: AtomicUsize,
    live_bytes: AtomicUsize,
    total_allocations: AtomicUsize,
}

/// Shared counters observing registry allocations.
///
/// Hand a clone to [`LoadConfig::tracker`](crate::LoadConfig::tracker) and
/// inspect it after the store is gone to verify that nothing leaked.
#[derive(Debug, Clone, Default)]
pub struct AllocationTracker {
    counters: Arc<TrackerCounters>,
}

impl AllocationTracker {
    /// Creates a tracker with all counters at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of allocations registered and not yet released.
    #[must_use]
    pub fn live_allocations(&self) -> usize {
        self.counters.live_allocations.load(Ordering::Acquire)
    }

    /// Bytes held by allocations not yet released.
    #[must_use]
    pub fn live_bytes(&self) -> usize {
        self.counters.live_bytes.load(Ordering::Acquire)
    }

    /// Number of allocations ever registered.
    #[must_use]
    pub fn total_allocations(&self) -> usize {
        self.counters.total_allocations.load(Ordering::Acquire)
    }

    fn allocated(&self, len: usize) {
        self.counters.live_allocations.fetch_add(1, Ordering::AcqRel);
        self.counters.live_bytes.fetch_add(len, Ordering::AcqRel);
        self.counters.total_allocations.fetch_add(1, Ordering::AcqRel);
    }

    fn released(&self, len: usize) {
        self.counters.live_allocations.fetch_sub(1, Ordering::AcqRel);
        self.counters.live_bytes.fetch_sub(len, Ordering::AcqRel);
    }
}

/// Owns every buffer allocated on behalf of one store.
///
/// Buffers are stored as [`Bytes`] so record views and pending lazy strings
/// can share them without copying. Releasing drops the registry's reference;
/// memory still shared with a caller-held [`LazyString`](crate::LazyString)
/// is reclaimed when that value is dropped.
#[derive(Debug, Default)]
pub struct ReleaseRegistry {
    allocations: Vec<Option<Bytes>>,
    live: usize,
    tracker: Option<AllocationTracker>,
}

impl ReleaseRegistry {
    /// Creates an empty registry reporting to `tracker`, if any.
    #[must_use]
    pub fn new(tracker: Option<AllocationTracker>) -> Self {
        Self {
            allocations: Vec::new(),
            live: 0,
            tracker,
        }
    }

    /// Takes ownership of `buffer` and returns its address.
    ///
    /// # Errors
    ///
    /// Returns [`DbcError::OffsetOverflow`] once the registry holds
    /// [`Address::MAX_ALLOCATIONS`] buffers.
    pub fn register(&mut self, buffer: Bytes) -> DbcResult<Address> {
        let index = self.allocations.len();
        let address = Address::from_index(index).ok_or(DbcError::OffsetOverflow {
            offset: index as u64,
        })?;

        if let Some(tracker) = &self.tracker {
            tracker.allocated(buffer.len());
        }
        self.allocations.push(Some(buffer));
        self.live += 1;
        Ok(address)
    }

    /// Checks that `count` more buffers can be registered.
    ///
    /// # Errors
    ///
    /// Returns [`DbcError::OffsetOverflow`] if the last of them would not be
    /// addressable.
    pub fn reserve(&self, count: usize) -> DbcResult<()> {
        let Some(last) = (self.allocations.len() + count).checked_sub(1) else {
            return Ok(());
        };
        match Address::from_index(last) {
            Some(_) => Ok(()),
            None => Err(DbcError::OffsetOverflow {
                offset: last as u64,
            }),
        }
    }

    /// Returns the buffer at `address`, or `None` if it was released or
    /// never registered here.
    #[must_use]
    pub fn get(&self, address: Address) -> Option<&Bytes> {
        self.allocations.get(address.index())?.as_ref()
    }

    /// Number of registered buffers not yet released.
    #[must_use]
    pub fn live_allocations(&self) -> usize {
        self.live
    }

    /// Total bytes held by live buffers.
    #[must_use]
    pub fn live_bytes(&self) -> usize {
        self.allocations.iter().flatten().map(Bytes::len).sum()
    }

    /// Releases every outstanding buffer exactly once.
    ///
    /// Returns how many buffers were released by this call; a second call
    /// returns `0`.
    pub fn release_all(&mut self) -> usize {
        let mut released = 0;
        for slot in &mut self.allocations {
            if let Some(buffer) = slot.take() {
                if let Some(tracker) = &self.tracker {
                    tracker.released(buffer.len());
                }
                released += 1;
            }
        }
        self.allocations.clear();
        self.live = 0;
        released
    }
}

impl Drop for ReleaseRegistry {
    fn drop(&mut self) {
        self.release_all();
    }
}
