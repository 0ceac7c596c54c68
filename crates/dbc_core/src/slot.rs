//! One-word index slot for the streaming store.
//!
//! ```text
//! 0                 empty (no record with this id)
//! xxxx...xxx0       resolved: registry address of the materialized record
//! oooo...ooo1       unresolved: 31-bit file offset, stored shifted left by one
//! ```

use crate::error::{DbcError, DbcResult};
use crate::registry::Address;
use std::fmt;

/// Largest file offset a slot can hold.
pub const MAX_SLOT_OFFSET: u64 = (1 << 31) - 1;

/// Decoded view of a [`TaggedSlot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// No record has this id.
    Empty,
    /// The record has been materialized at this address.
    Resolved(Address),
    /// The record starts at this stream offset and has not been read yet.
    Unresolved(u32),
}

/// A resolved address or an unresolved file offset packed into one `u32`.
///
/// The low bit discriminates: `0` for an address, `1` for an offset.
/// Addresses are even by construction, and offsets must fit in 31 bits.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct TaggedSlot(u32);

impl TaggedSlot {
    /// The empty slot.
    pub const EMPTY: Self = Self(0);

    /// Creates a resolved slot.
    #[must_use]
    pub const fn from_address(address: Address) -> Self {
        Self(address.as_u32())
    }

    /// Creates an unresolved slot holding `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`DbcError::OffsetOverflow`] if `offset` needs more than
    /// 31 bits.
    pub fn from_offset(offset: u64) -> DbcResult<Self> {
        if offset > MAX_SLOT_OFFSET {
            return Err(DbcError::OffsetOverflow { offset });
        }
        Ok(Self(((offset as u32) << 1) | 1))
    }

    /// Returns whether the slot holds nothing.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns whether the slot holds a materialized record.
    #[must_use]
    pub const fn is_resolved(self) -> bool {
        self.0 != 0 && self.0 & 1 == 0
    }

    /// Returns the address if the slot is resolved.
    #[must_use]
    pub const fn address(self) -> Option<Address> {
        Address::from_raw(self.0)
    }

    /// Returns the file offset if the slot is unresolved.
    #[must_use]
    pub const fn offset(self) -> Option<u32> {
        if self.0 & 1 == 1 {
            Some(self.0 >> 1)
        } else {
            None
        }
    }

    /// Decodes the slot.
    #[must_use]
    pub fn state(self) -> SlotState {
        if let Some(offset) = self.offset() {
            SlotState::Unresolved(offset)
        } else if let Some(address) = self.address() {
            SlotState::Resolved(address)
        } else {
            SlotState::Empty
        }
    }

    /// Returns the raw word.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for TaggedSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.state() {
            SlotState::Empty => write!(f, "TaggedSlot(empty)"),
            SlotState::Resolved(address) => write!(f, "TaggedSlot({address:?})"),
            SlotState::Unresolved(offset) => write!(f, "TaggedSlot(offset {offset:#x})"),
        }
    }
}
