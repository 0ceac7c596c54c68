//! # DBC Core
//!
//! Record-store engine for DBC files: a fixed header, an array of
//! fixed-width records keyed by a leading `u32` id, and a trailing pool of
//! null-terminated strings.
//!
//! This crate provides:
//! - [`Layout`] descriptors for the record shape
//! - [`FieldPlan`]s that decode records into typed values, validated once
//! - [`DbcStorage`], which loads a file eagerly ([`EagerStore`]) or indexes
//!   it and reads records on demand ([`StreamingStore`])
//! - [`TypedCollection`], an id-keyed dictionary of decoded records
//!
//! ## Example
//!
//! ```rust
//! use dbc_core::{DbcHeader, DbcStorage, Layout, LoadConfig};
//! use dbc_storage::InMemoryStream;
//!
//! # fn main() -> dbc_core::DbcResult<()> {
//! let mut bytes = DbcHeader::new(2, 3, 12, 6).encode().to_vec();
//! for word in [1u32, 7, 0, 5, 9, 3] {
//!     bytes.extend_from_slice(&word.to_le_bytes());
//! }
//! bytes.extend_from_slice(b"ab\0cd\0");
//!
//! let layout = Layout::from_format("nis")?;
//! let config = LoadConfig::new().complete_load(true);
//! let mut storage = DbcStorage::open(InMemoryStream::new(bytes), &layout, &config)?;
//!
//! let record = storage.get(5)?.expect("record 5");
//! assert_eq!(record.i32(1), Some(9));
//! assert_eq!(record.string(2)?, "cd");
//! assert!(storage.get(3)?.is_none());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod collection;
mod config;
mod error;
mod header;
mod layout;
mod lazy;
mod plan;
mod record;
mod registry;
mod slot;
mod store;

pub use collection::{DbcRecord, TypedCollection};
pub use config::LoadConfig;
pub use error::{DbcError, DbcResult};
pub use header::{DbcHeader, DBC_MAGIC, HEADER_SIZE};
pub use layout::{Layout, LayoutElement};
pub use lazy::{c_string_bytes, decode_c_string, LazyString};
pub use plan::{FieldKind, FieldPlan, FieldSetter, KindSpec, Schema, StringMode, TargetField};
pub use record::RecordView;
pub use registry::{Address, AllocationTracker, ReleaseRegistry};
pub use slot::{SlotState, TaggedSlot, MAX_SLOT_OFFSET};
pub use store::{DbcStorage, EagerStore, StreamingStore};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
