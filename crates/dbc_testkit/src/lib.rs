//! # DBC Testkit
//!
//! Test utilities for the DBC record store.
//!
//! This crate provides:
//! - [`DbcFileBuilder`] for well-formed and malformed DBC images
//! - [`CountingStream`] for asserting how much I/O a store performs
//! - Property-based test generators using proptest
//! - Fixtures shared by the integration tests and benchmarks
//!
//! ## Usage
//!
//! ```rust
//! use dbc_testkit::prelude::*;
//! use dbc_core::{DbcStorage, Layout, LoadConfig};
//! use dbc_storage::InMemoryStream;
//!
//! let bytes = DbcFileBuilder::new("nis")
//!     .record([Field::from(3u32), Field::from(-1i32), Field::from("three")])
//!     .build();
//! let layout = Layout::from_format("nis").unwrap();
//! let mut storage =
//!     DbcStorage::open(InMemoryStream::new(bytes), &layout, &LoadConfig::default()).unwrap();
//! assert_eq!(storage.get(3).unwrap().unwrap().string(2).unwrap(), "three");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod builder;
pub mod counting;
pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::builder::*;
    pub use crate::counting::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use builder::*;
pub use counting::*;
pub use fixtures::*;
pub use generators::*;
