//! # DBC Storage
//!
//! Byte-stream capability consumed by the DBC record store.
//!
//! This crate provides the lowest-level I/O abstraction. Streams are
//! **opaque byte sources** - they do not interpret the data they carry.
//!
//! ## Design Principles
//!
//! - Streams are simple byte sources (read, seek, size, close)
//! - No knowledge of DBC headers, records or string pools
//! - Seekability is a capability the stream advertises, not an assumption
//! - `dbc_core` owns all file format interpretation
//!
//! ## Available Streams
//!
//! - [`InMemoryStream`] - For testing and buffers already in memory
//! - [`FileStream`] - For files opened through the OS
//! - [`ForwardOnlyStream`] - Adapter for pipes and other non-seekable readers
//!
//! ## Example
//!
//! ```rust
//! use dbc_storage::{ByteStream, InMemoryStream};
//!
//! let mut stream = InMemoryStream::new(b"hello world".to_vec());
//! stream.seek(6).unwrap();
//! let mut buf = [0u8; 5];
//! assert_eq!(stream.read_full(&mut buf).unwrap(), 5);
//! assert_eq!(&buf, b"world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod forward;
mod memory;
mod stream;

pub use error::{StorageError, StorageResult};
pub use file::FileStream;
pub use forward::ForwardOnlyStream;
pub use memory::InMemoryStream;
pub use stream::ByteStream;
