//! Benchmark support for the DBC record store.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod utils;
