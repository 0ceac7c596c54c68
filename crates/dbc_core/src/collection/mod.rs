//! Typed, id-keyed record collections.

mod typed;

pub use typed::{DbcRecord, TypedCollection};
