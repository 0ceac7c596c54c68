//! Deferred C-string decoding.

use crate::error::{DbcError, DbcResult};
use bytes::Bytes;
use std::fmt;

#[derive(Clone)]
enum State {
    Loaded(String),
    Pending { pool: Bytes, offset: usize },
}

/// A string decoded from pool bytes on first read.
///
/// A lazy string is either already materialized or holds a shared reference
/// to a string pool plus the offset of a null-terminated run. Loading is
/// one-way: once decoded, the pool reference is dropped and the string stays.
///
/// # Example
///
/// ```rust
/// use bytes::Bytes;
/// use dbc_core::LazyString;
///
/// let mut name = LazyString::pending(Bytes::from_static(b"ab\0cd\0"), 3).unwrap();
/// assert!(!name.is_loaded());
/// assert_eq!(name.as_str(), "cd");
/// assert!(name.is_loaded());
/// ```
#[derive(Clone)]
pub struct LazyString {
    state: State,
}

impl LazyString {
    /// Creates a string that decodes `pool[offset..]` up to the first null
    /// byte when first read.
    ///
    /// # Errors
    ///
    /// Returns [`DbcError::StringOffsetOutOfBounds`] if `offset` is not
    /// inside `pool`.
    pub fn pending(pool: Bytes, offset: usize) -> DbcResult<Self> {
        if offset >= pool.len() {
            return Err(DbcError::StringOffsetOutOfBounds {
                offset: u32::try_from(offset).unwrap_or(u32::MAX),
                pool_size: pool.len(),
            });
        }
        Ok(Self {
            state: State::Pending { pool, offset },
        })
    }

    /// Returns whether the string has been decoded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        matches!(self.state, State::Loaded(_))
    }

    /// Decodes the string if it has not been decoded yet.
    pub fn load(&mut self) {
        if let State::Pending { pool, offset } = &self.state {
            let decoded = decode_c_string(&pool[*offset..]);
            self.state = State::Loaded(decoded);
        }
    }

    /// Returns the string, decoding it first if needed.
    pub fn as_str(&mut self) -> &str {
        self.load();
        match &self.state {
            State::Loaded(s) => s,
            State::Pending { .. } => unreachable!("load() always leaves the string decoded"),
        }
    }

    /// Consumes the value and returns the decoded string.
    #[must_use]
    pub fn into_string(mut self) -> String {
        self.load();
        match self.state {
            State::Loaded(s) => s,
            State::Pending { .. } => unreachable!("load() always leaves the string decoded"),
        }
    }
}

impl Default for LazyString {
    fn default() -> Self {
        Self::from(String::new())
    }
}

impl From<String> for LazyString {
    fn from(value: String) -> Self {
        Self {
            state: State::Loaded(value),
        }
    }
}

impl From<&str> for LazyString {
    fn from(value: &str) -> Self {
        Self::from(value.to_owned())
    }
}

impl fmt::Display for LazyString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            State::Loaded(s) => f.write_str(s),
            State::Pending { pool, offset } => f.write_str(&decode_c_string(&pool[*offset..])),
        }
    }
}

impl fmt::Debug for LazyString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            State::Loaded(s) => write!(f, "LazyString({s:?})"),
            State::Pending { offset, .. } => write!(f, "LazyString(pending @ {offset})"),
        }
    }
}

impl PartialEq for LazyString {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

/// Bytes of a null-terminated run, without the terminator.
///
/// A run without a terminator extends to the end of `bytes`.
#[must_use]
pub fn c_string_bytes(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    &bytes[..end]
}

/// Decodes a null-terminated run as UTF-8, replacing invalid sequences.
#[must_use]
pub fn decode_c_string(bytes: &[u8]) -> String {
    String::from_utf8_lossy(c_string_bytes(bytes)).into_owned()
}
