//! Byte-stream trait definition.

use crate::error::{StorageError, StorageResult};

/// A byte source the DBC record store reads from.
///
/// Streams are **opaque byte sources**. They provide reading, positioning
/// and size queries. The record store owns all format interpretation -
/// streams do not understand headers, records or string pools.
///
/// # Invariants
///
/// - `read` returns `0` only at end of stream (or for an empty buffer)
/// - `seek` on a stream whose [`is_seekable`](Self::is_seekable) returns
///   `false` fails with [`StorageError::NotSeekable`]
/// - After `close`, every operation fails with [`StorageError::Closed`];
///   closing twice is a no-op
///
/// # Implementors
///
/// - [`super::InMemoryStream`] - For testing
/// - [`super::FileStream`] - For files
/// - [`super::ForwardOnlyStream`] - For non-seekable readers
pub trait ByteStream {
    /// Reads up to `buf.len()` bytes at the current position.
    ///
    /// Returns the number of bytes read, which may be fewer than requested.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is closed or an I/O error occurs.
    fn read(&mut self, buf: &mut [u8]) -> StorageResult<usize>;

    /// Moves the stream to the absolute position `pos`.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is not seekable, is closed, or the
    /// position cannot be reached.
    fn seek(&mut self, pos: u64) -> StorageResult<u64>;

    /// Returns the current absolute position.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is closed.
    fn position(&mut self) -> StorageResult<u64>;

    /// Returns the total size of the stream in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&mut self) -> StorageResult<u64>;

    /// Returns whether [`seek`](Self::seek) is supported.
    fn is_seekable(&self) -> bool {
        true
    }

    /// Closes the stream, releasing any OS resources.
    ///
    /// # Errors
    ///
    /// Returns an error if releasing the underlying resource fails.
    fn close(&mut self) -> StorageResult<()>;

    /// Reads until `buf` is full or the stream is exhausted.
    ///
    /// Returns the number of bytes read; a value smaller than `buf.len()`
    /// means the stream ended first.
    ///
    /// # Errors
    ///
    /// Returns an error if any underlying read fails.
    fn read_full(&mut self, buf: &mut [u8]) -> StorageResult<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            let read = self.read(&mut buf[filled..])?;
            if read == 0 {
                break;
            }
            filled += read;
        }
        Ok(filled)
    }

    /// Advances the position by `count` bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is not seekable or the seek fails.
    fn skip(&mut self, count: u64) -> StorageResult<u64> {
        if !self.is_seekable() {
            return Err(StorageError::NotSeekable);
        }
        let pos = self.position()?;
        self.seek(pos.saturating_add(count))
    }
}

impl<S: ByteStream + ?Sized> ByteStream for &mut S {
    fn read(&mut self, buf: &mut [u8]) -> StorageResult<usize> {
        (**self).read(buf)
    }

    fn seek(&mut self, pos: u64) -> StorageResult<u64> {
        (**self).seek(pos)
    }

    fn position(&mut self) -> StorageResult<u64> {
        (**self).position()
    }

    fn size(&mut self) -> StorageResult<u64> {
        (**self).size()
    }

    fn is_seekable(&self) -> bool {
        (**self).is_seekable()
    }

    fn close(&mut self) -> StorageResult<()> {
        (**self).close()
    }
}

impl<S: ByteStream + ?Sized> ByteStream for Box<S> {
    fn read(&mut self, buf: &mut [u8]) -> StorageResult<usize> {
        (**self).read(buf)
    }

    fn seek(&mut self, pos: u64) -> StorageResult<u64> {
        (**self).seek(pos)
    }

    fn position(&mut self) -> StorageResult<u64> {
        (**self).position()
    }

    fn size(&mut self) -> StorageResult<u64> {
        (**self).size()
    }

    fn is_seekable(&self) -> bool {
        (**self).is_seekable()
    }

    fn close(&mut self) -> StorageResult<()> {
        (**self).close()
    }
}
