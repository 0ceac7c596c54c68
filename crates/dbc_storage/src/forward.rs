//! Non-seekable stream adapter.

use crate::error::{StorageError, StorageResult};
use crate::stream::ByteStream;
use std::io::Read;

/// Wraps any [`Read`] as a forward-only [`ByteStream`].
///
/// Positions are tracked by counting consumed bytes. `seek`, `skip` and
/// `size` fail with [`StorageError::NotSeekable`], which makes this the
/// stream to use for pipes, sockets and decompressors.
#[derive(Debug)]
pub struct ForwardOnlyStream<R> {
    inner: Option<R>,
    pos: u64,
}

impl<R: Read> ForwardOnlyStream<R> {
    /// Wraps `inner`.
    pub fn new(inner: R) -> Self {
        Self {
            inner: Some(inner),
            pos: 0,
        }
    }

    /// Returns whether the stream has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }
}

impl<R: Read> ByteStream for ForwardOnlyStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> StorageResult<usize> {
        let inner = self.inner.as_mut().ok_or(StorageError::Closed)?;
        let read = inner.read(buf)?;
        self.pos += read as u64;
        Ok(read)
    }

    fn seek(&mut self, _pos: u64) -> StorageResult<u64> {
        Err(StorageError::NotSeekable)
    }

    fn position(&mut self) -> StorageResult<u64> {
        if self.inner.is_none() {
            return Err(StorageError::Closed);
        }
        Ok(self.pos)
    }

    fn size(&mut self) -> StorageResult<u64> {
        Err(StorageError::NotSeekable)
    }

    fn is_seekable(&self) -> bool {
        false
    }

    fn close(&mut self) -> StorageResult<()> {
        self.inner = None;
        Ok(())
    }
}
