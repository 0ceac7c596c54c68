//! In-memory byte stream for testing.

use crate::error::{StorageError, StorageResult};
use crate::stream::ByteStream;

/// An in-memory, seekable byte stream.
///
/// This stream serves bytes from an owned buffer and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Files that were already read into memory by the caller
///
/// # Example
///
/// ```rust
/// use dbc_storage::{ByteStream, InMemoryStream};
///
/// let mut stream = InMemoryStream::new(b"test data".to_vec());
/// assert_eq!(stream.size().unwrap(), 9);
/// assert_eq!(stream.position().unwrap(), 0);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStream {
    data: Vec<u8>,
    pos: u64,
    closed: bool,
}

impl InMemoryStream {
    /// Creates a stream positioned at the start of `data`.
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            pos: 0,
            closed: false,
        }
    }

    /// Returns the bytes behind the stream.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns whether [`ByteStream::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Consumes the stream and returns its buffer.
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    fn ensure_open(&self) -> StorageResult<()> {
        if self.closed {
            return Err(StorageError::Closed);
        }
        Ok(())
    }
}

impl ByteStream for InMemoryStream {
    fn read(&mut self, buf: &mut [u8]) -> StorageResult<usize> {
        self.ensure_open()?;
        let start = usize::try_from(self.pos).unwrap_or(usize::MAX);
        if start >= self.data.len() {
            return Ok(0);
        }
        let count = buf.len().min(self.data.len() - start);
        buf[..count].copy_from_slice(&self.data[start..start + count]);
        self.pos += count as u64;
        Ok(count)
    }

    fn seek(&mut self, pos: u64) -> StorageResult<u64> {
        self.ensure_open()?;
        let size = self.data.len() as u64;
        if pos > size {
            return Err(StorageError::ReadPastEnd {
                position: pos,
                size,
            });
        }
        self.pos = pos;
        Ok(pos)
    }

    fn position(&mut self) -> StorageResult<u64> {
        self.ensure_open()?;
        Ok(self.pos)
    }

    fn size(&mut self) -> StorageResult<u64> {
        self.ensure_open()?;
        Ok(self.data.len() as u64)
    }

    fn close(&mut self) -> StorageResult<()> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn memory_new_starts_at_zero() {
        let mut stream = InMemoryStream::new(b"abc".to_vec());
        assert_eq!(stream.position().unwrap(), 0);
        assert_eq!(stream.size().unwrap(), 3);
    }

    #[test]
    fn memory_read_advances_position() {
        let mut stream = InMemoryStream::new(b"hello world".to_vec());
        let mut buf = [0u8; 5];
        assert_eq!(stream.read(&mut buf).unwrap(), 5);
        assert_eq!(&buf, b"hello");
        assert_eq!(stream.position().unwrap(), 5);
    }

    #[test]
    fn memory_short_read_at_end() {
        let mut stream = InMemoryStream::new(b"hello".to_vec());
        stream.seek(3).unwrap();
        let mut buf = [0u8; 8];
        assert_eq!(stream.read_full(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"lo");
        assert_eq!(stream.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn memory_seek_past_end_fails() {
        let mut stream = InMemoryStream::new(b"hello".to_vec());
        assert!(matches!(
            stream.seek(6),
            Err(StorageError::ReadPastEnd { position: 6, size: 5 })
        ));
        assert!(stream.seek(5).is_ok());
    }

    #[test]
    fn memory_skip_moves_forward() {
        let mut stream = InMemoryStream::new(b"0123456789".to_vec());
        stream.skip(4).unwrap();
        let mut buf = [0u8; 2];
        stream.read_full(&mut buf).unwrap();
        assert_eq!(&buf, b"45");
    }

    #[test]
    fn memory_closed_rejects_reads() {
        let mut stream = InMemoryStream::new(b"hello".to_vec());
        stream.close().unwrap();
        assert!(stream.is_closed());
        let mut buf = [0u8; 1];
        assert!(matches!(stream.read(&mut buf), Err(StorageError::Closed)));
        // closing twice is fine
        assert!(stream.close().is_ok());
    }

    #[test]
    fn memory_borrowed_stream_shares_position() {
        fn advance<S: ByteStream>(mut stream: S) {
            stream.seek(2).unwrap();
        }

        let mut stream = InMemoryStream::new(b"hello".to_vec());
        advance(&mut stream);
        assert_eq!(stream.position().unwrap(), 2);
    }

    proptest! {
        #[test]
        fn memory_seek_then_read_matches_slice(
            data in prop::collection::vec(any::<u8>(), 0..256),
            pos in 0usize..256,
            len in 0usize..64,
        ) {
            let pos = pos.min(data.len());
            let mut stream = InMemoryStream::new(data.clone());
            stream.seek(pos as u64).unwrap();

            let mut buf = vec![0u8; len];
            let read = stream.read_full(&mut buf).unwrap();

            let expected = &data[pos..(pos + len).min(data.len())];
            prop_assert_eq!(&buf[..read], expected);
        }
    }
}
