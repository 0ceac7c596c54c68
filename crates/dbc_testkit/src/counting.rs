//! I/O-counting stream wrapper.

use dbc_storage::{ByteStream, StorageResult};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Counts kept by a [`CountingStream`].
///
/// The handle is shared, so a test can keep it after moving the stream
/// into a store.
#[derive(Debug, Clone, Default)]
pub struct IoCounters {
    reads: Arc<AtomicUsize>,
    bytes: Arc<AtomicU64>,
    seeks: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
}

/// A point-in-time copy of [`IoCounters`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IoSnapshot {
    /// Read calls that returned data.
    pub reads: usize,
    /// Bytes returned by reads.
    pub bytes: u64,
    /// Seek calls.
    pub seeks: usize,
    /// Close calls.
    pub closes: usize,
}

impl IoSnapshot {
    /// Returns whether no read or seek happened.
    pub fn is_idle(&self) -> bool {
        self.reads == 0 && self.seeks == 0
    }
}

impl std::ops::Sub for IoSnapshot {
    type Output = Self;

    fn sub(self, earlier: Self) -> Self {
        Self {
            reads: self.reads - earlier.reads,
            bytes: self.bytes - earlier.bytes,
            seeks: self.seeks - earlier.seeks,
            closes: self.closes - earlier.closes,
        }
    }
}

impl IoCounters {
    /// Current counts.
    pub fn snapshot(&self) -> IoSnapshot {
        IoSnapshot {
            reads: self.reads.load(Ordering::SeqCst),
            bytes: self.bytes.load(Ordering::SeqCst),
            seeks: self.seeks.load(Ordering::SeqCst),
            closes: self.closes.load(Ordering::SeqCst),
        }
    }
}

/// Wraps a stream and records every read, seek and close.
#[derive(Debug)]
pub struct CountingStream<S> {
    inner: S,
    counters: IoCounters,
}

impl<S: ByteStream> CountingStream<S> {
    /// Wraps `inner`.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            counters: IoCounters::default(),
        }
    }

    /// A handle to the counters.
    pub fn counters(&self) -> IoCounters {
        self.counters.clone()
    }

    /// The wrapped stream.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: ByteStream> ByteStream for CountingStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> StorageResult<usize> {
        let read = self.inner.read(buf)?;
        if read > 0 {
            self.counters.reads.fetch_add(1, Ordering::SeqCst);
            self.counters.bytes.fetch_add(read as u64, Ordering::SeqCst);
        }
        Ok(read)
    }

    fn seek(&mut self, pos: u64) -> StorageResult<u64> {
        self.counters.seeks.fetch_add(1, Ordering::SeqCst);
        self.inner.seek(pos)
    }

    fn position(&mut self) -> StorageResult<u64> {
        self.inner.position()
    }

    fn size(&mut self) -> StorageResult<u64> {
        self.inner.size()
    }

    fn is_seekable(&self) -> bool {
        self.inner.is_seekable()
    }

    fn close(&mut self) -> StorageResult<()> {
        self.counters.closes.fetch_add(1, Ordering::SeqCst);
        self.inner.close()
    }
}
