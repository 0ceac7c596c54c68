//! Helpers shared by both loading strategies.

use crate::config::LoadConfig;
use crate::error::{DbcError, DbcResult};
use crate::header::{DbcHeader, DBC_MAGIC, HEADER_SIZE};
use crate::layout::Layout;
use dbc_storage::ByteStream;
use tracing::warn;

/// Reads exactly `buf.len()` bytes or fails with `TruncatedInput`.
pub(crate) fn read_exact<S: ByteStream + ?Sized>(
    stream: &mut S,
    buf: &mut [u8],
    context: &str,
) -> DbcResult<()> {
    let read = stream.read_full(buf)?;
    if read != buf.len() {
        return Err(DbcError::truncated(context));
    }
    Ok(())
}

/// Reads a null-terminated run at the current position, stopping after at
/// most `limit` bytes.
///
/// The returned buffer keeps the terminator when one was found within
/// `limit`; a run cut off by the limit is returned as is.
pub(crate) fn read_c_string<S: ByteStream + ?Sized>(
    stream: &mut S,
    limit: usize,
) -> DbcResult<Vec<u8>> {
    const CHUNK: usize = 64;

    let mut out = Vec::new();
    let mut chunk = [0u8; CHUNK];
    while out.len() < limit {
        let want = CHUNK.min(limit - out.len());
        let read = stream.read(&mut chunk[..want])?;
        if read == 0 {
            return Err(DbcError::truncated("string pool entry"));
        }
        if let Some(end) = chunk[..read].iter().position(|&b| b == 0) {
            out.extend_from_slice(&chunk[..=end]);
            return Ok(out);
        }
        out.extend_from_slice(&chunk[..read]);
    }
    Ok(out)
}

/// Closes `stream` if the store was told to own it.
///
/// Close failures are logged; they never mask the error or result the
/// caller is about to return.
pub(crate) fn release_stream<S: ByteStream + ?Sized>(stream: &mut S, own_stream: bool) {
    if !own_stream {
        return;
    }
    if let Err(error) = stream.close() {
        warn!(%error, "failed to close owned stream");
    }
}

/// Header plus the derived sizes both strategies need.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Preamble {
    /// Stream position before the header was read.
    pub start: u64,
    pub header: DbcHeader,
    pub records: usize,
    pub record_size: usize,
    pub pool_size: usize,
    pub payload: usize,
}

impl Preamble {
    /// Reads and validates the header at the current stream position.
    pub(crate) fn read<S: ByteStream + ?Sized>(
        stream: &mut S,
        layout: &Layout,
        config: &LoadConfig,
    ) -> DbcResult<Self> {
        let start = stream.position()?;

        let mut raw = [0u8; HEADER_SIZE];
        read_exact(stream, &mut raw, "header")?;
        let header = DbcHeader::decode(&raw);

        if !header.has_valid_magic() {
            if !config.ignore_wrong_magic {
                return Err(DbcError::BadMagic {
                    expected: DBC_MAGIC,
                    found: header.magic,
                });
            }
            warn!(magic = header.magic, "accepting header with foreign magic");
        }

        let record_size = layout.size();
        if usize::try_from(header.record_size).ok() != Some(record_size) {
            return Err(DbcError::SizeMismatch {
                expected: record_size,
                actual: header.record_size,
            });
        }

        let records = header.records()?;
        let pool_size = header.pool_size()?;
        let payload = header.payload_size(record_size)?;

        Ok(Self {
            start,
            header,
            records,
            record_size,
            pool_size,
            payload,
        })
    }
}

/// Running minimum, maximum and ordering check over record ids.
#[derive(Debug, Default)]
pub(crate) struct IdScan {
    range: Option<(u32, u32)>,
    seen: usize,
}

impl IdScan {
    /// Accepts the next id in file order.
    pub(crate) fn push(&mut self, id: u32) -> DbcResult<()> {
        self.range = match self.range {
            None => Some((id, id)),
            Some((min, previous)) => {
                if id <= previous {
                    return Err(DbcError::OrderingViolation {
                        index: self.seen,
                        previous,
                        id,
                    });
                }
                Some((min, id))
            }
        };
        self.seen += 1;
        Ok(())
    }

    /// `(min_id, max_id)`, or `None` if no id was seen.
    pub(crate) fn range(&self) -> Option<(u32, u32)> {
        self.range
    }

    /// Number of index slots needed to cover the range.
    pub(crate) fn span(&self) -> usize {
        self.range
            .map_or(0, |(min, max)| (max - min) as usize + 1)
    }
}
