//! File-backed byte stream.

use crate::error::{StorageError, StorageResult};
use crate::stream::ByteStream;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// A seekable stream over an OS file.
///
/// The file is opened read-only. [`ByteStream::close`] drops the handle;
/// afterwards every operation fails with [`StorageError::Closed`].
///
/// # Example
///
/// ```no_run
/// use dbc_storage::{ByteStream, FileStream};
/// use std::path::Path;
///
/// let mut stream = FileStream::open(Path::new("Spell.dbc")).unwrap();
/// let mut magic = [0u8; 4];
/// stream.read_full(&mut magic).unwrap();
/// ```
#[derive(Debug)]
pub struct FileStream {
    path: PathBuf,
    file: Option<File>,
}

impl FileStream {
    /// Opens the file at `path` for reading.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let file = File::open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
        })
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns whether the file handle has been released.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.file.is_none()
    }

    fn file(&mut self) -> StorageResult<&mut File> {
        self.file.as_mut().ok_or(StorageError::Closed)
    }
}

impl ByteStream for FileStream {
    fn read(&mut self, buf: &mut [u8]) -> StorageResult<usize> {
        Ok(self.file()?.read(buf)?)
    }

    fn seek(&mut self, pos: u64) -> StorageResult<u64> {
        Ok(self.file()?.seek(SeekFrom::Start(pos))?)
    }

    fn position(&mut self) -> StorageResult<u64> {
        Ok(self.file()?.stream_position()?)
    }

    fn size(&mut self) -> StorageResult<u64> {
        Ok(self.file()?.metadata()?.len())
    }

    fn close(&mut self) -> StorageResult<()> {
        self.file = None;
        Ok(())
    }
}
