//! Backing storage abstraction: a small trait over a byte-addressable store
//! plus a plain-file implementation.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Interface for byte-addressable backing storage.
pub trait Storage {
    /// Current size of the underlying storage, in bytes.
    fn size(&self) -> std::io::Result<u64>;

    /// Read `bytes.len()` bytes starting at `off`.
    fn read(&mut self, off: u64, bytes: &mut [u8]) -> std::io::Result<()>;

    /// Write `bytes` starting at `off`.
    fn write(&mut self, off: u64, bytes: &[u8]) -> std::io::Result<()>;

    /// Truncate/extend the underlying storage to exactly `size` bytes.
    fn set_len(&mut self, size: u64) -> std::io::Result<()>;
}

/// Plain `std::fs::File`-backed [`Storage`], used by the disk back-end's
/// random-access size-patch pass (`sink::TableAccess`).
pub struct SimpleFileStorage {
    file: File,
}

impl SimpleFileStorage {
    /// Open (creating if necessary) `path` for read/write random access.
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;
        Ok(Self { file })
    }
}

impl Storage for SimpleFileStorage {
    fn size(&self) -> std::io::Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    fn read(&mut self, off: u64, bytes: &mut [u8]) -> std::io::Result<()> {
        self.file.seek(SeekFrom::Start(off))?;
        self.file.read_exact(bytes)
    }

    fn write(&mut self, off: u64, bytes: &[u8]) -> std::io::Result<()> {
        self.file.seek(SeekFrom::Start(off))?;
        self.file.write_all(bytes)
    }

    fn set_len(&mut self, size: u64) -> std::io::Result<()> {
        self.file.set_len(size)
    }
}

/// Remove `dir` and all its contents, if present. Errors are swallowed by
/// callers that use this during `abort()` (abort must never fail
/// loudly); callers that need the error (fresh-build setup) should use
/// `fs::remove_dir_all` directly instead.
pub fn remove_dir_best_effort(dir: &Path) {
    if dir.is_dir() {
        if let Err(e) = fs::remove_dir_all(dir) {
            eprintln!("warning: failed to remove database directory {dir:?}: {e}");
        }
    }
}
