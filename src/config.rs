//! Build-time configuration: the ambient directory/buffering settings needed
//! to make the disk back-end a complete, standalone component.

use std::path::{Path, PathBuf};

/// Block size side-file buffers are rounded down to a multiple of.
pub const BLOCK_SIZE: usize = 4096;

/// Ceiling on the buffer-size clamp below: 4 MiB.
pub const MAX_BUFFER: usize = 4 * 1024 * 1024;

/// Configuration for a single build.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Directory under which `<name>/` is created for the disk back-end.
    pub dir: PathBuf,
    /// Database name; also the sub-directory name.
    pub name: String,
    /// Whether the compressor (C2) is applied to text/attribute-value tokens.
    pub compress: bool,
    /// Estimate of available buffering headroom, feeding the clamp below.
    /// There is no portable "free heap" query in Rust, so the caller
    /// supplies an estimate; the default (`4 * MAX_BUFFER`) makes
    /// `buffer_hint / 4` equal to `MAX_BUFFER`, so the clamp's ceiling is
    /// `MAX_BUFFER` by default.
    pub buffer_hint: usize,
}

impl BuildConfig {
    /// Construct a config for a disk build rooted at `dir`, named `name`.
    pub fn new(dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        BuildConfig {
            dir: dir.into(),
            name: name.into(),
            compress: true,
            buffer_hint: MAX_BUFFER * 4,
        }
    }

    /// Path of the database directory (`<dir>/<name>/`).
    pub fn db_dir(&self) -> PathBuf {
        self.dir.join(&self.name)
    }

    /// Path of a named side file within the database directory.
    pub fn file(&self, leaf: &str) -> PathBuf {
        self.db_dir().join(leaf)
    }

    /// Buffer size for a side file of the given current size:
    /// `clamp(file_size, BLOCK_SIZE, min(MAX_BUFFER, buffer_hint / 4))`
    /// rounded down to a multiple of `BLOCK_SIZE`.
    pub fn buffer_size(&self, file_size: u64) -> usize {
        let ceiling = MAX_BUFFER.min(self.buffer_hint / 4).max(BLOCK_SIZE);
        let size = (file_size as usize).clamp(BLOCK_SIZE, ceiling);
        (size / BLOCK_SIZE) * BLOCK_SIZE
    }
}

/// Returns true if `dir` currently holds a database directory that should be
/// dropped before a fresh build starts (drop-and-retry failure policy).
pub fn is_existing_db(dir: &Path) -> bool {
    dir.is_dir()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_size_rounds_down() {
        let cfg = BuildConfig::new("/tmp/x", "d");
        assert_eq!(cfg.buffer_size(0), BLOCK_SIZE);
        assert_eq!(cfg.buffer_size(100_000), 98304);
        assert_eq!(cfg.buffer_size(u64::MAX), MAX_BUFFER);
    }

    #[test]
    fn buffer_hint_lowers_ceiling() {
        let mut cfg = BuildConfig::new("/tmp/x", "d");
        cfg.buffer_hint = 8192; // ceiling = min(MAX_BUFFER, 8192/4) = 2048, clamped up to BLOCK_SIZE
        assert_eq!(cfg.buffer_size(u64::MAX), BLOCK_SIZE);
    }
}
