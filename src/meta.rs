//! Build-wide counters and side-file layout (A4): monotonic progress state
//! plus the set of paths a back-end writes into.

use crate::config::BuildConfig;
use std::path::PathBuf;

/// Monotonically-updated counters tracked over the lifetime of one build.
#[derive(Debug, Clone, Default)]
pub struct Meta {
    /// Total number of rows written (= next preorder id to be assigned).
    pub size: u32,
    /// Number of top-level documents closed so far.
    pub ndocs: u32,
    /// Highest preorder id assigned (`size - 1`, or `0` if `size == 0`).
    pub lastid: u32,
    /// Running total of bytes written to the row table.
    pub filesize: u64,
    /// Text encoding name recorded for the build (always `"utf-8"`; kept as
    /// a field rather than a constant so a future caller-supplied encoding
    /// has somewhere to land without changing the row format).
    pub encoding: &'static str,
}

impl Meta {
    /// Construct a fresh, zeroed counter set.
    pub fn new() -> Self {
        Meta {
            size: 0,
            ndocs: 0,
            lastid: 0,
            filesize: 0,
            encoding: "utf-8",
        }
    }

    /// Record that one row was written, advancing `size`/`lastid`/`filesize`.
    pub fn record_row(&mut self, row_size: u64) {
        self.lastid = self.size;
        self.size += 1;
        self.filesize += row_size;
    }

    /// Record that a top-level document was closed.
    pub fn record_doc(&mut self) {
        self.ndocs += 1;
    }
}

/// Paths to the side files a disk back-end writes into, derived from a
/// [`BuildConfig`].
#[derive(Debug, Clone)]
pub struct Layout {
    /// Row table.
    pub tbl: PathBuf,
    /// Text/comment/PI content.
    pub txt: PathBuf,
    /// Attribute values.
    pub atv: PathBuf,
    /// Scratch file used for the two-pass size patch.
    pub tmp: PathBuf,
    /// Build-counter snapshot.
    pub meta: PathBuf,
    /// Name-dictionary snapshot (elements, then attributes).
    pub names: PathBuf,
    /// Namespace uri-table snapshot.
    pub ns: PathBuf,
    /// Path-summary snapshot.
    pub path: PathBuf,
}

impl Layout {
    /// Derive the eight side-file paths from `config`.
    pub fn new(config: &BuildConfig) -> Self {
        Layout {
            tbl: config.file("tbl"),
            txt: config.file("txt"),
            atv: config.file("atv"),
            tmp: config.file("tmp"),
            meta: config.file("meta"),
            names: config.file("names"),
            ns: config.file("ns"),
            path: config.file("path"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_row_advances_counters() {
        let mut m = Meta::new();
        m.record_row(16);
        m.record_row(16);
        assert_eq!(m.size, 2);
        assert_eq!(m.lastid, 1);
        assert_eq!(m.filesize, 32);
    }

    #[test]
    fn layout_derives_eight_distinct_paths() {
        let cfg = BuildConfig::new(std::env::temp_dir(), "t".to_string());
        let layout = Layout::new(&cfg);
        let paths = [
            &layout.tbl,
            &layout.txt,
            &layout.atv,
            &layout.tmp,
            &layout.meta,
            &layout.names,
            &layout.ns,
            &layout.path,
        ];
        for (i, a) in paths.iter().enumerate() {
            for (j, b) in paths.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b);
                }
            }
        }
    }
}
