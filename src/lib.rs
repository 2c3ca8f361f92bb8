//!
//! Database build core.
//!
//! This crate turns a stream of parser events -- `open_doc`/`close_doc`/
//! `open_elem`/`empty_elem`/`close_elem`/`text`/`comment`/`pi` -- into a
//! compact, navigable on-disk or in-memory representation of an XML
//! document tree: a fixed-width 16-byte-per-row table addressed by preorder
//! (pre) id, side files for text and attribute-value payloads, name and
//! namespace dictionaries, and a path summary.
//!
//! General design
//!
//! [`builder::Builder`] is the front-end: it owns the name dictionaries
//! ([`names::NameDict`], one each for elements and attributes), the
//! namespace scope ([`nsscope::NsScope`]), the path summary
//! ([`pathsum::PathSummary`]) and the running counters ([`meta::Meta`]), and
//! drives one of two back-ends through the [`builder::Back`] trait:
//!
//! - [`disk::DiskBack`] writes a pre-ordered row table plus side files to a
//!   database directory, deferring subtree-size patches to a second pass
//!   over a temporary file so the table file stays strictly append-only
//!   while parsing.
//! - [`memory::MemBack`] keeps the same rows and side buffers in memory and
//!   patches sizes in place as soon as they are known.
//!
//! Every row is 16 bytes; [`row`] holds the bit-packing for each node kind
//! and the 40-bit text-reference codec (inlined integer, compressed
//! side-file offset, or raw side-file offset). [`compress`] applies Snappy
//! compression to side-file tokens when it actually saves space.
//!
//! A successful build publishes a [`doc::Document`]: the two name
//! dictionaries, the namespace uri table, the path summary and the build
//! counters, read-only from that point on. The disk back-end also writes a
//! snapshot of these ([`snapshot`]) to `meta`/`names`/`ns`/`path` files
//! alongside the row table, so the database directory describes itself and a
//! build's own dictionaries can be decoded back without re-parsing; decoding
//! the row table itself -- query/update access to a built database -- stays
//! out of scope. The parser that produces the event stream, any query layer
//! over a built database, and reopening a database for further appends are
//! all out of scope here.
//!
//! Example (in-memory build):
//! ```
//! use rustxmlcore::{config::BuildConfig, memory_builder, progress::Progress};
//! use std::sync::Arc;
//!
//! let config = BuildConfig::new(std::env::temp_dir(), "example");
//! let mut b = memory_builder(config, Arc::new(Progress::new()));
//! b.open_doc(b"doc").unwrap();
//! b.empty_elem(b"a", &[], &[]).unwrap();
//! b.close_doc().unwrap();
//! let (_back, parts) = b.finish().unwrap();
//! assert_eq!(parts.meta.size, 2);
//! ```

pub mod builder;
pub mod compress;
pub mod config;
pub mod disk;
pub mod doc;
pub mod error;
pub mod memory;
pub mod meta;
pub mod names;
pub mod nsscope;
pub mod pathsum;
pub mod progress;
pub mod row;
pub mod sink;
pub mod snapshot;
pub mod stg;
mod util;

use std::sync::Arc;

pub use builder::{Back, Builder, BuiltParts};
pub use doc::Document;
pub use error::{BuildError, Limit, Result};

/// Construct a [`Builder`] over a fresh [`disk::DiskBack`], creating (and if
/// necessary replacing) the database directory named by `config`.
pub fn disk_builder(config: config::BuildConfig, progress: Arc<progress::Progress>) -> Result<Builder<disk::DiskBack>> {
    let back = disk::DiskBack::create(config, progress.clone())?;
    Ok(Builder::new(back, progress, None))
}

/// Construct a [`Builder`] over a fresh [`memory::MemBack`].
pub fn memory_builder(config: config::BuildConfig, progress: Arc<progress::Progress>) -> Builder<memory::MemBack> {
    let back = memory::MemBack::new(config);
    Builder::new(back, progress, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn disk_builder_round_trips_a_small_document() {
        let name = format!("lib-test-{}", std::process::id());
        let config = config::BuildConfig::new(std::env::temp_dir(), name);
        let db_dir = config.db_dir();
        let progress = Arc::new(progress::Progress::new());
        let mut b = disk_builder(config, progress).unwrap();
        b.open_doc(b"doc").unwrap();
        b.open_elem(b"root", &[(&b"id"[..], &b"7"[..])], &[]).unwrap();
        b.text(b"hello").unwrap();
        b.close_elem().unwrap();
        b.close_doc().unwrap();
        let (_back, parts) = b.finish().unwrap();
        let doc = Document::from(parts);
        assert_eq!(doc.doc_count(), 1);
        assert!(doc.row_count() >= 3);
        std::fs::remove_dir_all(&db_dir).ok();
    }

    #[test]
    fn memory_builder_builds_without_touching_disk() {
        let config = config::BuildConfig::new(std::env::temp_dir(), "lib-mem-test");
        let progress = Arc::new(progress::Progress::new());
        let mut b = memory_builder(config, progress);
        b.open_doc(b"doc").unwrap();
        b.empty_elem(b"a", &[], &[]).unwrap();
        b.close_doc().unwrap();
        let (back, parts) = b.finish().unwrap();
        assert_eq!(back.rows().len(), 2);
        let doc = Document::from(parts);
        assert_eq!(doc.row_count(), 2);
    }

    #[test]
    fn cancellation_stops_the_build_at_close_elem() {
        let config = config::BuildConfig::new(std::env::temp_dir(), "lib-cancel-test");
        let progress = Arc::new(progress::Progress::new());
        let back = memory::MemBack::new(config);
        let stop = Arc::new(AtomicBool::new(false));
        let mut b = Builder::new(back, progress, Some(stop.clone()));
        b.open_doc(b"doc").unwrap();
        b.open_elem(b"a", &[], &[]).unwrap();
        stop.store(true, Ordering::Relaxed);
        let err = b.close_elem().unwrap_err();
        assert!(matches!(err, BuildError::Cancelled));
    }
}
