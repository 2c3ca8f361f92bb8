//! Memory back-end (C8): the same event contract as the disk back-end, but
//! rows and side-file tokens are kept in memory, and size patches are
//! applied directly -- no temporary file, no second pass.

use crate::builder::Back;
use crate::config::BuildConfig;
use crate::error::Result;
use crate::names::NameId;
use crate::row::{self, Kind, ROW_SIZE};
use crate::sink::ByteSink;

/// In-memory [`Back`] implementation.
pub struct MemBack {
    config: BuildConfig,
    rows: Vec<[u8; ROW_SIZE]>,
    txt: ByteSink<Vec<u8>>,
    atv: ByteSink<Vec<u8>>,
}

impl MemBack {
    /// Construct an empty in-memory back-end. `config.compress` still
    /// governs whether side-file tokens are compressed; `config.dir`/`name`
    /// are unused here (no directory is ever created).
    pub fn new(config: BuildConfig) -> Self {
        let buf = config.buffer_hint.min(64 * 1024);
        MemBack {
            config,
            rows: Vec::new(),
            txt: ByteSink::new(Vec::new(), buf),
            atv: ByteSink::new(Vec::new(), buf),
        }
    }

    fn push_row(&mut self, pre: u32, row: [u8; ROW_SIZE]) {
        debug_assert_eq!(pre as usize, self.rows.len(), "rows must be appended in pre order");
        self.rows.push(row);
    }

    /// The finished row table, one entry per pre, in order. Valid once
    /// [`Back::close`] has run (via [`crate::builder::Builder::finish`]).
    pub fn rows(&self) -> &[[u8; ROW_SIZE]] {
        &self.rows
    }

    /// The finished text/comment/PI side buffer (varint-length-prefixed
    /// tokens, same layout as the disk back-end's `txt` file).
    pub fn text_buffer(&self) -> &[u8] {
        self.txt.get_ref()
    }

    /// The finished attribute-value side buffer.
    pub fn attr_value_buffer(&self) -> &[u8] {
        self.atv.get_ref()
    }
}

impl Back for MemBack {
    fn add_doc(&mut self, pre: u32, text_ref: u64) -> Result<()> {
        let mut row = [0u8; ROW_SIZE];
        row::write_doc(&mut row, text_ref, pre);
        self.push_row(pre, row);
        Ok(())
    }

    fn add_elem(&mut self, pre: u32, asize: u32, has_ns: bool, name_id: NameId, uri_id: u8, dist: u32, size: u32) -> Result<()> {
        let mut row = [0u8; ROW_SIZE];
        row::write_elem(&mut row, asize, has_ns, name_id, uri_id, dist, size);
        self.push_row(pre, row);
        Ok(())
    }

    fn add_attr(&mut self, pre: u32, dist: u32, name_id: NameId, value_ref: u64, uri_id: u8) -> Result<()> {
        let mut row = [0u8; ROW_SIZE];
        row::write_attr(&mut row, dist, name_id, value_ref, uri_id, pre);
        self.push_row(pre, row);
        Ok(())
    }

    fn add_leaf(&mut self, pre: u32, kind: Kind, text_ref: u64, dist: u32) -> Result<()> {
        let mut row = [0u8; ROW_SIZE];
        row::write_leaf(&mut row, kind, text_ref, dist, pre);
        self.push_row(pre, row);
        Ok(())
    }

    fn text_ref(&mut self, value: &[u8], is_text: bool) -> Result<u64> {
        match row::plan_text(value, self.config.compress) {
            row::TextPlan::Inline(v) => Ok(row::TextRef::Inline(v).encode()),
            row::TextPlan::Store { bytes, compressed } => {
                let sink = if is_text { &mut self.txt } else { &mut self.atv };
                let offset = sink.len();
                sink.write_token(&bytes)?;
                let text_ref = if compressed {
                    row::TextRef::Compressed(offset)
                } else {
                    row::TextRef::Raw(offset)
                };
                Ok(text_ref.encode())
            }
        }
    }

    fn set_size(&mut self, pre: u32, size: u32) -> Result<()> {
        row::write_size(&mut self.rows[pre as usize], size);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.txt.flush()?;
        self.atv.flush()?;
        Ok(())
    }

    fn persist_metadata(
        &mut self,
        _meta: &crate::meta::Meta,
        _elem_names: &crate::names::NameDict,
        _attr_names: &crate::names::NameDict,
        _ns: &crate::nsscope::NsScope,
        _paths: &crate::pathsum::PathSummary,
    ) -> Result<()> {
        // Nothing to do: the caller receives these values directly from
        // `Builder::finish`, with no file round-trip needed.
        Ok(())
    }

    fn abort(&mut self) {
        self.rows.clear();
    }
}
