//! Disk back-end (C7): four append-only writers (table, text, attribute
//! value, temporary size-patch) plus a post-pass that reopens the table file
//! for random-access size patching, and a final snapshot of the build-wide
//! dictionaries once the build completes.

use crate::builder::Back;
use crate::config::BuildConfig;
use crate::error::Result;
use crate::meta::{Layout, Meta};
use crate::names::{NameDict, NameId};
use crate::nsscope::NsScope;
use crate::pathsum::PathSummary;
use crate::progress::Progress;
use crate::row::{self, Kind, ROW_SIZE};
use crate::sink::{self, ByteSink, TableAccess};
use crate::snapshot;
use crate::stg::{remove_dir_best_effort, SimpleFileStorage};
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::PathBuf;
use std::sync::Arc;

/// Disk-backed [`Back`] implementation: writes a pre-ordered `tbl` file, side
/// files for text/attribute-value tokens, and a scratch `tmp` file recording
/// `(pre, size)` pairs for the post-pass patch.
pub struct DiskBack {
    config: BuildConfig,
    layout: Layout,
    progress: Arc<Progress>,
    tbl: Option<ByteSink<File>>,
    txt: Option<ByteSink<File>>,
    atv: Option<ByteSink<File>>,
    tmp: Option<ByteSink<File>>,
    pending: u64,
    dir: PathBuf,
}

impl DiskBack {
    /// Create a fresh database directory under `config.dir` (dropping any
    /// existing directory of the same name first -- the drop-and-retry
    /// failure policy applies to setup as well as to abort) and open its
    /// four side files.
    pub fn create(config: BuildConfig, progress: Arc<Progress>) -> Result<Self> {
        let dir = config.db_dir();
        if crate::config::is_existing_db(&dir) {
            fs::remove_dir_all(&dir)?;
        }
        fs::create_dir_all(&dir)?;
        let layout = Layout::new(&config);
        let buf = config.buffer_size(0);
        let tbl = ByteSink::new(File::create(&layout.tbl)?, buf);
        let txt = ByteSink::new(File::create(&layout.txt)?, buf);
        let atv = ByteSink::new(File::create(&layout.atv)?, buf);
        let tmp = ByteSink::new(File::create(&layout.tmp)?, buf);
        Ok(DiskBack {
            config,
            layout,
            progress,
            tbl: Some(tbl),
            txt: Some(txt),
            atv: Some(atv),
            tmp: Some(tmp),
            pending: 0,
            dir,
        })
    }

    fn tbl_mut(&mut self) -> &mut ByteSink<File> {
        self.tbl.as_mut().expect("disk back-end already closed/aborted")
    }

    fn write_row(&mut self, row: [u8; ROW_SIZE]) -> Result<()> {
        self.tbl_mut().write_bytes(&row)
    }
}

impl Back for DiskBack {
    fn add_doc(&mut self, pre: u32, text_ref: u64) -> Result<()> {
        let mut row = [0u8; ROW_SIZE];
        row::write_doc(&mut row, text_ref, pre);
        self.write_row(row)
    }

    fn add_elem(&mut self, _pre: u32, asize: u32, has_ns: bool, name_id: NameId, uri_id: u8, dist: u32, size: u32) -> Result<()> {
        // ELEM rows carry no pre field; the row's table position is its pre.
        let mut row = [0u8; ROW_SIZE];
        row::write_elem(&mut row, asize, has_ns, name_id, uri_id, dist, size);
        self.write_row(row)
    }

    fn add_attr(&mut self, pre: u32, dist: u32, name_id: NameId, value_ref: u64, uri_id: u8) -> Result<()> {
        let mut row = [0u8; ROW_SIZE];
        row::write_attr(&mut row, dist, name_id, value_ref, uri_id, pre);
        self.write_row(row)
    }

    fn add_leaf(&mut self, pre: u32, kind: Kind, text_ref: u64, dist: u32) -> Result<()> {
        let mut row = [0u8; ROW_SIZE];
        row::write_leaf(&mut row, kind, text_ref, dist, pre);
        self.write_row(row)
    }

    fn text_ref(&mut self, value: &[u8], is_text: bool) -> Result<u64> {
        match row::plan_text(value, self.config.compress) {
            row::TextPlan::Inline(v) => Ok(row::TextRef::Inline(v).encode()),
            row::TextPlan::Store { bytes, compressed } => {
                let sink = if is_text { self.txt.as_mut() } else { self.atv.as_mut() };
                let sink = sink.expect("disk back-end already closed/aborted");
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
        let tmp = self.tmp.as_mut().expect("disk back-end already closed/aborted");
        tmp.write_num(pre)?;
        tmp.write_num(size)?;
        self.pending += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(txt) = self.txt.take() {
            txt.into_inner()?;
        }
        if let Some(atv) = self.atv.take() {
            atv.into_inner()?;
        }
        let tbl = self.tbl.take().expect("close called twice");
        tbl.into_inner()?;
        let tmp = self.tmp.take().expect("close called twice");
        let mut tmp_file = tmp.into_inner()?;

        self.progress.begin_patch(self.pending);
        tmp_file.seek(SeekFrom::Start(0))?;
        let mut buf = Vec::new();
        tmp_file.read_to_end(&mut buf)?;
        drop(tmp_file);

        let mut access = TableAccess::new(SimpleFileStorage::open(&self.layout.tbl)?);
        let mut i = 0;
        while i < buf.len() {
            let (pre, consumed) = sink::read_num(&buf[i..]);
            i += consumed;
            let (size, consumed) = sink::read_num(&buf[i..]);
            i += consumed;
            access.patch_size(pre, size)?;
            self.progress.patch_tick();
        }
        fs::remove_file(&self.layout.tmp)?;
        Ok(())
    }

    fn persist_metadata(&mut self, meta: &Meta, elem_names: &NameDict, attr_names: &NameDict, ns: &NsScope, paths: &PathSummary) -> Result<()> {
        let buf = self.config.buffer_size(0);
        let mut meta_sink = ByteSink::new(File::create(&self.layout.meta)?, buf);
        snapshot::write_meta(&mut meta_sink, meta)?;
        meta_sink.into_inner()?;

        let mut names_sink = ByteSink::new(File::create(&self.layout.names)?, buf);
        snapshot::write_names_pair(&mut names_sink, elem_names, attr_names)?;
        names_sink.into_inner()?;

        let mut ns_sink = ByteSink::new(File::create(&self.layout.ns)?, buf);
        snapshot::write_ns(&mut ns_sink, ns)?;
        ns_sink.into_inner()?;

        let mut path_sink = ByteSink::new(File::create(&self.layout.path)?, buf);
        snapshot::write_paths(&mut path_sink, paths)?;
        path_sink.into_inner()?;
        Ok(())
    }

    fn abort(&mut self) {
        self.tbl = None;
        self.txt = None;
        self.atv = None;
        self.tmp = None;
        remove_dir_best_effort(&self.dir);
    }
}
