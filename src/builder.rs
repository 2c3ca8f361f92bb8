//! Builder front-end (C6): the parser-event sink. Maintains the pre/name
//! stacks, drives the name dictionaries, namespace scope and path summary,
//! and forwards row emission to a [`Back`] implementation (disk or memory).

use crate::error::{BuildError, Result};
use crate::meta::Meta;
use crate::names::{NameDict, NameId};
use crate::nsscope::NsScope;
use crate::pathsum::PathSummary;
use crate::progress::Progress;
use crate::row::{Kind, ROW_SIZE};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Per-kind attribute cap; also the ceiling `asize`/attribute `dist` are
/// clamped to on overflow.
pub const MAX_ATTS: u32 = crate::row::MAX_ATTS;

/// What a back-end (disk or memory) must provide to the front-end. Row
/// emission is split out per kind rather than taking a raw `[u8; 16]` so
/// each back-end can apply its own bookkeeping (append position, in-place
/// patch target) around a shared call shape.
pub trait Back {
    /// Emit the DOC row at `pre`, whose text-ref is `text_ref` (the
    /// already-encoded 40-bit field, see [`crate::row::TextRef::encode`]).
    fn add_doc(&mut self, pre: u32, text_ref: u64) -> Result<()>;

    /// Emit an ELEM row at `pre`. `size` is `asize` (the capped
    /// `min(attribute_count + 1, MAX_ATTS)` hint) as of this call, since
    /// every attribute is already known by the time the element row is
    /// written. `close_elem`/`close_doc` later overwrite it with the full
    /// subtree size via `set_size` if any children follow. A childless
    /// element (`empty_elem`) has no such follow-up call, so its row's size
    /// must already be correct; if the true attribute count overflowed
    /// `asize`'s cap, `empty_elem` itself calls `set_size` once, immediately,
    /// to correct it.
    #[allow(clippy::too_many_arguments)]
    fn add_elem(&mut self, pre: u32, asize: u32, has_ns: bool, name_id: NameId, uri_id: u8, dist: u32, size: u32) -> Result<()>;

    /// Emit an ATTR row at `pre`.
    fn add_attr(&mut self, pre: u32, dist: u32, name_id: NameId, value_ref: u64, uri_id: u8) -> Result<()>;

    /// Emit a TEXT/COMM/PI row at `pre`.
    fn add_leaf(&mut self, pre: u32, kind: Kind, text_ref: u64, dist: u32) -> Result<()>;

    /// Classify and, if needed, store `value`, returning its encoded
    /// text-ref field. `is_text` selects which side file a `Store` outcome
    /// lands in (text/comment/PI content vs. attribute values).
    fn text_ref(&mut self, value: &[u8], is_text: bool) -> Result<u64>;

    /// Patch the size field of the DOC/ELEM row at `pre` to `size`.
    fn set_size(&mut self, pre: u32, size: u32) -> Result<()>;

    /// Finalize: flush/close all writers. Called once, after the last event.
    fn close(&mut self) -> Result<()>;

    /// Persist a best-effort snapshot of the accumulated dictionaries,
    /// called once, after [`Back::close`], with everything [`BuiltParts`]
    /// is about to publish. The disk back-end writes this to the `meta`/
    /// `names`/`ns`/`path` files; the memory back-end has nothing to
    /// write, since the caller gets these values back directly.
    fn persist_metadata(&mut self, meta: &Meta, elem_names: &NameDict, attr_names: &NameDict, ns: &NsScope, paths: &PathSummary) -> Result<()>;

    /// Abandon the build: release resources, best-effort. Never panics.
    fn abort(&mut self);
}

/// Front-end state: `Ready` accepts a new `open_doc`; `InDoc` accepts
/// elements/text/`close_doc` (`Initial -> InDoc -> (InElem)* -> Closing ->
/// Done` collapses to these two since `InElem`/`Closing` are just `InDoc` at
/// `level >= 2` and `level == 1` respectively -- `Done` is modeled by
/// consuming `self` in [`Builder::finish`] rather than a third variant).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Ready,
    InDoc,
}

/// The components published once a build completes successfully.
pub struct BuiltParts {
    /// Element name dictionary.
    pub elem_names: NameDict,
    /// Attribute name dictionary.
    pub attr_names: NameDict,
    /// Namespace uri dictionary (scope stack is empty once all docs closed).
    pub ns: NsScope,
    /// Path summary.
    pub paths: PathSummary,
    /// Build counters.
    pub meta: Meta,
}

/// Parser-event sink generic over a back-end. One parser drives one
/// `Builder`; events must arrive in the order enforced by the state machine
/// above or a [`BuildError::Protocol`] is raised.
pub struct Builder<B: Back> {
    back: B,
    state: State,
    level: usize,
    pstack: Vec<u32>,
    tstack: Vec<NameId>,
    elem_names: NameDict,
    attr_names: NameDict,
    ns: NsScope,
    paths: PathSummary,
    meta: Meta,
    progress: Arc<Progress>,
    stop: Option<Arc<AtomicBool>>,
}

impl<B: Back> Builder<B> {
    /// Construct a builder over `back`. `stop`, if given, is polled at
    /// `close_elem` via `check_stop`; setting it cancels the build.
    pub fn new(back: B, progress: Arc<Progress>, stop: Option<Arc<AtomicBool>>) -> Self {
        Builder {
            back,
            state: State::Ready,
            level: 0,
            pstack: Vec::new(),
            tstack: Vec::new(),
            elem_names: NameDict::new(crate::error::Limit::Elems),
            attr_names: NameDict::new(crate::error::Limit::Atts),
            ns: NsScope::new(),
            paths: PathSummary::new(),
            meta: Meta::new(),
            progress,
            stop,
        }
    }

    /// Open a new top-level document named `name`.
    pub fn open_doc(&mut self, name: &[u8]) -> Result<()> {
        self.ensure_ready()?;
        self.paths.put(0, Kind::Doc, 0, None);
        let pre = self.next_pre()?;
        let text_ref = self.back.text_ref(name, true)?;
        self.back.add_doc(pre, text_ref)?;
        self.meta.record_row(ROW_SIZE as u64);
        self.pstack.clear();
        self.tstack.clear();
        self.pstack.push(pre);
        self.tstack.push(0);
        self.level = 1;
        self.ns.prepare(pre);
        self.state = State::InDoc;
        Ok(())
    }

    /// Close the currently open document.
    pub fn close_doc(&mut self) -> Result<()> {
        self.ensure_in_doc()?;
        if self.level != 1 {
            return Err(BuildError::Protocol("close_doc called with elements still open"));
        }
        self.level = 0;
        let pre = self.pstack[0];
        let size = self.meta.size - pre;
        self.back.set_size(pre, size)?;
        self.meta.record_doc();
        self.ns.close(pre);
        self.state = State::Ready;
        Ok(())
    }

    /// Open an element that will later be matched by [`Self::close_elem`].
    pub fn open_elem(&mut self, name: &[u8], atts: &[(&[u8], &[u8])], nsps: &[(&[u8], &[u8])]) -> Result<()> {
        self.ensure_in_doc()?;
        self.add_elem_internal(name, atts, nsps)?;
        self.level += 1;
        Ok(())
    }

    /// Open and immediately close a childless element.
    pub fn empty_elem(&mut self, name: &[u8], atts: &[(&[u8], &[u8])], nsps: &[(&[u8], &[u8])]) -> Result<()> {
        self.ensure_in_doc()?;
        let pre = self.add_elem_internal(name, atts, nsps)?;
        // `add_elem_internal` wrote this row's size as `asize` (capped). No
        // `close_elem` follows for a childless element, so if the true
        // attribute count overflowed the cap, patch the size here -- the
        // sole place a row's size is corrected without a matching
        // `close_elem`. Unreachable today since `add_elem_internal` rejects
        // overflow outright via `AttsPerElem`; kept to preserve the
        // asymmetry should that limit ever be relaxed.
        let true_count = atts.len() as u32 + 1;
        if true_count > MAX_ATTS {
            self.back.set_size(pre, true_count)?;
        }
        self.ns.close(pre);
        Ok(())
    }

    /// Close the innermost open element.
    pub fn close_elem(&mut self) -> Result<()> {
        self.ensure_in_doc()?;
        if self.level < 2 {
            return Err(BuildError::Protocol("close_elem called with no open element"));
        }
        self.level -= 1;
        let pre = self.pstack[self.level];
        let size = self.meta.size - pre;
        self.back.set_size(pre, size)?;
        self.ns.close(pre);
        self.check_stop()?;
        Ok(())
    }

    /// Deliver a text node. Empty text is dropped (no row is emitted).
    pub fn text(&mut self, value: &[u8]) -> Result<()> {
        self.ensure_in_doc()?;
        self.add_text_internal(value, Kind::Text)
    }

    /// Deliver a comment node. Empty text is dropped.
    pub fn comment(&mut self, value: &[u8]) -> Result<()> {
        self.ensure_in_doc()?;
        self.add_text_internal(value, Kind::Comm)
    }

    /// Deliver a processing-instruction node. Empty text is dropped.
    pub fn pi(&mut self, value: &[u8]) -> Result<()> {
        self.ensure_in_doc()?;
        self.add_text_internal(value, Kind::Pi)
    }

    /// Finish the build: close the back-end's writers and publish the
    /// accumulated dictionaries/summary/counters, along with the back-end
    /// itself (the memory back-end's row table/side buffers are read out of
    /// it; the disk back-end has nothing further for the caller to do with
    /// it). Fails if a document is still open.
    pub fn finish(mut self) -> Result<(B, BuiltParts)> {
        if self.state != State::Ready {
            return Err(BuildError::Protocol("finish called with a document still open"));
        }
        self.back.close()?;
        self.back
            .persist_metadata(&self.meta, &self.elem_names, &self.attr_names, &self.ns, &self.paths)?;
        let parts = BuiltParts {
            elem_names: self.elem_names,
            attr_names: self.attr_names,
            ns: self.ns,
            paths: self.paths,
            meta: self.meta,
        };
        Ok((self.back, parts))
    }

    /// Abandon the build: tell the back-end to release its resources.
    pub fn abort(mut self) {
        self.back.abort();
    }

    /// Read-only view of build counters so far.
    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.state != State::Ready {
            return Err(BuildError::Protocol("open_doc called while a document is already open"));
        }
        Ok(())
    }

    fn ensure_in_doc(&self) -> Result<()> {
        if self.state != State::InDoc {
            return Err(BuildError::Protocol("event delivered outside an open document"));
        }
        Ok(())
    }

    fn next_pre(&mut self) -> Result<u32> {
        if self.meta.size == u32::MAX >> 1 {
            return Err(BuildError::StructuralLimit(crate::error::Limit::Range));
        }
        Ok(self.meta.size)
    }

    fn check_stop(&self) -> Result<()> {
        if let Some(stop) = &self.stop {
            if stop.load(Ordering::Relaxed) {
                return Err(BuildError::Cancelled);
            }
        }
        Ok(())
    }

    fn resolve_uri(&self, qname: &[u8], pre: u32, is_element: bool) -> Result<u8> {
        match self.ns.uri(qname, is_element) {
            Some(id) => Ok(id),
            None => {
                let prefix = match qname.iter().position(|&b| b == b':') {
                    Some(i) => String::from_utf8_lossy(&qname[..i]).into_owned(),
                    None => String::new(),
                };
                Err(BuildError::NamespaceBinding { prefix, pre })
            }
        }
    }

    fn add_elem_internal(&mut self, name: &[u8], atts: &[(&[u8], &[u8])], nsps: &[(&[u8], &[u8])]) -> Result<u32> {
        if atts.len() as u32 >= MAX_ATTS {
            return Err(BuildError::StructuralLimit(crate::error::Limit::AttsPerElem));
        }
        let pre = self.next_pre()?;
        self.ns.prepare(pre);
        for (prefix, uri) in nsps {
            self.ns.add(prefix, uri)?;
        }
        let has_ns = !nsps.is_empty();
        let uri_id = self.resolve_uri(name, pre, true)?;
        let local = local_name(name);
        let name_id = self.elem_names.index(local, None)?;
        if self.level >= 2 {
            let parent_id = self.tstack[self.level - 1];
            self.elem_names.set_not_leaf(parent_id);
        }
        self.paths.put(name_id, Kind::Elem, self.level as u32, None);

        let parent_pre = self.pstack[self.level - 1];
        let dist = pre - parent_pre;
        let asize = (atts.len() as u32 + 1).min(MAX_ATTS);
        self.back.add_elem(pre, asize, has_ns, name_id, uri_id, dist, asize)?;
        self.meta.record_row(ROW_SIZE as u64);

        self.pstack.truncate(self.level);
        self.pstack.push(pre);
        self.tstack.truncate(self.level);
        self.tstack.push(name_id);

        for (i, (aname, avalue)) in atts.iter().enumerate() {
            let adist = (i as u32 + 1).min(MAX_ATTS);
            let auri = self.resolve_uri(aname, pre, false)?;
            let alocal = local_name(aname);
            let aname_id = self.attr_names.index(alocal, Some(avalue))?;
            self.paths.put(aname_id, Kind::Attr, self.level as u32 + 1, Some(avalue));
            let value_ref = self.back.text_ref(avalue, false)?;
            let apre = self.next_pre()?;
            self.back.add_attr(apre, adist, aname_id, value_ref, auri)?;
            self.meta.record_row(ROW_SIZE as u64);
        }
        Ok(pre)
    }

    fn add_text_internal(&mut self, value: &[u8], kind: Kind) -> Result<()> {
        if value.is_empty() {
            return Ok(());
        }
        let pre = self.next_pre()?;
        let parent_pre = self.pstack[self.level - 1];
        let dist = pre - parent_pre;
        let text_ref = self.back.text_ref(value, true)?;
        self.back.add_leaf(pre, kind, text_ref, dist)?;
        self.meta.record_row(ROW_SIZE as u64);
        if kind == Kind::Text && self.level >= 2 {
            let parent_id = self.tstack[self.level - 1];
            self.elem_names.index_text(parent_id, value);
        }
        self.paths.put(0, kind, self.level as u32, Some(value));
        Ok(())
    }
}

/// Strip a `prefix:` qualifier, if any.
fn local_name(qname: &[u8]) -> &[u8] {
    match qname.iter().position(|&b| b == b':') {
        Some(i) => &qname[i + 1..],
        None => qname,
    }
}
