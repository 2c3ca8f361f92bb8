//! Namespace scope tracking (C4): a stack of frames bound to the pre of
//! the element that introduced them, plus a dense uri dictionary.

use crate::error::{BuildError, Limit, Result};
use rustc_hash::FxHashMap;

/// Hard capacity of the uri dictionary.
pub const LIMIT: usize = 0x100;

/// The `xml` prefix is reserved and always resolves even with no explicit
/// binding.
const RESERVED_PREFIX: &[u8] = b"xml";

/// One namespace scope frame: bindings introduced at a single element pre.
struct Frame {
    pre: u32,
    bindings: Vec<(Vec<u8>, u8)>,
}

/// Namespace scope: a stack of frames plus the uri dictionary.
#[derive(Default)]
pub struct NsScope {
    uris: Vec<Vec<u8>>, // index 0 unused (uri-id 0 means "no namespace")
    uri_ids: FxHashMap<Vec<u8>, u8>,
    frames: Vec<Frame>,
}

impl NsScope {
    /// Construct an empty scope (uri-id 0 reserved for "no namespace").
    pub fn new() -> Self {
        NsScope {
            uris: vec![Vec::new()],
            uri_ids: FxHashMap::default(),
            frames: Vec::new(),
        }
    }

    /// Start a new (initially empty) frame, to be populated by [`Self::add`]
    /// calls before the owning element's row is considered complete.
    pub fn prepare(&mut self, pre: u32) {
        self.frames.push(Frame {
            pre,
            bindings: Vec::new(),
        });
    }

    /// Record a `prefix -> uri` binding on the current (innermost) frame,
    /// interning `uri` into the uri dictionary.
    pub fn add(&mut self, prefix: &[u8], uri: &[u8]) -> Result<()> {
        let uri_id = self.intern(uri)?;
        let frame = self.frames.last_mut().expect("prepare() called first");
        frame.bindings.push((prefix.to_vec(), uri_id));
        Ok(())
    }

    fn intern(&mut self, uri: &[u8]) -> Result<u8> {
        if let Some(&id) = self.uri_ids.get(uri) {
            return Ok(id);
        }
        if self.uris.len() >= LIMIT {
            return Err(BuildError::StructuralLimit(Limit::Ns));
        }
        let id = self.uris.len() as u8;
        self.uris.push(uri.to_vec());
        self.uri_ids.insert(uri.to_vec(), id);
        Ok(id)
    }

    /// Pop all frames whose pre is `>= pre` (a doc/element closing).
    pub fn close(&mut self, pre: u32) {
        while let Some(top) = self.frames.last() {
            if top.pre >= pre {
                self.frames.pop();
            } else {
                break;
            }
        }
    }

    /// Resolve the uri-id for `qname` (a possibly-prefixed name), searching
    /// frames innermost-first. Returns `0` ("no namespace") if there is no
    /// `:` in `qname` and (for attributes) there is no applicable default
    /// binding, or if the prefix is unbound and not the reserved `xml`
    /// prefix (callers are responsible for turning that case into
    /// [`BuildError::NamespaceBinding`]).
    ///
    /// `is_element` distinguishes element vs. attribute qname resolution: an
    /// unprefixed element name inherits the innermost `xmlns="..."` default
    /// binding in scope, if any, while an unprefixed attribute name never
    /// does (per-namespace rules: default namespaces apply to elements only).
    /// A default binding is recorded as a binding whose prefix is empty.
    pub fn uri(&self, qname: &[u8], is_element: bool) -> Option<u8> {
        let prefix = match qname.iter().position(|&b| b == b':') {
            Some(i) => &qname[..i],
            None => {
                return Some(if is_element { self.resolve_prefix(b"").unwrap_or(0) } else { 0 });
            }
        };
        if let Some(id) = self.resolve_prefix(prefix) {
            return Some(id);
        }
        if prefix == RESERVED_PREFIX {
            Some(0)
        } else {
            None
        }
    }

    /// Search frames innermost-first for a binding of `prefix` (empty for
    /// the default namespace).
    fn resolve_prefix(&self, prefix: &[u8]) -> Option<u8> {
        for frame in self.frames.iter().rev() {
            for (p, id) in frame.bindings.iter().rev() {
                if p.as_slice() == prefix {
                    return Some(*id);
                }
            }
        }
        None
    }

    /// Number of distinct uri strings interned (excluding the id-0 slot).
    pub fn uri_count(&self) -> usize {
        self.uris.len() - 1
    }

    /// Iterate over interned uri strings in id order, excluding the id-0
    /// ("no namespace") slot.
    pub fn uris(&self) -> impl Iterator<Item = &[u8]> {
        self.uris[1..].iter().map(|v| v.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unprefixed_name_resolves_to_zero() {
        let ns = NsScope::new();
        assert_eq!(ns.uri(b"plain", true), Some(0));
    }

    #[test]
    fn reserved_xml_prefix_resolves_without_binding() {
        let ns = NsScope::new();
        assert_eq!(ns.uri(b"xml:lang", true), Some(0));
    }

    #[test]
    fn unbound_prefix_is_none() {
        let ns = NsScope::new();
        assert_eq!(ns.uri(b"p:x", false), None);
    }

    #[test]
    fn binding_resolves_within_scope_and_closes() {
        let mut ns = NsScope::new();
        ns.prepare(0);
        ns.add(b"p", b"urn:u").unwrap();
        assert_eq!(ns.uri(b"p:b", true), Some(1));
        ns.close(0);
        assert_eq!(ns.uri(b"p:b", true), None);
    }

    #[test]
    fn same_uri_interned_once() {
        let mut ns = NsScope::new();
        ns.prepare(0);
        ns.add(b"a", b"urn:u").unwrap();
        ns.add(b"b", b"urn:u").unwrap();
        assert_eq!(ns.uri_count(), 1);
        assert_eq!(ns.uri(b"a:x", true), ns.uri(b"b:x", true));
    }

    #[test]
    fn default_namespace_applies_to_unprefixed_elements_only() {
        let mut ns = NsScope::new();
        ns.prepare(0);
        ns.add(b"", b"urn:default").unwrap();
        assert_eq!(ns.uri(b"plain", true), Some(1));
        assert_eq!(ns.uri(b"plain", false), Some(0));
    }

    #[test]
    fn second_document_loses_binding_from_first() {
        // Two documents in one build: the second document's prefixed
        // attribute must not inherit a binding from the first.
        let mut ns = NsScope::new();
        ns.prepare(0); // doc 1's implicit frame
        ns.add(b"p", b"u").unwrap();
        ns.close(0); // doc 1 closes, its frame pops (pre 0 >= 0)
        assert_eq!(ns.uri(b"p:x", false), None);
    }
}
