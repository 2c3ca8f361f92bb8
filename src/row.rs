//! The 16-byte row layout and the 40-bit text-ref codec.

use crate::util::{get, getu16, getu32, getu40, set, setu16, setu32, setu40};

/// Fixed size of a table row, in bytes.
pub const ROW_SIZE: usize = 16;

/// Maximum number of attributes recorded on one element (5-bit field).
pub const MAX_ATTS: u32 = 0x1F;

/// High bit of the 40-bit text-ref field: payload is an inlined integer.
pub const OFFNUM: u64 = 1 << 39;

/// High bit of the 40-bit text-ref field: payload is a compressed offset.
pub const OFFCOMP: u64 = 1 << 38;

/// Mask isolating the lower-bit payload of a text-ref, below both flag bits.
const OFF_PAYLOAD_MASK: u64 = (1 << 38) - 1;

/// Node kind, stored in the low 3 bits of row byte 0 (and, for ELEM, mixed
/// with `asize`; for ATTR, mixed with `dist`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Document root.
    Doc = 0,
    /// Element.
    Elem = 1,
    /// Text node.
    Text = 2,
    /// Attribute.
    Attr = 3,
    /// Comment.
    Comm = 4,
    /// Processing instruction.
    Pi = 5,
}

impl Kind {
    /// Recover a `Kind` from the low 3 bits of row byte 0.
    pub fn from_tag(tag: u8) -> Kind {
        match tag & 0x07 {
            0 => Kind::Doc,
            1 => Kind::Elem,
            2 => Kind::Text,
            3 => Kind::Attr,
            4 => Kind::Comm,
            5 => Kind::Pi,
            other => panic!("invalid row kind tag {other}"),
        }
    }
}

/// A 40-bit text/value reference: either an inlined integer, a compressed
/// side-file offset, or a raw side-file offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRef {
    /// A simple integer literal, inlined directly (no side-file storage).
    Inline(i32),
    /// Byte offset of a compressed token in the side file.
    Compressed(u64),
    /// Byte offset of a raw (uncompressed) token in the side file.
    Raw(u64),
}

impl TextRef {
    /// Pack into the 40-bit field representation.
    pub fn encode(self) -> u64 {
        match self {
            TextRef::Inline(v) => OFFNUM | (v as u32 as u64 & OFF_PAYLOAD_MASK),
            TextRef::Compressed(off) => {
                debug_assert!(off < OFFCOMP);
                OFFCOMP | off
            }
            TextRef::Raw(off) => {
                debug_assert!(off < OFFCOMP);
                off
            }
        }
    }

    /// Unpack from the 40-bit field representation.
    pub fn decode(field: u64) -> TextRef {
        if field & OFFNUM != 0 {
            TextRef::Inline((field & OFF_PAYLOAD_MASK) as u32 as i32)
        } else if field & OFFCOMP != 0 {
            TextRef::Compressed(field & OFF_PAYLOAD_MASK)
        } else {
            TextRef::Raw(field & OFF_PAYLOAD_MASK)
        }
    }
}

/// Encode the sentinel-aware "does this parse as a simple 31-bit integer"
/// check (boundary: `"-2147483648"` must never be inlined).
///
/// Returns `Some(v)` iff `s` is a base-10 integer literal that fits in 31
/// bits of magnitude (`i32::MIN` itself is excluded: it is the sentinel
/// `to_simple_int` uses internally in the source system to mean "not an
/// int", and this crate preserves that exclusion rather than risk ever
/// mistaking a real `i32::MIN` value for a parse failure).
pub fn to_simple_int(s: &[u8]) -> Option<i32> {
    let text = std::str::from_utf8(s).ok()?;
    let v: i64 = text.parse().ok()?;
    if v == i32::MIN as i64 {
        return None;
    }
    if v >= i32::MIN as i64 + 1 && v <= i32::MAX as i64 {
        Some(v as i32)
    } else {
        None
    }
}

/// Outcome of classifying a candidate text/attribute-value payload: either it
/// inlines as a plain integer, or it needs side-file storage, possibly
/// compressed. Shared by the disk and memory back-ends so the inlining and
/// compression policy lives in exactly one place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextPlan {
    /// Inlines directly into the row; nothing is written to a side file.
    Inline(i32),
    /// Needs side-file storage. `bytes` is what should be written verbatim;
    /// `compressed` says whether it is the compressed form of the value.
    Store {
        /// Bytes to append to the side file.
        bytes: Vec<u8>,
        /// True if `bytes` is the compressed form of the original value.
        compressed: bool,
    },
}

/// Classify `value`: try to inline it as a simple integer first; otherwise
/// optionally compress it for side-file storage.
pub fn plan_text(value: &[u8], compress: bool) -> TextPlan {
    if let Some(v) = to_simple_int(value) {
        return TextPlan::Inline(v);
    }
    if compress {
        let (packed, compressed) = crate::compress::compress(value);
        TextPlan::Store { bytes: packed, compressed }
    } else {
        TextPlan::Store { bytes: value.to_vec(), compressed: false }
    }
}

/// Write a DOC row.
pub fn write_doc(row: &mut [u8; ROW_SIZE], text_ref: u64, pre: u32) {
    row[0] = 0;
    setu16(row, 1, 0);
    setu40(row, 3, text_ref);
    setu32(row, 8, 0); // size placeholder
    setu32(row, 12, pre);
}

/// Write an ELEM row. `size` is whatever the caller currently has: `asize`
/// (the capped attribute-count hint) at first emission, overwritten later via
/// `set_size` by `close_elem`/`close_doc` with the true subtree size, or --
/// for a childless element whose true attribute count overflowed `asize`'s
/// cap -- by `empty_elem`'s own early patch.
#[allow(clippy::too_many_arguments)]
pub fn write_elem(row: &mut [u8; ROW_SIZE], asize: u32, has_ns: bool, name_id: u16, uri_id: u8, dist: u32, size: u32) {
    debug_assert!(asize <= MAX_ATTS);
    debug_assert!(name_id < 0x8000);
    row[0] = ((asize as u8) << 3) | 1;
    let ne = if has_ns { 1u16 } else { 0 };
    setu16(row, 1, (ne << 15) | name_id);
    row[3] = uri_id;
    row[4] = 0;
    row[5] = 0;
    row[6] = 0;
    row[7] = 0;
    setu32(row, 8, dist);
    setu32(row, 12, size);
}

/// Write an ATTR row.
pub fn write_attr(row: &mut [u8; ROW_SIZE], dist: u32, name_id: u16, value_ref: u64, uri_id: u8, pre: u32) {
    debug_assert!((1..=MAX_ATTS).contains(&dist));
    row[0] = ((dist as u8) << 3) | 3;
    setu16(row, 1, name_id);
    setu40(row, 3, value_ref);
    row[8] = uri_id;
    row[9] = 0;
    row[10] = 0;
    row[11] = 0;
    setu32(row, 12, pre);
}

/// Write a TEXT/COMM/PI row.
pub fn write_leaf(row: &mut [u8; ROW_SIZE], kind: Kind, text_ref: u64, dist: u32, pre: u32) {
    debug_assert!(matches!(kind, Kind::Text | Kind::Comm | Kind::Pi));
    row[0] = kind as u8;
    setu16(row, 1, 0);
    setu40(row, 3, text_ref);
    setu32(row, 8, dist);
    setu32(row, 12, pre);
}

/// Decoded view of a row, independent of kind-specific field reuse.
#[derive(Debug, Clone, Copy)]
pub struct RowView {
    /// Node kind.
    pub kind: Kind,
    /// `asize` for ELEM rows, `dist` for ATTR rows, unspecified otherwise.
    pub byte0_payload: u32,
    /// Name id (ELEM, ATTR) or 0.
    pub name_id: u16,
    /// True if the element carries new namespace bindings (ELEM only).
    pub has_ns: bool,
    /// Text/value reference (DOC, ATTR, TEXT, COMM, PI).
    pub text_ref: Option<TextRef>,
    /// Uri id (ELEM, ATTR) or 0.
    pub uri_id: u8,
    /// Distance to parent (ELEM, ATTR, TEXT, COMM, PI) or 0 for DOC.
    pub dist_or_size: u32,
    /// pre id (DOC, ATTR, TEXT, COMM, PI) -- not present for ELEM, whose
    /// bytes 12-15 hold the size instead.
    pub pre: Option<u32>,
}

/// Decode a row's kind-independent fields.
pub fn read_row(row: &[u8; ROW_SIZE]) -> RowView {
    let kind = Kind::from_tag(row[0]);
    match kind {
        Kind::Doc => RowView {
            kind,
            byte0_payload: 0,
            name_id: 0,
            has_ns: false,
            text_ref: Some(TextRef::decode(getu40(row, 3))),
            uri_id: 0,
            dist_or_size: getu32(row, 8),
            pre: Some(getu32(row, 12)),
        },
        Kind::Elem => {
            let asize = (row[0] >> 3) as u32;
            let field1 = getu16(row, 1);
            RowView {
                kind,
                byte0_payload: asize,
                name_id: field1 & 0x7fff,
                has_ns: field1 & 0x8000 != 0,
                text_ref: None,
                uri_id: row[3],
                dist_or_size: getu32(row, 8),
                pre: None,
            }
        }
        Kind::Attr => RowView {
            kind,
            byte0_payload: (row[0] >> 3) as u32,
            name_id: getu16(row, 1),
            has_ns: false,
            text_ref: Some(TextRef::decode(getu40(row, 3))),
            uri_id: row[8],
            dist_or_size: (row[0] >> 3) as u32,
            pre: Some(getu32(row, 12)),
        },
        Kind::Text | Kind::Comm | Kind::Pi => RowView {
            kind,
            byte0_payload: 0,
            name_id: 0,
            has_ns: false,
            text_ref: Some(TextRef::decode(getu40(row, 3))),
            uri_id: 0,
            dist_or_size: getu32(row, 8),
            pre: Some(getu32(row, 12)),
        },
    }
}

/// Read the size field of an ELEM/DOC row (bytes 12-15 for DOC, 12-15 for
/// ELEM too -- both use the last 4 bytes as the size/placeholder).
pub fn read_size(row: &[u8; ROW_SIZE]) -> u32 {
    getu32(row, 12)
}

/// Patch the size field of an ELEM/DOC row in place.
pub fn write_size(row: &mut [u8; ROW_SIZE], size: u32) {
    setu32(row, 12, size);
}

/// Extract an unsigned big-endian field of `n` bytes at `off`; exposed for
/// callers that need a field not covered by [`read_row`] (e.g. tests
/// poking at raw bytes).
pub fn field(row: &[u8; ROW_SIZE], off: usize, n: usize) -> u64 {
    get(row, off, n)
}

/// Inverse of [`field`].
pub fn set_field(row: &mut [u8; ROW_SIZE], off: usize, n: usize, val: u64) {
    set(row, off, val, n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_ref_inline_round_trip() {
        let tr = TextRef::Inline(42);
        let field = tr.encode();
        assert_eq!(field & OFFNUM, OFFNUM);
        assert_eq!(TextRef::decode(field), tr);
    }

    #[test]
    fn text_ref_negative_inline_round_trip() {
        let tr = TextRef::Inline(-17);
        let field = tr.encode();
        assert_eq!(TextRef::decode(field), tr);
    }

    #[test]
    fn text_ref_compressed_and_raw() {
        let c = TextRef::Compressed(12345);
        assert_eq!(TextRef::decode(c.encode()), c);
        let r = TextRef::Raw(98765);
        assert_eq!(TextRef::decode(r.encode()), r);
    }

    #[test]
    fn sentinel_is_not_inlined() {
        assert_eq!(to_simple_int(b"-2147483648"), None);
        assert_eq!(to_simple_int(b"-2147483647"), Some(-2147483647));
        assert_eq!(to_simple_int(b"2147483647"), Some(2147483647));
        assert_eq!(to_simple_int(b"not a number"), None);
        assert_eq!(to_simple_int(b"2147483648"), None); // overflows i32
    }

    #[test]
    fn elem_row_round_trip() {
        let mut row = [0u8; ROW_SIZE];
        write_elem(&mut row, 3, true, 0x1234, 7, 99, 0);
        let v = read_row(&row);
        assert_eq!(v.kind, Kind::Elem);
        assert_eq!(v.byte0_payload, 3);
        assert_eq!(v.name_id, 0x1234);
        assert!(v.has_ns);
        assert_eq!(v.uri_id, 7);
        assert_eq!(v.dist_or_size, 99);
    }

    #[test]
    fn plan_text_inlines_integers_and_stores_otherwise() {
        assert_eq!(plan_text(b"42", true), TextPlan::Inline(42));
        match plan_text(b"hello world", true) {
            TextPlan::Store { bytes, .. } => assert!(!bytes.is_empty()),
            TextPlan::Inline(_) => panic!("expected Store"),
        }
    }

    #[test]
    fn doc_row_round_trip() {
        let mut row = [0u8; ROW_SIZE];
        write_doc(&mut row, TextRef::Inline(5).encode(), 0);
        let v = read_row(&row);
        assert_eq!(v.kind, Kind::Doc);
        assert_eq!(v.text_ref, Some(TextRef::Inline(5)));
        assert_eq!(v.pre, Some(0));
    }
}
