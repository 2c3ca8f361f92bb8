//! Snapshots of the build-wide dictionaries (the `meta`/`names`/`ns`/`path`
//! files): enough for a built database directory to describe itself, and for
//! a build's own tests to round-trip those dictionaries without re-parsing.
//! Decoding a `Document`'s row table itself -- query/update access to a built
//! database -- stays out of scope; only the four side files round-trip here.

use crate::error::Result;
use crate::meta::Meta;
use crate::names::NameDict;
use crate::nsscope::NsScope;
use crate::pathsum::PathSummary;
use crate::row::Kind;
use crate::sink::{read_num, read_num64, read_token, ByteSink};
use std::io::Write;

/// Write the build counters.
pub fn write_meta<W: Write>(sink: &mut ByteSink<W>, meta: &Meta) -> Result<()> {
    sink.write_num(meta.size)?;
    sink.write_num(meta.ndocs)?;
    sink.write_num(meta.lastid)?;
    sink.write_num64(meta.filesize)?;
    sink.write_token(meta.encoding.as_bytes())?;
    Ok(())
}

/// Write one name dictionary: a count followed by, for each name in id
/// order, its bytes and statistics.
pub fn write_names<W: Write>(sink: &mut ByteSink<W>, dict: &NameDict) -> Result<()> {
    let len = dict.len();
    sink.write_num(len as u32)?;
    for id in 1..=(len as u16) {
        let stat = dict.stat(id);
        sink.write_token(&stat.name)?;
        sink.write_num64(stat.count)?;
        sink.write_num64(stat.value_len_sum)?;
        sink.write_num64(stat.value_count)?;
        sink.write_num(stat.value_len_min)?;
        sink.write_num(stat.value_len_max)?;
        sink.write_u8(stat.leaf as u8)?;
    }
    Ok(())
}

/// Write both name dictionaries (elements, then attributes) into one sink.
pub fn write_names_pair<W: Write>(sink: &mut ByteSink<W>, elem_names: &NameDict, attr_names: &NameDict) -> Result<()> {
    write_names(sink, elem_names)?;
    write_names(sink, attr_names)
}

/// Write the interned namespace uri table.
pub fn write_ns<W: Write>(sink: &mut ByteSink<W>, ns: &NsScope) -> Result<()> {
    sink.write_num(ns.uri_count() as u32)?;
    for uri in ns.uris() {
        sink.write_token(uri)?;
    }
    Ok(())
}

/// Write the path summary: a count followed by, for each distinct path, its
/// key and aggregate stats.
pub fn write_paths<W: Write>(sink: &mut ByteSink<W>, paths: &PathSummary) -> Result<()> {
    sink.write_num(paths.len() as u32)?;
    for (key, stat) in paths.iter() {
        sink.write_num(key.name_id as u32)?;
        sink.write_u8(key.kind as u8)?;
        sink.write_num(key.depth)?;
        sink.write_num64(stat.count)?;
        sink.write_num64(stat.value_len_sum)?;
        sink.write_num64(stat.value_count)?;
    }
    Ok(())
}

/// Decoded form of a `meta` snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaSnapshot {
    pub size: u32,
    pub ndocs: u32,
    pub lastid: u32,
    pub filesize: u64,
    pub encoding: Vec<u8>,
}

/// Decode a `meta` snapshot written by [`write_meta`].
pub fn read_meta(data: &[u8]) -> MetaSnapshot {
    let mut i = 0;
    let (size, c) = read_num(&data[i..]);
    i += c;
    let (ndocs, c) = read_num(&data[i..]);
    i += c;
    let (lastid, c) = read_num(&data[i..]);
    i += c;
    let (filesize, c) = read_num64(&data[i..]);
    i += c;
    let (encoding, _) = read_token(&data[i..]);
    MetaSnapshot {
        size,
        ndocs,
        lastid,
        filesize,
        encoding: encoding.to_vec(),
    }
}

/// Decoded form of one name-dictionary entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameSnapshot {
    pub name: Vec<u8>,
    pub count: u64,
    pub value_len_sum: u64,
    pub value_count: u64,
    pub value_len_min: u32,
    pub value_len_max: u32,
    pub leaf: bool,
}

/// Decode one name dictionary written by [`write_names`]. Returns the
/// entries (in id order) and the number of bytes consumed.
pub fn read_names(data: &[u8]) -> (Vec<NameSnapshot>, usize) {
    let mut i = 0;
    let (len, c) = read_num(&data[i..]);
    i += c;
    let mut out = Vec::with_capacity(len as usize);
    for _ in 0..len {
        let (name, c) = read_token(&data[i..]);
        i += c;
        let (count, c) = read_num64(&data[i..]);
        i += c;
        let (value_len_sum, c) = read_num64(&data[i..]);
        i += c;
        let (value_count, c) = read_num64(&data[i..]);
        i += c;
        let (value_len_min, c) = read_num(&data[i..]);
        i += c;
        let (value_len_max, c) = read_num(&data[i..]);
        i += c;
        let leaf = data[i] != 0;
        i += 1;
        out.push(NameSnapshot {
            name: name.to_vec(),
            count,
            value_len_sum,
            value_count,
            value_len_min,
            value_len_max,
            leaf,
        });
    }
    (out, i)
}

/// Decode both name dictionaries (elements, then attributes) written by
/// [`write_names_pair`].
pub fn read_names_pair(data: &[u8]) -> (Vec<NameSnapshot>, Vec<NameSnapshot>) {
    let (elem_names, consumed) = read_names(data);
    let (attr_names, _) = read_names(&data[consumed..]);
    (elem_names, attr_names)
}

/// Decode the interned namespace uri table written by [`write_ns`].
pub fn read_ns(data: &[u8]) -> Vec<Vec<u8>> {
    let mut i = 0;
    let (count, c) = read_num(&data[i..]);
    i += c;
    let mut out = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let (tok, c) = read_token(&data[i..]);
        i += c;
        out.push(tok.to_vec());
    }
    out
}

/// Decoded form of one path-summary entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSnapshot {
    pub name_id: u16,
    pub kind: Kind,
    pub depth: u32,
    pub count: u64,
    pub value_len_sum: u64,
    pub value_count: u64,
}

/// Decode the path summary written by [`write_paths`].
pub fn read_paths(data: &[u8]) -> Vec<PathSnapshot> {
    let mut i = 0;
    let (count, c) = read_num(&data[i..]);
    i += c;
    let mut out = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let (name_id, c) = read_num(&data[i..]);
        i += c;
        let kind = Kind::from_tag(data[i]);
        i += 1;
        let (depth, c) = read_num(&data[i..]);
        i += c;
        let (path_count, c) = read_num64(&data[i..]);
        i += c;
        let (value_len_sum, c) = read_num64(&data[i..]);
        i += c;
        let (value_count, c) = read_num64(&data[i..]);
        i += c;
        out.push(PathSnapshot {
            name_id: name_id as u16,
            kind,
            depth,
            count: path_count,
            value_len_sum,
            value_count,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Limit;
    use crate::row::Kind;

    #[test]
    fn meta_snapshot_round_trips() {
        let mut sink = ByteSink::new(Vec::new(), 4096);
        let mut meta = Meta::new();
        meta.record_row(16);
        meta.record_doc();
        write_meta(&mut sink, &meta).unwrap();
        let buf = sink.into_inner().unwrap();
        let decoded = read_meta(&buf);
        assert_eq!(decoded.size, meta.size);
        assert_eq!(decoded.ndocs, meta.ndocs);
        assert_eq!(decoded.lastid, meta.lastid);
        assert_eq!(decoded.filesize, meta.filesize);
        assert_eq!(decoded.encoding, meta.encoding.as_bytes());
    }

    #[test]
    fn names_snapshot_round_trips_every_entry() {
        let mut dict = NameDict::new(Limit::Elems);
        dict.index(b"a", None).unwrap();
        dict.index(b"b", Some(b"hi")).unwrap();
        dict.index(b"b", Some(b"longer value")).unwrap();
        let mut sink = ByteSink::new(Vec::new(), 4096);
        write_names(&mut sink, &dict).unwrap();
        let buf = sink.into_inner().unwrap();
        let (decoded, consumed) = read_names(&buf);
        assert_eq!(consumed, buf.len());
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].name, b"a");
        assert_eq!(decoded[0].count, 1);
        assert_eq!(decoded[1].name, b"b");
        assert_eq!(decoded[1].count, 2);
        assert_eq!(decoded[1].value_len_min, 2);
        assert_eq!(decoded[1].value_len_max, 12);
        assert!(decoded[1].leaf);
    }

    #[test]
    fn names_pair_snapshot_round_trips_both_dictionaries() {
        let mut elem_names = NameDict::new(Limit::Elems);
        elem_names.index(b"root", None).unwrap();
        let mut attr_names = NameDict::new(Limit::Atts);
        attr_names.index(b"id", Some(b"7")).unwrap();
        let mut sink = ByteSink::new(Vec::new(), 4096);
        write_names_pair(&mut sink, &elem_names, &attr_names).unwrap();
        let buf = sink.into_inner().unwrap();
        let (elems, attrs) = read_names_pair(&buf);
        assert_eq!(elems.len(), 1);
        assert_eq!(elems[0].name, b"root");
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].name, b"id");
    }

    #[test]
    fn ns_snapshot_round_trips_excluding_the_no_namespace_slot() {
        let mut ns = NsScope::new();
        ns.prepare(0);
        ns.add(b"p", b"urn:example").unwrap();
        let mut sink = ByteSink::new(Vec::new(), 4096);
        write_ns(&mut sink, &ns).unwrap();
        let buf = sink.into_inner().unwrap();
        let decoded = read_ns(&buf);
        assert_eq!(decoded, vec![b"urn:example".to_vec()]);
    }

    #[test]
    fn path_snapshot_round_trips_every_entry() {
        let mut paths = PathSummary::new();
        paths.put(1, Kind::Elem, 1, None);
        paths.put(2, Kind::Attr, 2, Some(b"v"));
        let mut sink = ByteSink::new(Vec::new(), 4096);
        write_paths(&mut sink, &paths).unwrap();
        let buf = sink.into_inner().unwrap();
        let decoded = read_paths(&buf);
        assert_eq!(decoded.len(), 2);
        let elem_entry = decoded.iter().find(|e| e.kind == Kind::Elem).unwrap();
        assert_eq!(elem_entry.name_id, 1);
        assert_eq!(elem_entry.depth, 1);
        assert_eq!(elem_entry.count, 1);
        let attr_entry = decoded.iter().find(|e| e.kind == Kind::Attr).unwrap();
        assert_eq!(attr_entry.name_id, 2);
        assert_eq!(attr_entry.value_count, 1);
        assert_eq!(attr_entry.value_len_sum, 1);
    }
}
