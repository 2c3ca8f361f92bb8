//! Name dictionary (C3): dense element/attribute name ids, per-name value
//! statistics and leaf flags.

use crate::error::{BuildError, Limit, Result};
use rustc_hash::FxHashMap;

/// Dense name identifier, `1 <= id < 0x8000`.
pub type NameId = u16;

/// Hard capacity per dictionary (element names, attribute names).
pub const LIMIT: usize = 0x8000;

/// Per-name statistics: usage count, value-length histogram, leaf flag.
#[derive(Debug, Clone)]
pub struct NameStat {
    /// Name bytes.
    pub name: Vec<u8>,
    /// Number of times this name has been used.
    pub count: u64,
    /// Sum of value lengths seen for this name (attribute values, or element
    /// text content).
    pub value_len_sum: u64,
    /// Number of values contributing to `value_len_sum`.
    pub value_count: u64,
    /// Minimum value length seen, or `u32::MAX` if none seen yet.
    pub value_len_min: u32,
    /// Maximum value length seen.
    pub value_len_max: u32,
    /// True until a non-text child has been observed under an element of
    /// this name (element names only; always true for attribute names).
    pub leaf: bool,
}

impl NameStat {
    fn new(name: Vec<u8>) -> Self {
        NameStat {
            name,
            count: 0,
            value_len_sum: 0,
            value_count: 0,
            value_len_min: u32::MAX,
            value_len_max: 0,
            leaf: true,
        }
    }

    fn record_value(&mut self, value: &[u8]) {
        let len = value.len() as u32;
        self.value_len_sum += len as u64;
        self.value_count += 1;
        self.value_len_min = self.value_len_min.min(len);
        self.value_len_max = self.value_len_max.max(len);
    }
}

/// Maps names to dense ids, one dictionary each for element and attribute
/// names (capacities are tracked independently).
#[derive(Default)]
pub struct NameDict {
    by_name: FxHashMap<Vec<u8>, NameId>,
    stats: Vec<NameStat>, // index 0 unused; ids start at 1
    limit_err: Limit,
}

impl NameDict {
    /// Construct an empty dictionary. `limit_err` is the error variant to
    /// raise if capacity is exceeded (`Limit::Elems` or `Limit::Atts`).
    pub fn new(limit_err: Limit) -> Self {
        NameDict {
            by_name: FxHashMap::default(),
            stats: vec![NameStat::new(Vec::new())], // dummy slot 0
            limit_err,
        }
    }

    /// Look up or allocate a dense id for `name`. If `value` is given,
    /// updates the value-length histogram for this name.
    pub fn index(&mut self, name: &[u8], value: Option<&[u8]>) -> Result<NameId> {
        let id = if let Some(&id) = self.by_name.get(name) {
            id
        } else {
            if self.stats.len() >= LIMIT {
                return Err(BuildError::StructuralLimit(self.limit_err));
            }
            let id = self.stats.len() as NameId;
            self.stats.push(NameStat::new(name.to_vec()));
            self.by_name.insert(name.to_vec(), id);
            id
        };
        self.stats[id as usize].count += 1;
        if let Some(v) = value {
            self.stats[id as usize].record_value(v);
        }
        Ok(id)
    }

    /// Record a text-content sample against an already-known element name id
    /// (used for element text statistics, from `Builder::add_text_internal`).
    pub fn index_text(&mut self, name_id: NameId, value: &[u8]) {
        self.stats[name_id as usize].record_value(value);
    }

    /// Clear the leaf flag for `name_id` (a non-text child was observed).
    pub fn set_not_leaf(&mut self, name_id: NameId) {
        self.stats[name_id as usize].leaf = false;
    }

    /// Fetch the stats for a name id (panics if out of range: an internal
    /// invariant, never caller-facing).
    pub fn stat(&self, name_id: NameId) -> &NameStat {
        &self.stats[name_id as usize]
    }

    /// Number of distinct names recorded, including the unused id 0 slot.
    pub fn len(&self) -> usize {
        self.stats.len() - 1
    }

    /// True if no names have been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
