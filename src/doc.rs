//! Published build handle (A6): the read-only bundle returned once a build
//! completes successfully. Analogous to a `Database` struct bundling system
//! tables, but here with no query layer of its own -- inspection only.

use crate::builder::BuiltParts;
use crate::meta::Meta;
use crate::names::NameDict;
use crate::nsscope::NsScope;
use crate::pathsum::PathSummary;

/// Everything a successful build produces, besides the rows/side files
/// themselves (which live in whichever back-end produced them: on disk
/// under `BuildConfig::db_dir()`, or in a [`crate::memory::MemBack`]).
pub struct Document {
    /// Element name dictionary.
    pub elem_names: NameDict,
    /// Attribute name dictionary.
    pub attr_names: NameDict,
    /// Namespace uri dictionary.
    pub ns: NsScope,
    /// Path summary.
    pub paths: PathSummary,
    /// Build counters.
    pub meta: Meta,
}

impl From<BuiltParts> for Document {
    fn from(parts: BuiltParts) -> Self {
        Document {
            elem_names: parts.elem_names,
            attr_names: parts.attr_names,
            ns: parts.ns,
            paths: parts.paths,
            meta: parts.meta,
        }
    }
}

impl Document {
    /// Total number of rows written across all documents in this build.
    pub fn row_count(&self) -> u32 {
        self.meta.size
    }

    /// Number of top-level documents built.
    pub fn doc_count(&self) -> u32 {
        self.meta.ndocs
    }
}
