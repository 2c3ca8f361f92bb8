//! Lock-free progress view: readable from another thread while the
//! builder runs on its own. Reads are advisory and need not observe a
//! consistent snapshot; they only need to be safe against torn primitives,
//! hence plain atomics for the hot-path counters -- the same split used by
//! `paritytech-parity-common`'s `kvdb-rocksdb` stats (`AtomicU64` counters,
//! a lock only around the rarely-touched label).

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Build-phase progress, safe to read from another thread.
pub struct Progress {
    /// Pending size-patch pairs processed so far (post-pass only).
    spos: AtomicU64,
    /// Total pending size-patch pairs (post-pass only).
    ssize: AtomicU64,
    /// Human readable phase label, e.g. "parsing", "patching sizes".
    detail: RwLock<String>,
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

impl Progress {
    /// Construct a fresh progress view in the "parsing" phase.
    pub fn new() -> Self {
        Progress {
            spos: AtomicU64::new(0),
            ssize: AtomicU64::new(0),
            detail: RwLock::new("parsing".to_string()),
        }
    }

    /// Set the human-readable phase label.
    pub fn set_detail(&self, detail: &str) {
        *self.detail.write() = detail.to_string();
    }

    /// The title of the current build (fixed: there is exactly one kind of
    /// work this crate performs).
    pub fn title(&self) -> &'static str {
        "building database"
    }

    /// The current phase label.
    pub fn detail(&self) -> String {
        self.detail.read().clone()
    }

    /// Record the total number of pending size-patch pairs, entering the
    /// post-pass phase.
    pub fn begin_patch(&self, total: u64) {
        self.ssize.store(total, Ordering::Relaxed);
        self.spos.store(0, Ordering::Relaxed);
        self.set_detail("patching sizes");
    }

    /// Record one size-patch pair applied.
    pub fn patch_tick(&self) {
        self.spos.fetch_add(1, Ordering::Relaxed);
    }

    /// Fraction complete in `[0, 1]`. During parsing this is always `0.0`
    /// (the driving parser owns its own progress notion, out of scope here);
    /// during the post-pass it is `spos / ssize`.
    pub fn progress(&self) -> f64 {
        let total = self.ssize.load(Ordering::Relaxed);
        if total == 0 {
            0.0
        } else {
            self.spos.load(Ordering::Relaxed) as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_progress_advances() {
        let p = Progress::new();
        p.begin_patch(4);
        assert_eq!(p.progress(), 0.0);
        p.patch_tick();
        p.patch_tick();
        assert_eq!(p.progress(), 0.5);
        assert_eq!(p.detail(), "patching sizes");
    }

    #[test]
    fn zero_total_is_zero_progress() {
        let p = Progress::new();
        assert_eq!(p.progress(), 0.0);
    }
}
