//! Dirty Flag Set - The union of pending work categories for one view.
//!
//! Mutated only through `mark()` and `clear_all()`; read through `is_dirty()`.
//! Interior mutability lets the host's `update()` query flags while the
//! coordinator that owns them is itself borrowed.
//!
//! # Update passes
//!
//! While an update pass is running, the flags it reads stay fixed: marks
//! made during the pass are held back and merged in when the pass ends, so
//! they are honored by the next cycle instead of being wiped by the
//! pass's own `clear_all()`.

use std::cell::Cell;

use tracing::trace;

use crate::types::DirtyType;

/// Currently active dirty categories.
#[derive(Debug, Default)]
pub struct DirtyFlagSet {
    flags: Cell<DirtyType>,
    /// Marks made during a pass, merged by `end_pass()`.
    deferred: Cell<DirtyType>,
    passes: Cell<u32>,
}

impl DirtyFlagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Union `dirty_type` into the set.
    ///
    /// Returns the categories that were newly added (empty when everything
    /// was already dirty).
    pub fn mark(&self, dirty_type: DirtyType) -> DirtyType {
        let target = if self.in_pass() {
            &self.deferred
        } else {
            &self.flags
        };
        let current = target.get();
        let added = dirty_type.difference(current);
        if !added.is_empty() {
            target.set(current | dirty_type);
            trace!(added = ?added, deferred = self.in_pass(), "dirty flags marked");
        }
        added
    }

    /// True if any bit of `dirty_type` is set.
    ///
    /// A composite query is dirty when at least one of its categories is.
    /// Querying `NONE` is never dirty.
    pub fn is_dirty(&self, dirty_type: DirtyType) -> bool {
        self.flags.get().intersects(dirty_type)
    }

    /// Reset the visible flags to `NONE`.
    ///
    /// Marks held back by a running pass are kept.
    pub fn clear_all(&self) {
        self.flags.set(DirtyType::NONE);
    }

    /// Snapshot of the visible union.
    pub fn flags(&self) -> DirtyType {
        self.flags.get()
    }

    pub fn in_pass(&self) -> bool {
        self.passes.get() > 0
    }

    /// An update pass starts reading the flags. Passes may nest.
    pub fn begin_pass(&self) {
        self.passes.set(self.passes.get() + 1);
    }

    /// The outermost pass has finished: held-back marks become visible.
    pub fn end_pass(&self) {
        let depth = self.passes.get().saturating_sub(1);
        self.passes.set(depth);
        if depth == 0 {
            self.flags.set(self.flags.get() | self.deferred.replace(DirtyType::NONE));
        }
    }
}
