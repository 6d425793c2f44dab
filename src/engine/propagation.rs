//! Propagation Policy - Per-category forwarding and blocking masks.
//!
//! - **forward**: categories a view re-declares on its participating
//!   subviews after marking itself dirty.
//! - **block**: categories a view discards when they arrive forwarded from
//!   its superview.
//!
//! Both default to `NONE`. Categories are evaluated independently, so a
//! composite declaration can be partly forwarded and partly blocked.

use std::cell::Cell;

use crate::types::DirtyType;

#[derive(Debug, Default)]
pub struct PropagationPolicy {
    forward: Cell<DirtyType>,
    block: Cell<DirtyType>,
}

impl PropagationPolicy {
    pub fn new(forward: DirtyType, block: DirtyType) -> Self {
        Self {
            forward: Cell::new(forward),
            block: Cell::new(block),
        }
    }

    pub fn forward_mask(&self) -> DirtyType {
        self.forward.get()
    }

    pub fn set_forward_mask(&self, mask: DirtyType) {
        self.forward.set(mask);
    }

    pub fn block_mask(&self) -> DirtyType {
        self.block.get()
    }

    pub fn set_block_mask(&self, mask: DirtyType) {
        self.block.set(mask);
    }

    /// Part of `dirty_type` to re-declare on subviews.
    pub fn forwarded(&self, dirty_type: DirtyType) -> DirtyType {
        dirty_type & self.forward.get()
    }

    /// Part of a forwarded `dirty_type` this view accepts.
    pub fn accepted(&self, dirty_type: DirtyType) -> DirtyType {
        dirty_type.difference(self.block.get())
    }

    pub fn forwards(&self, dirty_type: DirtyType) -> bool {
        !self.forwarded(dirty_type).is_empty()
    }

    pub fn blocks(&self, dirty_type: DirtyType) -> bool {
        self.block.get().contains(dirty_type) && !dirty_type.is_empty()
    }
}
