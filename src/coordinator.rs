//! View Update Coordinator - Dirty flags, coalesced updates, propagation.
//!
//! A [`ViewUpdate`] is owned by its delegate view and refers back to it
//! weakly. It composes:
//!
//! - a [`DirtyFlagSet`] holding the view's pending categories,
//! - a [`KeyPathBindingTable`] turning property changes into dirt,
//! - an [`UpdateScheduler`] coalescing requests into one deferred update,
//! - a [`PropagationPolicy`] forwarding dirt to subviews or blocking it
//!   from the superview.
//!
//! # Flow
//!
//! ```text
//! property change → binding → set_dirty → flags
//!                                        → set_needs_update → next tick → update()
//!                                        → forward to subviews (unless they block)
//! update() → is_dirty(..) queries → view_did_update() clears flags
//! ```
//!
//! Everything runs on the host's UI thread; there is no locking.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, trace, warn};

use crate::config::ViewUpdateConfig;
use crate::engine::bindings::{KeyPathBinding, KeyPathBindingTable};
use crate::engine::dirty::DirtyFlagSet;
use crate::engine::propagation::PropagationPolicy;
use crate::engine::run_loop::{RunLoop, TickSource};
use crate::engine::scheduler::UpdateScheduler;
use crate::error::{Result, ViewUpdateError};
use crate::observe::ChangeHandler;
use crate::types::{DirtyType, InterfaceOrientation};
use crate::view::ViewUpdateDelegate;

/// Per-view update coordinator.
///
/// Owned by the delegate view, which attaches itself with
/// [`set_delegate`](Self::set_delegate) and reads flags from its `update()`.
pub struct ViewUpdate {
    delegate: RefCell<Option<Weak<dyn ViewUpdateDelegate>>>,
    interface_orientation: Cell<InterfaceOrientation>,
    flags: DirtyFlagSet,
    bindings: KeyPathBindingTable,
    scheduler: UpdateScheduler,
    propagation: PropagationPolicy,
    tick_source: Rc<dyn TickSource>,
    initial_dirty: DirtyType,
    default_bindings: Vec<KeyPathBinding>,
    /// Update passes run, deferred and immediate.
    updates: Cell<u64>,
}

impl Default for ViewUpdate {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ViewUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewUpdate")
            .field("has_delegate", &self.delegate().is_some())
            .field("interface_orientation", &self.interface_orientation.get())
            .field("flags", &self.flags)
            .field("bindings", &self.bindings)
            .field("scheduler", &self.scheduler)
            .field("propagation", &self.propagation)
            .field("updates", &self.updates.get())
            .finish()
    }
}

impl ViewUpdate {
    pub fn new() -> Self {
        Self::with_config(ViewUpdateConfig::default())
    }

    pub fn with_config(config: ViewUpdateConfig) -> Self {
        Self {
            delegate: RefCell::new(None),
            interface_orientation: Cell::new(config.interface_orientation),
            flags: DirtyFlagSet::new(),
            bindings: KeyPathBindingTable::new(),
            scheduler: UpdateScheduler::new(),
            propagation: PropagationPolicy::new(config.forward, config.block),
            tick_source: config.tick_source.unwrap_or_else(|| Rc::new(RunLoop)),
            initial_dirty: config.initial_dirty,
            default_bindings: config.default_bindings,
            updates: Cell::new(0),
        }
    }

    // =========================================================================
    // Delegate
    // =========================================================================

    /// Attach the view that owns this coordinator.
    ///
    /// Only a weak reference is kept; the view owns the coordinator.
    pub fn set_delegate<D: ViewUpdateDelegate + 'static>(&self, delegate: &Rc<D>) {
        let weak = Rc::downgrade(delegate);
        let weak: Weak<dyn ViewUpdateDelegate> = weak;
        *self.delegate.borrow_mut() = Some(weak);
    }

    /// The delegate view, if it is still alive.
    pub fn delegate(&self) -> Option<Rc<dyn ViewUpdateDelegate>> {
        self.delegate.borrow().as_ref().and_then(|weak| weak.upgrade())
    }

    fn weak_delegate(&self) -> Option<Weak<dyn ViewUpdateDelegate>> {
        self.delegate.borrow().clone()
    }

    // =========================================================================
    // Lifecycle hooks
    // =========================================================================

    /// Called once by the delegate view after it finished initializing.
    ///
    /// Installs the configured default bindings and marks the initial dirty
    /// categories, scheduling the first update.
    pub fn view_did_init(&self) -> Result<()> {
        for binding in &self.default_bindings {
            self.bind(binding.clone())?;
        }
        debug!(
            bindings = self.default_bindings.len(),
            initial = ?self.initial_dirty,
            "view did init"
        );
        self.set_dirty(self.initial_dirty);
        Ok(())
    }

    /// Called by the delegate view at the end of its `update()`.
    pub fn view_did_update(&self) {
        self.flags.clear_all();
    }

    // =========================================================================
    // Dirty flags
    // =========================================================================

    /// Whether any category in `dirty_type` is set.
    pub fn is_dirty(&self, dirty_type: DirtyType) -> bool {
        self.flags.is_dirty(dirty_type)
    }

    /// Mark `dirty_type` and schedule a coalesced update.
    pub fn set_dirty(&self, dirty_type: DirtyType) {
        self.set_dirty_with(dirty_type, false);
    }

    /// Mark `dirty_type`, updating synchronously if `update_immediately`.
    ///
    /// Scheduling happens even when nothing new became dirty. Categories in
    /// the forward mask are then re-declared on participating subviews.
    pub fn set_dirty_with(&self, dirty_type: DirtyType, update_immediately: bool) {
        self.flags.mark(dirty_type);

        if update_immediately && !self.flags.in_pass() {
            self.update_now();
        } else {
            // Inside a pass an immediate update could not see the new
            // flags, so they wait for the next cycle.
            self.set_needs_update();
        }

        self.forward_to_subviews(dirty_type, update_immediately);
    }

    /// Mark a type-erased dirty value.
    ///
    /// Fails without marking anything if the value does not unbox to a
    /// [`DirtyType`].
    pub fn set_dirty_object(&self, object: &dyn Any) -> Result<()> {
        self.set_dirty_object_with(object, false)
    }

    /// [`set_dirty_object`](Self::set_dirty_object) with explicit immediacy.
    pub fn set_dirty_object_with(&self, object: &dyn Any, update_immediately: bool) -> Result<()> {
        let dirty_type = DirtyType::from_object(object)?;
        self.set_dirty_with(dirty_type, update_immediately);
        Ok(())
    }

    /// Union of the categories currently visible to `update()`.
    pub fn dirty_flags(&self) -> DirtyType {
        self.flags.flags()
    }

    // =========================================================================
    // Scheduling
    // =========================================================================

    /// Schedule one deferred `update()` on the delegate.
    ///
    /// Repeated calls before it fires are no-ops. Without a live delegate
    /// there is nothing to update and nothing is scheduled.
    pub fn set_needs_update(&self) {
        let Some(weak) = self.weak_delegate() else {
            trace!("no delegate, update not scheduled");
            return;
        };
        self.scheduler.request(self.tick_source.as_ref(), move || {
            match weak.upgrade() {
                Some(delegate) => delegate.update_delegate().fire(delegate.as_ref()),
                None => trace!("delegate released, pending update skipped"),
            }
        });
    }

    pub fn is_update_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    /// Update passes run so far.
    pub fn update_count(&self) -> u64 {
        self.updates.get()
    }

    /// Deferred cycles fired so far.
    pub fn deferred_cycle_count(&self) -> u64 {
        self.scheduler.cycles()
    }

    fn fire(&self, delegate: &dyn ViewUpdateDelegate) {
        self.scheduler.begin_cycle();
        self.run_update(delegate);
    }

    fn update_now(&self) {
        match self.delegate() {
            Some(delegate) => self.run_update(delegate.as_ref()),
            None => trace!("no delegate, immediate update skipped"),
        }
    }

    fn run_update(&self, delegate: &dyn ViewUpdateDelegate) {
        self.updates.set(self.updates.get() + 1);
        trace!(flags = ?self.flags.flags(), "running update");
        self.flags.begin_pass();
        delegate.update();
        self.flags.end_pass();
    }

    // =========================================================================
    // Propagation
    // =========================================================================

    /// Categories re-declared on subviews.
    pub fn auto_forward_mask(&self) -> DirtyType {
        self.propagation.forward_mask()
    }

    /// Replace the forward mask. Applies to later declarations only.
    pub fn set_auto_forward_mask(&self, mask: DirtyType) {
        self.propagation.set_forward_mask(mask);
    }

    /// Categories discarded when forwarded from the superview.
    pub fn auto_block_mask(&self) -> DirtyType {
        self.propagation.block_mask()
    }

    /// Replace the block mask. Applies to later forwarded calls only.
    pub fn set_auto_block_mask(&self, mask: DirtyType) {
        self.propagation.set_block_mask(mask);
    }

    /// Accept a declaration forwarded from the superview.
    ///
    /// Blocked categories are dropped; if nothing remains the call is
    /// discarded entirely.
    pub fn receive_forwarded(&self, dirty_type: DirtyType, update_immediately: bool) {
        let accepted = self.propagation.accepted(dirty_type);
        let blocked = dirty_type.difference(accepted);
        if !blocked.is_empty() {
            debug!(blocked = ?blocked, "forwarded update blocked");
        }
        if accepted.is_empty() {
            return;
        }
        self.set_dirty_with(accepted, update_immediately);
    }

    /// Categories the superview forwards that this view would accept.
    pub fn forwarded_from_superview(&self) -> DirtyType {
        let Some(superview) = self.delegate().and_then(|d| d.superview()) else {
            return DirtyType::NONE;
        };
        match superview.as_update_delegate() {
            Some(parent) => {
                let forward = parent.update_delegate().auto_forward_mask();
                self.propagation.accepted(forward)
            }
            None => DirtyType::NONE,
        }
    }

    fn forward_to_subviews(&self, dirty_type: DirtyType, update_immediately: bool) {
        let forwarded = self.propagation.forwarded(dirty_type);
        if forwarded.is_empty() {
            return;
        }
        let Some(delegate) = self.delegate() else {
            return;
        };
        for subview in delegate.subviews() {
            match subview.as_update_delegate() {
                Some(child) => {
                    trace!(forwarded = ?forwarded, "forwarding to subview");
                    child
                        .update_delegate()
                        .receive_forwarded(forwarded, update_immediately);
                }
                None => trace!("subview does not take updates, skipped"),
            }
        }
    }

    // =========================================================================
    // Interface orientation
    // =========================================================================

    pub fn interface_orientation(&self) -> InterfaceOrientation {
        self.interface_orientation.get()
    }

    /// Store a new orientation and mark `ORIENTATION` dirty.
    ///
    /// When `ORIENTATION` is forwarded, subviews that do not block it
    /// receive the new orientation too.
    pub fn set_interface_orientation(&self, orientation: InterfaceOrientation) {
        if self.interface_orientation.replace(orientation) == orientation {
            return;
        }
        debug!(?orientation, "interface orientation changed");
        self.flags.mark(DirtyType::ORIENTATION);
        self.set_needs_update();

        if !self.propagation.forwards(DirtyType::ORIENTATION) {
            return;
        }
        let Some(delegate) = self.delegate() else {
            return;
        };
        for subview in delegate.subviews() {
            if let Some(child) = subview.as_update_delegate() {
                if child
                    .update_delegate()
                    .propagation
                    .blocks(DirtyType::ORIENTATION)
                {
                    debug!("forwarded orientation blocked");
                    continue;
                }
                child.set_interface_orientation(orientation);
            }
        }
    }

    // =========================================================================
    // Key path bindings
    // =========================================================================

    /// Mark `dirty_type` whenever the delegate's `key_path` changes.
    ///
    /// Mapping more categories to the same key path adds to the existing
    /// ones. An unknown key path fails here, not when the value changes.
    pub fn map_key_path(&self, key_path: &str, dirty_type: DirtyType) -> Result<()> {
        self.map_key_path_with(key_path, dirty_type, false)
    }

    /// [`map_key_path`](Self::map_key_path) with explicit immediacy.
    pub fn map_key_path_with(
        &self,
        key_path: &str,
        dirty_type: DirtyType,
        update_immediately: bool,
    ) -> Result<()> {
        let mut binding = KeyPathBinding::new(key_path, dirty_type);
        binding.update_immediately = update_immediately;
        self.bind(binding)
    }

    /// Remove all bindings on `key_path` and stop observing it.
    ///
    /// Unmapped key paths are ignored.
    pub fn unmap_key_path(&self, key_path: &str) {
        self.bindings.unbind(key_path);
    }

    /// Key paths with at least one binding, sorted.
    pub fn mapped_key_paths(&self) -> Vec<String> {
        self.bindings.key_paths()
    }

    pub fn bindings_for(&self, key_path: &str) -> Vec<KeyPathBinding> {
        self.bindings.bindings_for(key_path)
    }

    fn bind(&self, binding: KeyPathBinding) -> Result<()> {
        let weak = self.weak_delegate().ok_or(ViewUpdateError::DelegateReleased)?;
        let delegate = weak.upgrade().ok_or(ViewUpdateError::DelegateReleased)?;
        let key_path = binding.key_path.clone();

        self.bindings.bind(binding, || {
            let observed = key_path.clone();
            let on_change: ChangeHandler = Rc::new(move || {
                let Some(delegate) = weak.upgrade() else {
                    warn!(key_path = %observed, "key path changed after delegate was released");
                    return;
                };
                let view_update = delegate.update_delegate();
                if let Some(effect) = view_update.bindings.resolve(&observed) {
                    trace!(key_path = %observed, dirty_type = ?effect.dirty_type, "key path changed");
                    view_update.set_dirty_with(effect.dirty_type, effect.update_immediately);
                }
            });
            delegate.observe_key_path(&key_path, on_change)
        })
    }
}
