//! Host contract - What a view must provide to be coordinated.
//!
//! [`View`] is the hierarchy every host view already has. A view that wants
//! dirty-driven updates also implements [`ViewUpdateDelegate`], owns a
//! [`ViewUpdate`], and answers the [`View::as_update_delegate`] capability
//! query with `Some(self)`. Neighbours that answer `None` are skipped by
//! forwarding without error.
//!
//! # Implementing
//!
//! ```ignore
//! struct Label {
//!     view_update: ViewUpdate,
//!     properties: PropertyTable,
//!     text: Property<String>,
//!     children: RefCell<Vec<Rc<dyn View>>>,
//! }
//!
//! impl View for Label {
//!     fn subviews(&self) -> Vec<Rc<dyn View>> {
//!         self.children.borrow().clone()
//!     }
//!
//!     fn as_update_delegate(&self) -> Option<&dyn ViewUpdateDelegate> {
//!         Some(self)
//!     }
//! }
//!
//! impl ViewUpdateDelegate for Label {
//!     fn update_delegate(&self) -> &ViewUpdate {
//!         &self.view_update
//!     }
//!
//!     fn update(&self) {
//!         if self.is_dirty(DirtyType::DATA) {
//!             // redraw text
//!         }
//!         self.view_update.view_did_update();
//!     }
//!
//!     fn observe_key_path(&self, key_path: &str, on_change: ChangeHandler) -> Result<Observation> {
//!         self.properties.observe(key_path, on_change)
//!     }
//! }
//! ```

use std::rc::Rc;

use crate::coordinator::ViewUpdate;
use crate::error::{Result, ViewUpdateError};
use crate::observe::{ChangeHandler, Observation};
use crate::types::{DirtyType, InterfaceOrientation};

/// A node in the host's view hierarchy.
pub trait View {
    /// Direct subviews, in order.
    fn subviews(&self) -> Vec<Rc<dyn View>>;

    /// Parent view, if any.
    fn superview(&self) -> Option<Rc<dyn View>> {
        None
    }

    /// Capability query for the update protocol.
    fn as_update_delegate(&self) -> Option<&dyn ViewUpdateDelegate> {
        None
    }
}

/// A view driven by a [`ViewUpdate`] coordinator.
pub trait ViewUpdateDelegate: View {
    /// The coordinator this view owns.
    fn update_delegate(&self) -> &ViewUpdate;

    /// Consume dirty flags and refresh the view.
    ///
    /// Scheduled through [`set_needs_update`](Self::set_needs_update); do
    /// not call it directly, that skips coalescing. Implementations must
    /// call [`ViewUpdate::view_did_update`] as their last step.
    fn update(&self);

    /// Start observing one of this view's properties.
    ///
    /// Views without observable properties keep the default, which rejects
    /// every key path.
    fn observe_key_path(&self, key_path: &str, _on_change: ChangeHandler) -> Result<Observation> {
        Err(ViewUpdateError::UnknownKeyPath {
            key_path: key_path.to_string(),
        })
    }

    fn interface_orientation(&self) -> InterfaceOrientation {
        self.update_delegate().interface_orientation()
    }

    fn set_interface_orientation(&self, orientation: InterfaceOrientation) {
        self.update_delegate().set_interface_orientation(orientation);
    }

    /// Schedule one coalesced `update()` on the next tick.
    fn set_needs_update(&self) {
        self.update_delegate().set_needs_update();
    }

    fn is_dirty(&self, dirty_type: DirtyType) -> bool {
        self.update_delegate().is_dirty(dirty_type)
    }
}
