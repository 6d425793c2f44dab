//! Coordinator configuration.
//!
//! ```ignore
//! let view_update = ViewUpdate::with_config(
//!     ViewUpdateConfig::default()
//!         .forward(DirtyType::LAYOUT | DirtyType::ORIENTATION)
//!         .bind("title", DirtyType::DATA)
//!         .bind_immediate("frame", DirtyType::LAYOUT),
//! );
//! ```

use std::fmt;
use std::rc::Rc;

use crate::engine::bindings::KeyPathBinding;
use crate::engine::run_loop::TickSource;
use crate::types::{DirtyType, InterfaceOrientation};

/// Settings for a [`ViewUpdate`](crate::ViewUpdate), consumed at construction.
#[derive(Clone)]
pub struct ViewUpdateConfig {
    /// Categories re-declared on participating subviews.
    pub forward: DirtyType,
    /// Categories discarded when forwarded from the superview.
    pub block: DirtyType,
    /// Categories marked by `view_did_init()` for the first update.
    pub initial_dirty: DirtyType,
    pub interface_orientation: InterfaceOrientation,
    /// Installed by `view_did_init()`.
    pub default_bindings: Vec<KeyPathBinding>,
    /// Deferred-tick primitive. `None` uses this thread's run loop.
    pub tick_source: Option<Rc<dyn TickSource>>,
}

impl Default for ViewUpdateConfig {
    fn default() -> Self {
        Self {
            forward: DirtyType::NONE,
            block: DirtyType::NONE,
            initial_dirty: DirtyType::ALL,
            interface_orientation: InterfaceOrientation::Unknown,
            default_bindings: Vec::new(),
            tick_source: None,
        }
    }
}

impl fmt::Debug for ViewUpdateConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewUpdateConfig")
            .field("forward", &self.forward)
            .field("block", &self.block)
            .field("initial_dirty", &self.initial_dirty)
            .field("interface_orientation", &self.interface_orientation)
            .field("default_bindings", &self.default_bindings)
            .field("tick_source", &self.tick_source.as_ref().map(|_| "custom"))
            .finish()
    }
}

impl ViewUpdateConfig {
    pub fn forward(mut self, mask: DirtyType) -> Self {
        self.forward = mask;
        self
    }

    pub fn block(mut self, mask: DirtyType) -> Self {
        self.block = mask;
        self
    }

    pub fn initial_dirty(mut self, dirty_type: DirtyType) -> Self {
        self.initial_dirty = dirty_type;
        self
    }

    pub fn interface_orientation(mut self, orientation: InterfaceOrientation) -> Self {
        self.interface_orientation = orientation;
        self
    }

    pub fn bind(mut self, key_path: impl Into<String>, dirty_type: DirtyType) -> Self {
        self.default_bindings.push(KeyPathBinding::new(key_path, dirty_type));
        self
    }

    pub fn bind_immediate(mut self, key_path: impl Into<String>, dirty_type: DirtyType) -> Self {
        self.default_bindings
            .push(KeyPathBinding::new(key_path, dirty_type).immediate());
        self
    }

    pub fn tick_source(mut self, source: Rc<dyn TickSource>) -> Self {
        self.tick_source = Some(source);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ViewUpdateConfig::default();
        assert_eq!(config.forward, DirtyType::NONE);
        assert_eq!(config.block, DirtyType::NONE);
        assert_eq!(config.initial_dirty, DirtyType::ALL);
        assert!(config.default_bindings.is_empty());
        assert!(config.tick_source.is_none());
    }

    #[test]
    fn test_builder_collects_bindings() {
        let config = ViewUpdateConfig::default()
            .forward(DirtyType::LAYOUT)
            .block(DirtyType::STYLE)
            .bind("title", DirtyType::DATA)
            .bind_immediate("frame", DirtyType::LAYOUT);

        assert_eq!(config.forward, DirtyType::LAYOUT);
        assert_eq!(config.block, DirtyType::STYLE);
        assert_eq!(
            config.default_bindings,
            vec![
                KeyPathBinding::new("title", DirtyType::DATA),
                KeyPathBinding::new("frame", DirtyType::LAYOUT).immediate(),
            ]
        );
    }
}
