//! # spark-view-update
//!
//! Dirty-flag update coordination for reactive UI views.
//!
//! A view declares which parts of its state are stale ("dirty"), the
//! coordinator batches those declarations, and the view gets exactly one
//! deferred `update()` per cycle in which it redraws only what is dirty.
//!
//! ## Architecture
//!
//! ```text
//! Property change ─► key path binding ─┐
//! set_dirty() ─────────────────────────┼─► DirtyFlagSet ─► UpdateScheduler ─► next tick
//!                                      │                                        │
//!                       forward/block ◄┘                                        ▼
//!                       (subviews)                   update() ─► is_dirty() ─► view_did_update()
//! ```
//!
//! Everything is single-threaded: flags, scheduling and update callbacks all
//! live on the host's UI thread. The default deferred-tick primitive is the
//! thread-local [`run_loop`]; hosts with their own event loop plug in a
//! [`TickSource`].
//!
//! ## Modules
//!
//! - [`types`] - `DirtyType` categories and `InterfaceOrientation`
//! - [`engine`] - Dirty flags, bindings, scheduler, propagation, run loop
//! - [`observe`] - Property observation (`Property`, spark-signals adapter)
//! - [`view`] - Host contract (`View`, `ViewUpdateDelegate`)
//! - [`coordinator`] - `ViewUpdate`, the object a view owns
//! - [`config`] - `ViewUpdateConfig`
//! - [`error`] - Configuration errors

pub mod config;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod observe;
pub mod types;
pub mod view;

// Re-export commonly used items
pub use types::*;

pub use config::ViewUpdateConfig;
pub use coordinator::ViewUpdate;
pub use error::{Result, ViewUpdateError};
pub use observe::{ChangeHandler, Observation, Property, PropertyTable};
pub use view::{View, ViewUpdateDelegate};

pub use engine::run_loop;
pub use engine::{
    BindingEffect, DirtyFlagSet, KeyPathBinding, KeyPathBindingTable, PropagationPolicy, RunLoop,
    SchedulerState, TickSource, UpdateScheduler,
};
