//! Update Engine - The pieces a coordinator is assembled from.
//!
//! - **dirty**: Dirty flag union for one view, with pass-stable reads
//! - **bindings**: Key path → dirty category table
//! - **scheduler**: Idle/Pending coalescing of update requests
//! - **propagation**: Forward/block masks between a view and its neighbours
//! - **run_loop**: Default deferred-tick primitive (thread-local queue)
//!
//! # Architecture
//!
//! ```text
//! KeyPathBindingTable ─┐
//!                      ├─► DirtyFlagSet ─► UpdateScheduler ─► TickSource ─► update()
//! set_dirty() ─────────┘         │
//!                                └─► PropagationPolicy ─► subviews
//! ```
//!
//! None of these types knows about views; [`ViewUpdate`](crate::ViewUpdate)
//! wires them to a delegate.

pub mod bindings;
pub mod dirty;
pub mod propagation;
pub mod run_loop;
pub mod scheduler;

pub use bindings::{BindingEffect, KeyPathBinding, KeyPathBindingTable};
pub use dirty::DirtyFlagSet;
pub use propagation::PropagationPolicy;
pub use run_loop::{RunLoop, TickSource};
pub use scheduler::{SchedulerState, UpdateScheduler};
