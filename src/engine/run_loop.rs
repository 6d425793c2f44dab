//! Run Loop - The default deferred-tick primitive.
//!
//! Callbacks requested through [`RunLoop`] are queued on a thread-local FIFO
//! and executed by the host calling [`tick()`], once per refresh of its
//! event loop:
//!
//! ```ignore
//! use spark_view_update::run_loop;
//!
//! loop {
//!     handle_input();
//!     run_loop::tick(); // fire coalesced view updates
//!     present();
//! }
//! ```
//!
//! A callback queued while a tick is running lands on the following tick.

use std::cell::RefCell;
use std::collections::VecDeque;

use tracing::trace;

/// A single-shot "run this soon" primitive.
///
/// Implemented by hosts that already own an event loop (frame callback,
/// idle handler, task queue). The coordinator only ever calls
/// `request_tick` and never cancels a request.
pub trait TickSource {
    fn request_tick(&self, callback: Box<dyn FnOnce()>);
}

type TickCallback = Box<dyn FnOnce()>;

thread_local! {
    /// Callbacks waiting for the next tick.
    static QUEUE: RefCell<VecDeque<TickCallback>> = RefCell::new(VecDeque::new());
}

/// [`TickSource`] backed by this thread's run loop queue.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunLoop;

impl TickSource for RunLoop {
    fn request_tick(&self, callback: Box<dyn FnOnce()>) {
        QUEUE.with(|queue| queue.borrow_mut().push_back(callback));
        trace!(pending = pending_ticks(), "tick requested");
    }
}

/// Run every callback that was queued before this tick started.
///
/// Returns the number of callbacks run.
pub fn tick() -> usize {
    // Take the batch first so callbacks can queue new work without
    // re-entering the borrow.
    let batch = QUEUE.with(|queue| std::mem::take(&mut *queue.borrow_mut()));
    let count = batch.len();
    for callback in batch {
        callback();
    }
    count
}

/// Number of callbacks waiting for the next tick.
pub fn pending_ticks() -> usize {
    QUEUE.with(|queue| queue.borrow().len())
}

/// Drop all queued callbacks without running them.
pub fn reset_run_loop() {
    let dropped = QUEUE.with(|queue| std::mem::take(&mut *queue.borrow_mut()));
    drop(dropped);
}
