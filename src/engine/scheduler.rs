//! Update Scheduler - Coalesces update requests into one deferred cycle.
//!
//! Two states: `Idle` and `Pending`. A request while `Idle` asks the tick
//! source for one callback and moves to `Pending`; requests while `Pending`
//! are no-ops. When the callback fires the scheduler returns to `Idle`
//! *before* the update runs, so a request made from inside `update()`
//! starts a new cycle instead of being swallowed.
//!
//! A scheduled cycle cannot be withdrawn. If the tick source drops the
//! callback without running it, the scheduler falls back to `Idle` so the
//! next request schedules again.

use std::cell::Cell;
use std::rc::Rc;

use tracing::{debug, trace};

use super::run_loop::TickSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulerState {
    #[default]
    Idle,
    Pending,
}

/// Idle/Pending coalescing state for one coordinator.
#[derive(Debug, Default)]
pub struct UpdateScheduler {
    // Shared with the queued callback, which may outlive the scheduler.
    state: Rc<Cell<SchedulerState>>,
    /// Completed deferred cycles.
    cycles: Cell<u64>,
}

impl UpdateScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SchedulerState {
        self.state.get()
    }

    pub fn is_pending(&self) -> bool {
        self.state.get() == SchedulerState::Pending
    }

    /// Number of deferred cycles that have fired.
    pub fn cycles(&self) -> u64 {
        self.cycles.get()
    }

    /// Request a deferred cycle.
    ///
    /// `fire` is handed to `source` only when the scheduler was `Idle`.
    /// Returns `true` if a new cycle was scheduled.
    pub fn request(&self, source: &dyn TickSource, fire: impl FnOnce() + 'static) -> bool {
        if self.is_pending() {
            trace!("update already pending, coalesced");
            return false;
        }
        self.state.set(SchedulerState::Pending);
        let fire: Box<dyn FnOnce()> = Box::new(fire);
        let cycle = PendingCycle {
            state: Rc::clone(&self.state),
            fire: Some(fire),
        };
        source.request_tick(Box::new(move || cycle.run()));
        trace!("update scheduled");
        true
    }

    /// Enter a firing cycle: back to `Idle` before the update runs.
    pub fn begin_cycle(&self) {
        self.state.set(SchedulerState::Idle);
        self.cycles.set(self.cycles.get() + 1);
        debug!(cycle = self.cycles.get(), "update cycle firing");
    }
}

/// The callback handed to the tick source.
///
/// Running it or dropping it unrun both leave the scheduler `Idle`.
struct PendingCycle {
    state: Rc<Cell<SchedulerState>>,
    fire: Option<Box<dyn FnOnce()>>,
}

impl PendingCycle {
    fn run(mut self) {
        // Idle even when `fire` has nothing left to update.
        self.state.set(SchedulerState::Idle);
        if let Some(fire) = self.fire.take() {
            fire();
        }
    }
}

impl Drop for PendingCycle {
    fn drop(&mut self) {
        if self.fire.is_some() {
            trace!("pending update dropped unrun");
            self.state.set(SchedulerState::Idle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::run_loop::{self, RunLoop};
    use std::rc::Rc;

    #[test]
    fn test_coalesces_while_pending() {
        run_loop::reset_run_loop();
        let scheduler = Rc::new(UpdateScheduler::new());

        for _ in 0..5 {
            let s = scheduler.clone();
            scheduler.request(&RunLoop, move || s.begin_cycle());
        }

        assert!(scheduler.is_pending());
        assert_eq!(run_loop::pending_ticks(), 1);

        run_loop::tick();
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert_eq!(scheduler.cycles(), 1);
    }

    #[test]
    fn test_request_from_inside_cycle_schedules_new_one() {
        run_loop::reset_run_loop();
        let scheduler = Rc::new(UpdateScheduler::new());

        let s = scheduler.clone();
        let first = scheduler.request(&RunLoop, move || {
            s.begin_cycle();
            let s2 = s.clone();
            assert!(s.request(&RunLoop, move || s2.begin_cycle()));
        });
        assert!(first);

        run_loop::tick();
        assert!(scheduler.is_pending());
        assert_eq!(run_loop::pending_ticks(), 1);

        run_loop::tick();
        assert!(!scheduler.is_pending());
        assert_eq!(scheduler.cycles(), 2);
    }

    #[test]
    fn test_dropped_cycle_returns_to_idle() {
        run_loop::reset_run_loop();
        let scheduler = Rc::new(UpdateScheduler::new());

        let s = scheduler.clone();
        assert!(scheduler.request(&RunLoop, move || s.begin_cycle()));
        assert!(scheduler.is_pending());

        run_loop::reset_run_loop();
        assert_eq!(scheduler.state(), SchedulerState::Idle);

        let s = scheduler.clone();
        assert!(scheduler.request(&RunLoop, move || s.begin_cycle()));
        run_loop::tick();
        assert_eq!(scheduler.cycles(), 1);
    }

    #[test]
    fn test_cycle_that_skips_begin_still_goes_idle() {
        run_loop::reset_run_loop();
        let scheduler = UpdateScheduler::new();

        scheduler.request(&RunLoop, || {});
        run_loop::tick();

        assert!(!scheduler.is_pending());
        assert_eq!(scheduler.cycles(), 0);
        assert!(scheduler.request(&RunLoop, || {}));
    }
}
