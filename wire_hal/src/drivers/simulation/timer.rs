//! Simulated step interrupt timer.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use wire_common::hal::{StepTimer, TickClock};

use super::clock::SimClock;

/// One-slot periodic timer.
///
/// `arm` stores an absolute deadline relative to the clock; the simulation
/// host calls [`SimTimer::fire_if_due`] after advancing the clock, which
/// runs the handler and re-arms with the interval it returns.
#[derive(Debug)]
pub struct SimTimer {
    clock: Arc<SimClock>,
    armed: AtomicBool,
    deadline: AtomicU32,
    fired: AtomicU32,
}

impl SimTimer {
    /// Create a disarmed timer bound to `clock`.
    pub fn new(clock: Arc<SimClock>) -> Self {
        Self {
            clock,
            armed: AtomicBool::new(false),
            deadline: AtomicU32::new(0),
            fired: AtomicU32::new(0),
        }
    }

    /// Absolute deadline of the next call, if armed.
    pub fn deadline(&self) -> Option<u32> {
        self.armed
            .load(Ordering::Acquire)
            .then(|| self.deadline.load(Ordering::Acquire))
    }

    /// Number of handler calls so far.
    pub fn fired(&self) -> u32 {
        self.fired.load(Ordering::Acquire)
    }

    /// Run `handler(now)` if armed and the deadline has passed.
    ///
    /// The handler's return value is the next interval. Returns whether
    /// the handler ran.
    pub fn fire_if_due<F>(&self, handler: F) -> bool
    where
        F: FnOnce(u32) -> u32,
    {
        let Some(deadline) = self.deadline() else {
            return false;
        };
        let now = self.clock.now();
        if (now.wrapping_sub(deadline) as i32) < 0 {
            return false;
        }
        self.fired.fetch_add(1, Ordering::AcqRel);
        let next = handler(now).max(1);
        // The handler may not disarm; only the foreground does.
        if self.armed.load(Ordering::Acquire) {
            self.deadline.store(now.wrapping_add(next), Ordering::Release);
        }
        true
    }
}

impl StepTimer for SimTimer {
    fn arm(&self, interval_ticks: u32) {
        let deadline = self.clock.now().wrapping_add(interval_ticks.max(1));
        self.deadline.store(deadline, Ordering::Release);
        self.armed.store(true, Ordering::Release);
    }

    fn disarm(&self) {
        self.armed.store(false, Ordering::Release);
    }

    fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }
}
