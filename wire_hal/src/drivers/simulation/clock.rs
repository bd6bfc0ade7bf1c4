//! Virtual tick counter.

use std::sync::atomic::{AtomicU32, Ordering};

use wire_common::hal::TickClock;

/// Tick counter advanced explicitly by the simulation host.
#[derive(Debug)]
pub struct SimClock {
    ticks: AtomicU32,
    ticks_per_ms: u32,
}

impl SimClock {
    /// Create a clock at tick 0.
    pub fn new(ticks_per_ms: u32) -> Self {
        Self {
            ticks: AtomicU32::new(0),
            ticks_per_ms,
        }
    }

    /// Advance by `ticks` (wrapping).
    #[inline]
    pub fn advance(&self, ticks: u32) {
        self.ticks.fetch_add(ticks, Ordering::AcqRel);
    }

    /// Jump to an absolute tick value.
    #[inline]
    pub fn set(&self, now: u32) {
        self.ticks.store(now, Ordering::Release);
    }

    /// Convert milliseconds to ticks, saturating at `u32::MAX`.
    pub fn ms_to_ticks(&self, ms: u32) -> u32 {
        let ticks = ms as u64 * self.ticks_per_ms as u64;
        ticks.min(u32::MAX as u64) as u32
    }
}

impl TickClock for SimClock {
    #[inline]
    fn now(&self) -> u32 {
        self.ticks.load(Ordering::Acquire)
    }

    #[inline]
    fn ticks_per_ms(&self) -> u32 {
        self.ticks_per_ms
    }
}
