//! Simulated cutter servo and blocking delay.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use tracing::trace;
use wire_common::hal::{Delay, ServoOutput};

use super::clock::SimClock;

const NO_POSITION: u32 = u32::MAX;

#[derive(Debug)]
struct ServoState {
    position: AtomicU32,
    writes: AtomicU32,
}

/// Servo handle; clones observe the same state.
#[derive(Debug, Clone)]
pub struct SimServo {
    state: Arc<ServoState>,
}

impl Default for SimServo {
    fn default() -> Self {
        Self {
            state: Arc::new(ServoState {
                position: AtomicU32::new(NO_POSITION),
                writes: AtomicU32::new(0),
            }),
        }
    }
}

impl SimServo {
    /// Last commanded position, `None` before the first write.
    pub fn position(&self) -> Option<u16> {
        match self.state.position.load(Ordering::Acquire) {
            NO_POSITION => None,
            p => Some(p as u16),
        }
    }

    /// Number of position writes.
    pub fn writes(&self) -> u32 {
        self.state.writes.load(Ordering::Acquire)
    }
}

impl ServoOutput for SimServo {
    fn write(&mut self, position: u16) {
        trace!(position, "servo write");
        self.state.position.store(position as u32, Ordering::Release);
        self.state.writes.fetch_add(1, Ordering::AcqRel);
    }
}

/// Delay that advances the simulation clock instead of sleeping.
#[derive(Debug, Clone)]
pub struct SimDelay {
    clock: Arc<SimClock>,
    total_ms: Arc<AtomicU64>,
}

impl SimDelay {
    /// Create a delay bound to `clock`.
    pub fn new(clock: Arc<SimClock>) -> Self {
        Self {
            clock,
            total_ms: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Milliseconds spent blocked so far.
    pub fn total_ms(&self) -> u64 {
        self.total_ms.load(Ordering::Acquire)
    }
}

impl Delay for SimDelay {
    fn delay_ms(&mut self, ms: u32) {
        self.clock.advance(self.clock.ms_to_ticks(ms));
        self.total_ms.fetch_add(ms as u64, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wire_common::hal::TickClock;

    #[test]
    fn servo_reports_last_write() {
        let mut servo = SimServo::default();
        assert_eq!(servo.position(), None);
        servo.write(0);
        servo.write(150);
        assert_eq!(servo.position(), Some(150));
        assert_eq!(servo.writes(), 2);
    }

    #[test]
    fn delay_consumes_virtual_time() {
        let clock = Arc::new(SimClock::new(80_000));
        let mut delay = SimDelay::new(Arc::clone(&clock));
        delay.delay_ms(1_500);
        delay.delay_ms(800);
        assert_eq!(delay.total_ms(), 2_300);
        assert_eq!(clock.now(), 2_300 * 80_000);
    }
}
