//! Simulated GPIO line.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use wire_common::hal::DigitalOutput;

/// Output line that records its level and counts edges.
///
/// Interrupt-safe: every write is a single atomic operation.
#[derive(Debug)]
pub struct SimPin {
    level: AtomicBool,
    rising_edges: AtomicU32,
    falling_edges: AtomicU32,
}

impl SimPin {
    /// Create a line at the given initial level.
    pub const fn new(initial: bool) -> Self {
        Self {
            level: AtomicBool::new(initial),
            rising_edges: AtomicU32::new(0),
            falling_edges: AtomicU32::new(0),
        }
    }

    /// Current level.
    #[inline]
    pub fn level(&self) -> bool {
        self.level.load(Ordering::Acquire)
    }

    /// Low→high transitions seen so far.
    #[inline]
    pub fn rising_edges(&self) -> u32 {
        self.rising_edges.load(Ordering::Acquire)
    }

    /// High→low transitions seen so far.
    #[inline]
    pub fn falling_edges(&self) -> u32 {
        self.falling_edges.load(Ordering::Acquire)
    }
}

impl DigitalOutput for SimPin {
    fn set(&self, high: bool) {
        let previous = self.level.swap(high, Ordering::AcqRel);
        match (previous, high) {
            (false, true) => {
                self.rising_edges.fetch_add(1, Ordering::AcqRel);
            }
            (true, false) => {
                self.falling_edges.fetch_add(1, Ordering::AcqRel);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_edges_not_writes() {
        let pin = SimPin::new(false);
        pin.set_high();
        pin.set_high();
        pin.set_low();
        pin.set_high();
        assert!(pin.level());
        assert_eq!(pin.rising_edges(), 2);
        assert_eq!(pin.falling_edges(), 1);
    }
}
