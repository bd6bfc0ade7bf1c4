//! Cutter actuator: a position servo with two stable positions.
//!
//! Moves are synchronous. A non-zero settle time blocks the caller through
//! the injected [`Delay`], so these operations belong to the foreground
//! dispatch path only.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use wire_common::hal::{Delay, ServoOutput};

/// Stable cutter positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CutterState {
    Up,
    Down,
}

impl fmt::Display for CutterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
        }
    }
}

/// Up/down positions of the servo, in servo units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CutterPositions {
    pub up: u16,
    pub down: u16,
}

#[derive(Debug)]
pub struct CutterActuator<V, Y> {
    servo: V,
    delay: Y,
    positions: CutterPositions,
    current_target: u16,
}

impl<V: ServoOutput, Y: Delay> CutterActuator<V, Y> {
    /// Take the servo and drive it to the up position.
    pub fn new(mut servo: V, delay: Y, positions: CutterPositions) -> Self {
        servo.write(positions.up);
        Self {
            servo,
            delay,
            positions,
            current_target: positions.up,
        }
    }

    /// Raise the cutter. Idempotent.
    pub fn move_up(&mut self, settle_ms: u16) {
        self.move_to(self.positions.up, settle_ms);
    }

    /// Lower the cutter. Idempotent.
    pub fn move_down(&mut self, settle_ms: u16) {
        self.move_to(self.positions.down, settle_ms);
    }

    /// Move to the position opposite the current one.
    pub fn toggle(&mut self, settle_ms: u16) {
        match self.state() {
            CutterState::Up => self.move_down(settle_ms),
            CutterState::Down => self.move_up(settle_ms),
        }
    }

    /// Anything other than the up position counts as down.
    #[inline]
    pub fn state(&self) -> CutterState {
        if self.current_target == self.positions.up {
            CutterState::Up
        } else {
            CutterState::Down
        }
    }

    #[inline]
    pub fn current_target(&self) -> u16 {
        self.current_target
    }

    #[inline]
    pub fn positions(&self) -> CutterPositions {
        self.positions
    }

    fn move_to(&mut self, position: u16, settle_ms: u16) {
        debug!("Cutter -> {position} (settle {settle_ms}ms)");
        self.servo.write(position);
        self.current_target = position;
        if settle_ms > 0 {
            self.delay.delay_ms(settle_ms as u32);
        }
    }
}
