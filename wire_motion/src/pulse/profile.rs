//! Speed profiles: how the half period evolves during a move.
//!
//! Two strategies share one interface and are selected from configuration:
//!
//! - [`ConstantSpeed`] - every step at the computed half period
//! - [`TableRamp`] - start slow, accelerate through the [`RampTable`] to the
//!   cruise half period, decelerate from the midpoint back to the start rate
//!
//! `plan` runs in the foreground while the axis is idle; `advance` runs in
//! the step interrupt once per step, after the pulse edge is cleared.

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU8, AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

use crate::ramp::RampTable;

/// Ramp state machine phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum RampPhase {
    /// No shaping for this move.
    None = 0,
    /// Accelerating, or cruising once the cruise half period is reached.
    Accel = 1,
    /// Decelerating toward the start/stop rate.
    Decel = 2,
}

impl RampPhase {
    #[inline]
    const fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Accel,
            2 => Self::Decel,
            _ => Self::None,
        }
    }
}

/// Ramp bookkeeping for the current move.
///
/// Written by `plan` while idle and by `advance` in the step interrupt
/// only; each field is individually atomic.
#[derive(Debug)]
pub struct RampState {
    start_position: AtomicI32,
    midpoint: AtomicI32,
    phase: AtomicU8,
    index: AtomicU32,
    iter_count: AtomicU32,
    target_half_period: AtomicU32,
    forward: AtomicBool,
}

impl RampState {
    pub const fn new() -> Self {
        Self {
            start_position: AtomicI32::new(0),
            midpoint: AtomicI32::new(0),
            phase: AtomicU8::new(RampPhase::None as u8),
            index: AtomicU32::new(0),
            iter_count: AtomicU32::new(0),
            target_half_period: AtomicU32::new(0),
            forward: AtomicBool::new(true),
        }
    }

    #[inline]
    pub fn phase(&self) -> RampPhase {
        RampPhase::from_u8(self.phase.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn midpoint(&self) -> i32 {
        self.midpoint.load(Ordering::Relaxed)
    }

    /// Cruise half period of the current move.
    #[inline]
    pub fn target_half_period(&self) -> u32 {
        self.target_half_period.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_phase(&self, phase: RampPhase) {
        self.phase.store(phase as u8, Ordering::Relaxed);
    }

    pub(crate) fn reset(&self) {
        self.set_phase(RampPhase::None);
        self.index.store(0, Ordering::Relaxed);
        self.iter_count.store(0, Ordering::Relaxed);
        self.target_half_period.store(0, Ordering::Relaxed);
    }
}

impl Default for RampState {
    fn default() -> Self {
        Self::new()
    }
}

/// Strategy interface for half-period shaping.
pub trait SpeedProfile {
    /// Name for logs and status output.
    fn name(&self) -> &'static str;

    /// Prepare a move from `start` to `target` whose unshaped half period is
    /// `cruise_half_period`. Returns the half period of the first step.
    fn plan(&self, ramp: &RampState, start: i32, target: i32, cruise_half_period: u32) -> u32;

    /// Next half period after a step at `position` completed. Interrupt
    /// context: O(1), no allocation, no logging.
    fn advance(&self, ramp: &RampState, position: i32, target: i32, half_period: u32) -> u32;
}

/// Fixed-rate stepping.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstantSpeed;

impl SpeedProfile for ConstantSpeed {
    fn name(&self) -> &'static str {
        "constant"
    }

    fn plan(&self, ramp: &RampState, _start: i32, _target: i32, cruise_half_period: u32) -> u32 {
        ramp.reset();
        cruise_half_period
    }

    #[inline]
    fn advance(&self, _ramp: &RampState, _position: i32, _target: i32, half_period: u32) -> u32 {
        half_period
    }
}

/// Table-driven acceleration/deceleration ramp.
#[derive(Debug, Clone)]
pub struct TableRamp {
    table: RampTable,
}

impl TableRamp {
    pub fn new(table: RampTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &RampTable {
        &self.table
    }
}

impl SpeedProfile for TableRamp {
    fn name(&self) -> &'static str {
        "ramp"
    }

    fn plan(&self, ramp: &RampState, start: i32, target: i32, cruise_half_period: u32) -> u32 {
        ramp.reset();
        let start_half_period = self.table.start_half_period();
        if self.table.is_empty() || cruise_half_period >= start_half_period {
            return cruise_half_period;
        }

        let forward = target > start;
        let half_travel = ((target as i64 - start as i64).abs() / 2) as i32;
        let midpoint = if forward {
            start - 2 + half_travel
        } else {
            start + 2 - half_travel
        };

        ramp.start_position.store(start, Ordering::Relaxed);
        ramp.midpoint.store(midpoint, Ordering::Relaxed);
        ramp.forward.store(forward, Ordering::Relaxed);
        ramp.target_half_period.store(
            cruise_half_period.max(self.table.floor_half_period()),
            Ordering::Relaxed,
        );
        ramp.set_phase(RampPhase::Accel);
        start_half_period
    }

    fn advance(&self, ramp: &RampState, position: i32, target: i32, half_period: u32) -> u32 {
        match ramp.phase() {
            RampPhase::None => half_period,
            RampPhase::Accel => {
                let mut half_period = half_period;
                let cruise = ramp.target_half_period.load(Ordering::Relaxed);
                let forward = ramp.forward.load(Ordering::Relaxed);
                if half_period > cruise {
                    let iter = ramp.iter_count.load(Ordering::Relaxed);
                    if iter == 0 {
                        half_period -= 1;
                        let index = ramp.index.load(Ordering::Relaxed);
                        ramp.iter_count
                            .store(self.table.count(index as usize) as u32, Ordering::Relaxed);
                        ramp.index.store(index + 1, Ordering::Relaxed);

                        // Cruise reached: brake over as many steps as the
                        // acceleration took, not at the nominal midpoint.
                        if half_period == cruise {
                            let start = ramp.start_position.load(Ordering::Relaxed);
                            let ramp_len = (position as i64 - start as i64).abs() as i32;
                            let midpoint = if forward {
                                target - ramp_len
                            } else {
                                target + ramp_len
                            };
                            ramp.midpoint.store(midpoint, Ordering::Relaxed);
                        }
                    } else {
                        ramp.iter_count.store(iter - 1, Ordering::Relaxed);
                    }
                }

                let midpoint = ramp.midpoint.load(Ordering::Relaxed);
                let past_midpoint = if forward {
                    position > midpoint
                } else {
                    position < midpoint
                };
                if past_midpoint {
                    ramp.set_phase(RampPhase::Decel);
                }
                half_period
            }
            RampPhase::Decel => {
                let mut half_period = half_period;
                if half_period < self.table.start_half_period() {
                    let iter = ramp.iter_count.load(Ordering::Relaxed);
                    if iter == 0 {
                        half_period += 1;
                        let index = ramp.index.load(Ordering::Relaxed).saturating_sub(1);
                        ramp.index.store(index, Ordering::Relaxed);
                        ramp.iter_count
                            .store(self.table.count(index as usize) as u32, Ordering::Relaxed);
                    } else {
                        ramp.iter_count.store(iter - 1, Ordering::Relaxed);
                    }
                }
                half_period
            }
        }
    }
}

/// Profile selected at configuration time.
#[derive(Debug, Clone)]
pub enum Profile {
    Constant(ConstantSpeed),
    Ramp(TableRamp),
}

impl SpeedProfile for Profile {
    fn name(&self) -> &'static str {
        match self {
            Self::Constant(p) => p.name(),
            Self::Ramp(p) => p.name(),
        }
    }

    fn plan(&self, ramp: &RampState, start: i32, target: i32, cruise_half_period: u32) -> u32 {
        match self {
            Self::Constant(p) => p.plan(ramp, start, target, cruise_half_period),
            Self::Ramp(p) => p.plan(ramp, start, target, cruise_half_period),
        }
    }

    #[inline]
    fn advance(&self, ramp: &RampState, position: i32, target: i32, half_period: u32) -> u32 {
        match self {
            Self::Constant(p) => p.advance(ramp, position, target, half_period),
            Self::Ramp(p) => p.advance(ramp, position, target, half_period),
        }
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::Constant(ConstantSpeed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_profile() -> TableRamp {
        // Start at 20 ticks, one repeat per entry down to 10.
        TableRamp::new(RampTable::from_counts(20, &[1; 10]).unwrap())
    }

    #[test]
    fn constant_profile_never_changes_half_period() {
        let state = RampState::new();
        assert_eq!(ConstantSpeed.plan(&state, 0, 100, 4_000), 4_000);
        assert_eq!(state.phase(), RampPhase::None);
        assert_eq!(ConstantSpeed.advance(&state, 50, 100, 4_000), 4_000);
    }

    #[test]
    fn slow_moves_skip_the_ramp() {
        let state = RampState::new();
        let profile = ramp_profile();
        assert_eq!(profile.plan(&state, 0, 100, 25), 25);
        assert_eq!(state.phase(), RampPhase::None);
    }

    #[test]
    fn plan_starts_at_table_rate_with_nominal_midpoint() {
        let state = RampState::new();
        let profile = ramp_profile();
        assert_eq!(profile.plan(&state, 0, 100, 12), 20);
        assert_eq!(state.phase(), RampPhase::Accel);
        assert_eq!(state.midpoint(), 48);
        assert_eq!(state.target_half_period(), 12);

        profile.plan(&state, 100, 0, 12);
        assert_eq!(state.midpoint(), 52);
    }

    #[test]
    fn cruise_is_clamped_to_table_floor() {
        let state = RampState::new();
        ramp_profile().plan(&state, 0, 1000, 2);
        assert_eq!(state.target_half_period(), 10);
    }

    #[test]
    fn accel_reaches_cruise_and_moves_midpoint() {
        let state = RampState::new();
        let profile = ramp_profile();
        let mut h = profile.plan(&state, 0, 1000, 16);
        let mut position = 0;
        while h > 16 {
            position += 1;
            h = profile.advance(&state, position, 1000, h);
        }
        // Four decrements, one repeat between each: 1 + 2 + 2 + 2 steps.
        assert_eq!(position, 7);
        assert_eq!(state.midpoint(), 1000 - 7);
        assert_eq!(state.phase(), RampPhase::Accel);

        // Cruise holds the half period.
        assert_eq!(profile.advance(&state, 8, 1000, h), 16);
    }

    #[test]
    fn decel_returns_to_start_rate_without_overshooting_it() {
        let state = RampState::new();
        let profile = ramp_profile();
        let mut h = profile.plan(&state, 0, 40, 10);
        let mut max_h = 0;
        for position in 1..=40 {
            h = profile.advance(&state, position, 40, h);
            assert!(h >= 10);
            if state.phase() == RampPhase::Decel {
                max_h = max_h.max(h);
            }
        }
        assert_eq!(state.phase(), RampPhase::Decel);
        assert!(max_h <= 20);
    }

    #[test]
    fn short_reverse_move_switches_to_decel_immediately() {
        let state = RampState::new();
        let profile = ramp_profile();
        let h = profile.plan(&state, 0, -1, 10);
        assert_eq!(state.midpoint(), 2);
        profile.advance(&state, -1, -1, h);
        assert_eq!(state.phase(), RampPhase::Decel);
    }
}
