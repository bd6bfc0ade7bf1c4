//! Step pulse generator (interrupt-timed).
//!
//! Converts a displacement and a duration into a sequence of step edges,
//! one edge per timer event. The generator owns the authoritative axis
//! state; the step interrupt is the only writer of position while a move
//! is active, the foreground writes the move parameters only while idle.
//!
//! ## Timer Event
//!
//! Each event either raises the step line and advances the position by one
//! step toward the target, or clears the line and lets the speed profile
//! pick the next half period. Deadlines accumulate the half period, so a
//! late event does not stretch the move. Half periods longer than
//! `MAX_EVENT_INTERVAL` are served as several events; the extra wait is
//! held in `wait_remaining`.
//!
//! ## Shared State
//!
//! Every field is an individual atomic. `active` is the gate: the
//! foreground checks it before touching anything else, and the interrupt
//! publishes completion by clearing it with `Release` ordering.

pub mod profile;

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};

use serde::{Deserialize, Serialize};
use tracing::{error, info};
use wire_common::consts::{
    DEFAULT_MOVE_DURATION_MS, IDLE_INTERVAL_TICKS, MAX_EVENT_INTERVAL, MIN_HALF_PERIOD,
    START_DELAY_US, TICKS_PER_MS,
};
use wire_common::hal::{DigitalOutput, StepTimer};

use crate::error::{MotionError, MotionResult};
use profile::{Profile, RampPhase, RampState, SpeedProfile};

// ─── Timing Parameters ──────────────────────────────────────────────

/// Timer-derived constants of the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseTiming {
    /// Timer ticks per millisecond.
    pub ticks_per_ms: u32,
    /// Lowest half period the driver tolerates [ticks].
    pub min_half_period: u32,
    /// Interval returned while idle [ticks].
    pub idle_interval: u32,
    /// Delay from arming to the first step edge [ticks].
    pub start_delay: u32,
}

impl Default for PulseTiming {
    fn default() -> Self {
        Self {
            ticks_per_ms: TICKS_PER_MS,
            min_half_period: MIN_HALF_PERIOD,
            idle_interval: IDLE_INTERVAL_TICKS,
            start_delay: START_DELAY_US * (TICKS_PER_MS / 1000),
        }
    }
}

impl PulseTiming {
    /// Half period for `steps` steps spread over `duration_ms`.
    ///
    /// Full period is `duration * ticks_per_ms / steps - 1`; the result is
    /// clamped to the driver minimum.
    pub fn half_period_for(&self, duration_ms: u16, steps: u32) -> u32 {
        let duration = if duration_ms == 0 {
            DEFAULT_MOVE_DURATION_MS
        } else {
            duration_ms
        };
        let period = if steps == 0 {
            2 * self.ticks_per_ms as u64
        } else {
            (duration as u64 * self.ticks_per_ms as u64 / steps as u64).saturating_sub(1)
        };
        (period / 2).clamp(self.min_half_period.max(1) as u64, u32::MAX as u64) as u32
    }
}

// ─── Axis State ─────────────────────────────────────────────────────

/// Authoritative state of the axis.
#[derive(Debug)]
pub struct AxisState {
    position: AtomicI32,
    target: AtomicI32,
    half_period: AtomicU32,
    pulse_high: AtomicBool,
    next_event_time: AtomicU32,
    wait_remaining: AtomicU32,
    active: AtomicBool,
    stop_requested: AtomicBool,
    ramp: RampState,
}

impl AxisState {
    pub const fn new() -> Self {
        Self {
            position: AtomicI32::new(0),
            target: AtomicI32::new(0),
            half_period: AtomicU32::new(0),
            pulse_high: AtomicBool::new(false),
            next_event_time: AtomicU32::new(0),
            wait_remaining: AtomicU32::new(0),
            active: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
            ramp: RampState::new(),
        }
    }
}

impl Default for AxisState {
    fn default() -> Self {
        Self::new()
    }
}

/// Interrupt timing diagnostics.
#[derive(Debug, Default)]
struct PulseDiagnostics {
    events: AtomicU32,
    late_events: AtomicU32,
    max_lateness: AtomicU32,
    last_completion: AtomicU32,
    moves_completed: AtomicU32,
}

/// Point-in-time copy of the axis state, read field by field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisSnapshot {
    pub position: i32,
    pub target: i32,
    pub active: bool,
    pub half_period: u32,
    pub pulse_high: bool,
    pub next_event_time: u32,
    pub ramp_phase: RampPhase,
    pub events: u32,
    pub late_events: u32,
    pub max_lateness: u32,
    pub last_completion: u32,
    pub moves_completed: u32,
}

/// Parameters of a started move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovePlan {
    /// Absolute target position.
    pub target: i32,
    /// Half period of the first step [ticks].
    pub half_period: u32,
    /// Direction line level.
    pub forward: bool,
    /// Whether the timer was armed (false for a zero-step move).
    pub armed: bool,
}

// ─── Generator ──────────────────────────────────────────────────────

/// Interrupt-driven step pulse generator for one axis.
#[derive(Debug)]
pub struct StepPulseGenerator<S, D, P = Profile> {
    axis: AxisState,
    diagnostics: PulseDiagnostics,
    step: S,
    dir: D,
    profile: P,
    timing: PulseTiming,
}

impl<S, D, P> StepPulseGenerator<S, D, P>
where
    S: DigitalOutput,
    D: DigitalOutput,
    P: SpeedProfile,
{
    /// Create an idle generator at position 0. Drives the step line low.
    pub fn new(step: S, dir: D, profile: P, timing: PulseTiming) -> Self {
        step.set_low();
        Self {
            axis: AxisState::new(),
            diagnostics: PulseDiagnostics::default(),
            step,
            dir,
            profile,
            timing,
        }
    }

    #[inline]
    pub fn timing(&self) -> &PulseTiming {
        &self.timing
    }

    #[inline]
    pub fn profile(&self) -> &P {
        &self.profile
    }

    /// Start a relative move. Foreground only.
    ///
    /// The timer is disarmed while the move is set up, the direction line is
    /// driven, and the timer is re-armed to fire after the start delay.
    ///
    /// # Errors
    /// `MotionError::MoveRejected` if a move is active; nothing changes.
    pub fn start_move<T: StepTimer>(
        &self,
        timer: &T,
        now: u32,
        duration_ms: u16,
        delta_steps: i32,
    ) -> MotionResult<MovePlan> {
        let axis = &self.axis;
        if axis.active.load(Ordering::Acquire) {
            let err = MotionError::MoveRejected {
                position: axis.position.load(Ordering::Acquire),
                target: axis.target.load(Ordering::Acquire),
            };
            error!("{err}");
            return Err(err);
        }

        timer.disarm();
        axis.stop_requested.store(false, Ordering::Relaxed);
        axis.pulse_high.store(false, Ordering::Relaxed);
        axis.wait_remaining.store(0, Ordering::Relaxed);

        let position = axis.position.load(Ordering::Acquire);
        let target = position.wrapping_add(delta_steps);
        axis.target.store(target, Ordering::Release);

        let forward = delta_steps > 0;
        if delta_steps == 0 {
            self.profile.plan(&axis.ramp, position, target, 0);
            return Ok(MovePlan {
                target,
                half_period: 0,
                forward,
                armed: false,
            });
        }

        self.dir.set(forward);
        let cruise = self
            .timing
            .half_period_for(duration_ms, delta_steps.unsigned_abs());
        let half_period = self
            .profile
            .plan(&axis.ramp, position, target, cruise)
            .max(self.timing.min_half_period);

        axis.half_period.store(half_period, Ordering::Relaxed);
        axis.next_event_time
            .store(now.wrapping_add(self.timing.start_delay), Ordering::Relaxed);
        axis.active.store(true, Ordering::Release);
        timer.arm(self.timing.start_delay);

        info!(
            "Move to {target} ({delta_steps:+} steps), half_period={half_period}, cruise={cruise}, duration={duration_ms}ms, profile={}",
            self.profile.name()
        );

        Ok(MovePlan {
            target,
            half_period,
            forward,
            armed: true,
        })
    }

    /// Service one timer event at tick `now`. Interrupt context.
    ///
    /// Returns the interval until the next requested event.
    pub fn on_timer_event(&self, now: u32) -> u32 {
        let axis = &self.axis;
        if !axis.active.load(Ordering::Acquire) {
            return self.timing.idle_interval;
        }
        self.diagnostics.events.fetch_add(1, Ordering::Relaxed);

        if axis.stop_requested.swap(false, Ordering::AcqRel) {
            let position = axis.position.load(Ordering::Relaxed);
            axis.target.store(position, Ordering::Release);
            axis.wait_remaining.store(0, Ordering::Relaxed);
        }

        let half_period = axis.half_period.load(Ordering::Relaxed);
        if half_period == 0 {
            self.finish(now);
            return self.timing.idle_interval;
        }

        let deadline = axis.next_event_time.load(Ordering::Relaxed);
        let overdue = now.wrapping_sub(deadline) as i32;
        if overdue < 0 {
            return overdue.unsigned_abs();
        }
        self.record_lateness(overdue as u32);

        let pending = axis.wait_remaining.load(Ordering::Relaxed);
        if pending > 0 {
            let next_deadline = self.schedule(deadline, pending);
            axis.next_event_time.store(next_deadline, Ordering::Relaxed);
            return Self::interval_until(next_deadline, now);
        }

        let position = axis.position.load(Ordering::Relaxed);
        let target = axis.target.load(Ordering::Acquire);

        let next_deadline = if axis.pulse_high.load(Ordering::Relaxed) {
            self.step.set_low();
            axis.pulse_high.store(false, Ordering::Relaxed);
            if position == target {
                self.finish(now);
                return self.timing.idle_interval;
            }
            let half_period = self
                .profile
                .advance(&axis.ramp, position, target, half_period)
                .max(self.timing.min_half_period);
            axis.half_period.store(half_period, Ordering::Relaxed);
            self.schedule(deadline, half_period)
        } else if position != target {
            self.step.set_high();
            axis.pulse_high.store(true, Ordering::Relaxed);
            let next = if position > target {
                position - 1
            } else {
                position + 1
            };
            axis.position.store(next, Ordering::Release);
            self.schedule(deadline, half_period)
        } else {
            self.finish(now);
            return self.timing.idle_interval;
        };

        axis.next_event_time.store(next_deadline, Ordering::Relaxed);
        Self::interval_until(next_deadline, now)
    }

    /// Soft stop: the interrupt sets `target = position` at its next event,
    /// so at most the in-flight pulse completes. No-op while idle.
    pub fn stop(&self) {
        if self.axis.active.load(Ordering::Acquire) {
            self.axis.stop_requested.store(true, Ordering::Release);
        }
    }

    /// Define the current position as zero.
    ///
    /// # Errors
    /// `MotionError::MoveRejected` while a move is active.
    pub fn set_zero(&self) -> MotionResult<()> {
        let axis = &self.axis;
        if axis.active.load(Ordering::Acquire) {
            return Err(MotionError::MoveRejected {
                position: axis.position.load(Ordering::Acquire),
                target: axis.target.load(Ordering::Acquire),
            });
        }
        axis.position.store(0, Ordering::Release);
        axis.target.store(0, Ordering::Release);
        Ok(())
    }

    /// Whether a move is in progress. Safe from any context.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.axis.active.load(Ordering::Acquire)
    }

    #[inline]
    pub fn position(&self) -> i32 {
        self.axis.position.load(Ordering::Acquire)
    }

    #[inline]
    pub fn target(&self) -> i32 {
        self.axis.target.load(Ordering::Acquire)
    }

    #[inline]
    pub fn half_period(&self) -> u32 {
        self.axis.half_period.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn ramp(&self) -> &RampState {
        &self.axis.ramp
    }

    pub fn snapshot(&self) -> AxisSnapshot {
        let axis = &self.axis;
        let diag = &self.diagnostics;
        AxisSnapshot {
            position: axis.position.load(Ordering::Acquire),
            target: axis.target.load(Ordering::Acquire),
            active: axis.active.load(Ordering::Acquire),
            half_period: axis.half_period.load(Ordering::Relaxed),
            pulse_high: axis.pulse_high.load(Ordering::Relaxed),
            next_event_time: axis.next_event_time.load(Ordering::Relaxed),
            ramp_phase: axis.ramp.phase(),
            events: diag.events.load(Ordering::Relaxed),
            late_events: diag.late_events.load(Ordering::Relaxed),
            max_lateness: diag.max_lateness.load(Ordering::Relaxed),
            last_completion: diag.last_completion.load(Ordering::Relaxed),
            moves_completed: diag.moves_completed.load(Ordering::Relaxed),
        }
    }

    /// Deadline of the next event `interval` ticks after `from`, at most
    /// `MAX_EVENT_INTERVAL` away. The rest is left in `wait_remaining`.
    #[inline]
    fn schedule(&self, from: u32, interval: u32) -> u32 {
        let chunk = interval.min(MAX_EVENT_INTERVAL);
        self.axis
            .wait_remaining
            .store(interval - chunk, Ordering::Relaxed);
        from.wrapping_add(chunk)
    }

    #[inline]
    fn interval_until(deadline: u32, now: u32) -> u32 {
        match deadline.wrapping_sub(now) as i32 {
            remaining if remaining > 0 => remaining as u32,
            _ => 1,
        }
    }

    #[inline]
    fn record_lateness(&self, lateness: u32) {
        if lateness > 0 {
            self.diagnostics.late_events.fetch_add(1, Ordering::Relaxed);
            self.diagnostics
                .max_lateness
                .fetch_max(lateness, Ordering::Relaxed);
        }
    }

    fn finish(&self, now: u32) {
        let axis = &self.axis;
        axis.half_period.store(0, Ordering::Relaxed);
        axis.next_event_time.store(0, Ordering::Relaxed);
        axis.wait_remaining.store(0, Ordering::Relaxed);
        axis.pulse_high.store(false, Ordering::Relaxed);
        axis.ramp.set_phase(RampPhase::None);
        self.diagnostics.last_completion.store(now, Ordering::Relaxed);
        self.diagnostics.moves_completed.fetch_add(1, Ordering::Relaxed);
        axis.active.store(false, Ordering::Release);
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
