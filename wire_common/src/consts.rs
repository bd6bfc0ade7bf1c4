//! System-wide constants for the wire cutter workspace.
//!
//! Single source of truth for timing limits and default geometry.
//! Imported by every crate in the workspace.

use static_assertions::const_assert;

/// Timer ticks per millisecond (80 MHz cycle counter).
pub const TICKS_PER_MS: u32 = 80_000;

/// Lowest half period the stepper driver tolerates [ticks] (20 kHz step rate).
pub const MIN_HALF_PERIOD: u32 = 2_000;

/// Interval returned by the step interrupt while no move is active [ticks].
pub const IDLE_INTERVAL_TICKS: u32 = 10_000;

/// Longest interval the step interrupt requests in one event [ticks].
///
/// Longer half periods are split across several events so every pending
/// deadline stays well inside the wrapping comparison window.
pub const MAX_EVENT_INTERVAL: u32 = u32::MAX / 4;

/// Delay between arming the timer and the first step edge [µs].
pub const START_DELAY_US: u32 = 500;

/// Duration substituted for a zero-duration move [ms].
pub const DEFAULT_MOVE_DURATION_MS: u16 = 100;

/// Motion command queue capacity (power of two).
pub const QUEUE_CAPACITY: usize = 64;

/// Free slots the queue keeps in reserve before it reports full.
pub const QUEUE_HEADROOM_DEFAULT: usize = 3;

/// Maximum number of entries in a ramp table.
pub const RAMP_TABLE_CAPACITY: usize = 4096;

/// Default ramp start/stop half period [ticks].
pub const RAMP_START_STOP_HALF_PERIOD: u32 = 6_000;

/// Default ramp acceleration [steps/s²].
pub const RAMP_ACCELERATION_DEFAULT: u32 = 20_000;

/// Cutter servo "up" position (safe rest position).
pub const CUTTER_UP_POSITION: u16 = 0;

/// Cutter servo "down" position.
pub const CUTTER_DOWN_POSITION: u16 = 150;

/// Settle time after lowering the cutter during a batch cut [ms].
pub const CUT_DOWN_SETTLE_MS: u16 = 1_500;

/// Settle time after raising the cutter during a batch cut [ms].
pub const CUT_UP_SETTLE_MS: u16 = 800;

/// Microsteps per millimetre of wire feed.
pub const STEPS_PER_MM: u32 = 99;

/// Full steps per motor revolution.
pub const STEPS_PER_REV: u32 = 200;

/// Driver microstepping factor.
pub const MICROSTEPS: u32 = 16;

/// Homing feed rate [steps/s].
pub const HOME_SPEED_STEPS_PER_S: u32 = 3_000;

/// Batch cut duration per millimetre of feed [ms] (50 mm/s).
pub const CUT_MS_PER_MM: u32 = 20;

/// Default service name.
pub const DEFAULT_SERVICE_NAME: &str = "wire";

const_assert!(QUEUE_CAPACITY.is_power_of_two());
const_assert!(QUEUE_HEADROOM_DEFAULT < QUEUE_CAPACITY);
const_assert!(MAX_EVENT_INTERVAL < u32::MAX / 2);
const_assert!(MAX_EVENT_INTERVAL > IDLE_INTERVAL_TICKS);
const_assert!(RAMP_START_STOP_HALF_PERIOD > MIN_HALF_PERIOD);
const_assert!(((RAMP_START_STOP_HALF_PERIOD - MIN_HALF_PERIOD) as usize) <= RAMP_TABLE_CAPACITY);
