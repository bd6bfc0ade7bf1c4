//! Prelude module for common re-exports.
//!
//! `use wire_common::prelude::*;` brings in the configuration types,
//! the hardware capability traits and the most used constants.

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, SharedConfig};

// ─── Hardware Capabilities ──────────────────────────────────────────
pub use crate::hal::{
    Delay, DigitalOutput, HalError, HalParts, MotionHal, ServoOutput, StepTimer, TickClock,
};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{MIN_HALF_PERIOD, QUEUE_CAPACITY, TICKS_PER_MS};
