//! Ramp table: repeat counts that linearise acceleration.
//!
//! Entry `i` holds how many further steps the generator keeps the half
//! period `h = start_half_period - i` before moving it one tick toward the
//! cruise value. With a timer rate of `f` ticks/s and an acceleration of
//! `a` steps/s², one tick of half period is worth `f² / (4·h³·a)` steps.
//!
//! The table is built once at startup and is read-only afterwards, so the
//! step interrupt reads it without synchronisation.

use heapless::Vec;
use wire_common::config::ConfigError;
use wire_common::consts::RAMP_TABLE_CAPACITY;

use crate::error::{MotionError, MotionResult};

/// Precomputed ramp repeat counts.
#[derive(Debug, Clone)]
pub struct RampTable {
    counts: Vec<u16, RAMP_TABLE_CAPACITY>,
    start_half_period: u32,
}

impl RampTable {
    /// Build a table for a constant `acceleration` [steps/s²] between
    /// `start_half_period` and `min_half_period`.
    ///
    /// # Errors
    /// `MotionError::InvalidConfig` if the acceleration or tick rate is zero,
    /// the start half period does not exceed the minimum, or the table
    /// would exceed `RAMP_TABLE_CAPACITY` entries.
    pub fn generate(
        ticks_per_ms: u32,
        start_half_period: u32,
        min_half_period: u32,
        acceleration: u32,
    ) -> MotionResult<Self> {
        if ticks_per_ms == 0 || acceleration == 0 {
            return Err(invalid("ramp needs non-zero tick rate and acceleration"));
        }
        if start_half_period <= min_half_period || min_half_period == 0 {
            return Err(invalid(format!(
                "ramp start half period {start_half_period} must exceed minimum {min_half_period}"
            )));
        }
        let len = (start_half_period - min_half_period) as usize;
        if len > RAMP_TABLE_CAPACITY {
            return Err(invalid(format!(
                "ramp table needs {len} entries, capacity is {RAMP_TABLE_CAPACITY}"
            )));
        }

        let f = ticks_per_ms as f64 * 1000.0;
        let a = acceleration as f64;
        let mut counts = Vec::new();
        for i in 0..len {
            let h = (start_half_period as usize - i) as f64;
            let steps = (f * f / (4.0 * h * h * h * a)).round();
            let count = steps.clamp(0.0, u16::MAX as f64) as u16;
            // Capacity was checked above.
            let _ = counts.push(count);
        }

        Ok(Self {
            counts,
            start_half_period,
        })
    }

    /// Build a table from explicit repeat counts.
    ///
    /// # Errors
    /// `MotionError::InvalidConfig` if `counts` is longer than the capacity
    /// or would take the half period to zero.
    pub fn from_counts(start_half_period: u32, counts: &[u16]) -> MotionResult<Self> {
        if counts.len() >= start_half_period as usize {
            return Err(invalid("ramp table reaches a zero half period"));
        }
        let counts = Vec::from_slice(counts).map_err(|_| {
            invalid(format!(
                "ramp table has {} entries, capacity is {RAMP_TABLE_CAPACITY}",
                counts.len()
            ))
        })?;
        Ok(Self {
            counts,
            start_half_period,
        })
    }

    /// Half period every ramped move starts and ends at.
    #[inline]
    pub const fn start_half_period(&self) -> u32 {
        self.start_half_period
    }

    /// Lowest half period the table reaches.
    #[inline]
    pub fn floor_half_period(&self) -> u32 {
        self.start_half_period - self.counts.len() as u32
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether the table has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Repeat count at `index`; zero past the end.
    #[inline]
    pub fn count(&self, index: usize) -> u16 {
        self.counts.get(index).copied().unwrap_or(0)
    }
}

fn invalid(msg: impl Into<String>) -> MotionError {
    MotionError::InvalidConfig(ConfigError::ValidationError(msg.into()))
}
