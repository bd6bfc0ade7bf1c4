//! Motion engine configuration.
//!
//! One TOML file, every table optional:
//!
//! ```toml
//! [shared]
//! log_level = "info"
//!
//! [timer]
//! ticks_per_ms = 80000
//!
//! [ramp]
//! enabled = true
//! acceleration = 20000
//! ```
//!
//! Loaded through [`ConfigLoader`], then checked with
//! [`MotionConfig::validate`] before anything is built from it.

use std::path::Path;

use serde::{Deserialize, Serialize};
use wire_common::config::{ConfigError, ConfigLoader, SharedConfig};
use wire_common::consts::{
    CUT_DOWN_SETTLE_MS, CUT_MS_PER_MM, CUT_UP_SETTLE_MS, CUTTER_DOWN_POSITION, CUTTER_UP_POSITION,
    IDLE_INTERVAL_TICKS, MICROSTEPS, MIN_HALF_PERIOD, QUEUE_CAPACITY, QUEUE_HEADROOM_DEFAULT,
    RAMP_ACCELERATION_DEFAULT, RAMP_START_STOP_HALF_PERIOD, RAMP_TABLE_CAPACITY, START_DELAY_US,
    STEPS_PER_MM, STEPS_PER_REV, TICKS_PER_MS,
};

use crate::cutter::CutterPositions;
use crate::error::MotionResult;
use crate::pulse::PulseTiming;
use crate::pulse::profile::{ConstantSpeed, Profile, TableRamp};
use crate::ramp::RampTable;

// ─── Sections ───────────────────────────────────────────────────────

/// `[timer]`: step interrupt timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    pub ticks_per_ms: u32,
    pub start_delay_us: u32,
    pub idle_interval_ticks: u32,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            ticks_per_ms: TICKS_PER_MS,
            start_delay_us: START_DELAY_US,
            idle_interval_ticks: IDLE_INTERVAL_TICKS,
        }
    }
}

/// `[axis]`: driver limits and feed geometry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisConfig {
    pub min_half_period: u32,
    pub steps_per_mm: u32,
    pub microsteps: u32,
    pub steps_per_rev: u32,
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self {
            min_half_period: MIN_HALF_PERIOD,
            steps_per_mm: STEPS_PER_MM,
            microsteps: MICROSTEPS,
            steps_per_rev: STEPS_PER_REV,
        }
    }
}

/// `[ramp]`: acceleration shaping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RampConfig {
    pub enabled: bool,
    /// Half period every ramped move starts and stops at [ticks].
    pub start_stop_half_period: u32,
    /// [steps/s²]
    pub acceleration: u32,
}

impl Default for RampConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            start_stop_half_period: RAMP_START_STOP_HALF_PERIOD,
            acceleration: RAMP_ACCELERATION_DEFAULT,
        }
    }
}

/// `[queue]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Free slots below which the queue reports back-pressure.
    pub headroom: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            headroom: QUEUE_HEADROOM_DEFAULT,
        }
    }
}

/// `[cutter]`: servo positions and batch cut settle times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CutterConfig {
    pub up_position: u16,
    pub down_position: u16,
    pub cut_down_settle_ms: u16,
    pub cut_up_settle_ms: u16,
}

impl Default for CutterConfig {
    fn default() -> Self {
        Self {
            up_position: CUTTER_UP_POSITION,
            down_position: CUTTER_DOWN_POSITION,
            cut_down_settle_ms: CUT_DOWN_SETTLE_MS,
            cut_up_settle_ms: CUT_UP_SETTLE_MS,
        }
    }
}

impl CutterConfig {
    pub fn positions(&self) -> CutterPositions {
        CutterPositions {
            up: self.up_position,
            down: self.down_position,
        }
    }
}

// ─── Top Level ──────────────────────────────────────────────────────

/// Complete motion engine configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    pub shared: SharedConfig,
    pub timer: TimerConfig,
    pub axis: AxisConfig,
    pub ramp: RampConfig,
    pub queue: QueueConfig,
    pub cutter: CutterConfig,
}

impl MotionConfig {
    /// Load from a TOML file and validate.
    pub fn load_validated(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Check parameter bounds.
    ///
    /// # Errors
    /// `ConfigError::ValidationError` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        let timer = &self.timer;
        if timer.ticks_per_ms == 0 {
            return Err(invalid("timer.ticks_per_ms must be non-zero"));
        }
        if timer.ticks_per_ms % 1000 != 0 {
            return Err(invalid(format!(
                "timer.ticks_per_ms {} must be a whole number of ticks per µs",
                timer.ticks_per_ms
            )));
        }
        if timer.idle_interval_ticks == 0 {
            return Err(invalid("timer.idle_interval_ticks must be non-zero"));
        }
        if self.start_delay_ticks() as u64 > (i32::MAX as u64) {
            return Err(invalid("timer.start_delay_us exceeds the tick counter range"));
        }

        if self.axis.min_half_period == 0 {
            return Err(invalid("axis.min_half_period must be at least 1"));
        }
        if self.axis.steps_per_mm == 0 {
            return Err(invalid("axis.steps_per_mm must be non-zero"));
        }
        if self.axis.steps_per_rev == 0 || self.axis.microsteps == 0 {
            return Err(invalid("axis.steps_per_rev and axis.microsteps must be non-zero"));
        }
        if self.steps_per_rev() > i32::MAX as u32 {
            return Err(invalid("axis.steps_per_rev * axis.microsteps overflows the position range"));
        }

        if self.queue.headroom >= QUEUE_CAPACITY {
            return Err(invalid(format!(
                "queue.headroom {} must be below capacity {QUEUE_CAPACITY}",
                self.queue.headroom
            )));
        }

        if self.cutter.up_position == self.cutter.down_position {
            return Err(invalid("cutter.up_position and cutter.down_position must differ"));
        }

        if self.ramp.enabled {
            let ramp = &self.ramp;
            if ramp.acceleration == 0 {
                return Err(invalid("ramp.acceleration must be non-zero"));
            }
            if ramp.start_stop_half_period <= self.axis.min_half_period {
                return Err(invalid(format!(
                    "ramp.start_stop_half_period {} must exceed axis.min_half_period {}",
                    ramp.start_stop_half_period, self.axis.min_half_period
                )));
            }
            let len = (ramp.start_stop_half_period - self.axis.min_half_period) as usize;
            if len > RAMP_TABLE_CAPACITY {
                return Err(invalid(format!(
                    "ramp table needs {len} entries, capacity is {RAMP_TABLE_CAPACITY}"
                )));
            }
        }

        Ok(())
    }

    pub fn start_delay_ticks(&self) -> u32 {
        let per_us = self.timer.ticks_per_ms / 1000;
        self.timer.start_delay_us.saturating_mul(per_us)
    }

    pub fn pulse_timing(&self) -> PulseTiming {
        PulseTiming {
            ticks_per_ms: self.timer.ticks_per_ms,
            min_half_period: self.axis.min_half_period,
            idle_interval: self.timer.idle_interval_ticks,
            start_delay: self.start_delay_ticks(),
        }
    }

    /// Speed profile selected by `[ramp] enabled`. Builds the ramp table.
    pub fn build_profile(&self) -> MotionResult<Profile> {
        if !self.ramp.enabled {
            return Ok(Profile::Constant(ConstantSpeed));
        }
        let table = RampTable::generate(
            self.timer.ticks_per_ms,
            self.ramp.start_stop_half_period,
            self.axis.min_half_period,
            self.ramp.acceleration,
        )?;
        Ok(Profile::Ramp(TableRamp::new(table)))
    }

    /// Microsteps for a feed of `mm` millimetres.
    pub fn mm_to_steps(&self, mm: u32) -> i32 {
        mm.saturating_mul(self.axis.steps_per_mm).min(i32::MAX as u32) as i32
    }

    /// Batch cut duration for a feed of `mm` millimetres [ms].
    pub fn cut_duration_ms(&self, mm: u32) -> u16 {
        mm.saturating_mul(CUT_MS_PER_MM).min(u16::MAX as u32) as u16
    }

    /// Microsteps per motor revolution.
    pub fn steps_per_rev(&self) -> u32 {
        self.axis.steps_per_rev.saturating_mul(self.axis.microsteps)
    }
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(msg.into())
}
