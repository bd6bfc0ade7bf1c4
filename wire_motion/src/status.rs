//! Read-only status snapshot of the motion engine.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cutter::CutterState;
use crate::pulse::AxisSnapshot;
use crate::pulse::profile::RampPhase;

/// Everything a status request reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotionStatus {
    pub position: i32,
    pub target: i32,
    pub active: bool,
    pub half_period: u32,
    pub pulse_high: bool,
    pub next_event_time: u32,
    pub ramp_phase: RampPhase,
    pub profile: String,
    pub queue_len: usize,
    pub queue_full: bool,
    pub motors_enabled: bool,
    pub cutter: CutterState,
    pub events: u32,
    pub late_events: u32,
    pub max_lateness: u32,
    pub last_completion: u32,
    pub moves_completed: u32,
    pub batch_remaining: u32,
}

impl MotionStatus {
    pub(crate) fn from_axis(axis: AxisSnapshot) -> Self {
        Self {
            position: axis.position,
            target: axis.target,
            active: axis.active,
            half_period: axis.half_period,
            pulse_high: axis.pulse_high,
            next_event_time: axis.next_event_time,
            ramp_phase: axis.ramp_phase,
            profile: String::new(),
            queue_len: 0,
            queue_full: false,
            motors_enabled: false,
            cutter: CutterState::Up,
            events: axis.events,
            late_events: axis.late_events,
            max_lateness: axis.max_lateness,
            last_completion: axis.last_completion,
            moves_completed: axis.moves_completed,
            batch_remaining: 0,
        }
    }
}

impl fmt::Display for RampPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Accel => write!(f, "accel"),
            Self::Decel => write!(f, "decel"),
        }
    }
}

/// `key=value` lines terminated by `OK`, one field per line.
impl fmt::Display for MotionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "position={}", self.position)?;
        writeln!(f, "target={}", self.target)?;
        writeln!(f, "active={}", self.active)?;
        writeln!(f, "half_period={}", self.half_period)?;
        writeln!(f, "pulse_high={}", self.pulse_high)?;
        writeln!(f, "next_event_time={}", self.next_event_time)?;
        writeln!(f, "ramp_phase={}", self.ramp_phase)?;
        writeln!(f, "profile={}", self.profile)?;
        writeln!(f, "queue_len={}", self.queue_len)?;
        writeln!(f, "queue_full={}", self.queue_full)?;
        writeln!(f, "motors={}", if self.motors_enabled { "on" } else { "off" })?;
        writeln!(f, "cutter={}", self.cutter)?;
        writeln!(f, "events={}", self.events)?;
        writeln!(f, "late_events={}", self.late_events)?;
        writeln!(f, "max_lateness={}", self.max_lateness)?;
        writeln!(f, "last_completion={}", self.last_completion)?;
        writeln!(f, "moves_completed={}", self.moves_completed)?;
        writeln!(f, "batch_remaining={}", self.batch_remaining)?;
        write!(f, "OK")
    }
}
