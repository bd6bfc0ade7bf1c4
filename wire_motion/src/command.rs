//! Motion commands carried by the command queue.

use serde::{Deserialize, Serialize};

/// A queued motion or actuator request. Immutable once enqueued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum MotionCommand {
    /// Relative move of `delta_steps` microsteps lasting about `duration_ms`.
    Move { duration_ms: u16, delta_steps: i32 },
    /// Raise the cutter, then wait `settle_ms`.
    CutterUp { settle_ms: u16 },
    /// Lower the cutter, then wait `settle_ms`.
    CutterDown { settle_ms: u16 },
    /// Move the cutter to the opposite position, then wait `settle_ms`.
    ToggleCutter { settle_ms: u16 },
}

impl MotionCommand {
    /// Short name for logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Move { .. } => "move",
            Self::CutterUp { .. } => "cutter_up",
            Self::CutterDown { .. } => "cutter_down",
            Self::ToggleCutter { .. } => "toggle_cutter",
        }
    }
}
