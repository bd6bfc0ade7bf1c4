//! Autonomous cut batches.
//!
//! A batch feeds a fixed length of wire and cuts it, N times. Each cut is a
//! three-command burst (feed, cutter down, cutter up) issued by the host loop
//! only when the queue is empty and not reporting back-pressure.

use serde::{Deserialize, Serialize};
use static_assertions::const_assert;
use wire_common::consts::QUEUE_HEADROOM_DEFAULT;

use crate::command::MotionCommand;
use crate::config::MotionConfig;

/// Commands making up one cut.
pub const CUT_BURST_LEN: usize = 3;

const_assert!(CUT_BURST_LEN <= QUEUE_HEADROOM_DEFAULT);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutBatch {
    remaining: u32,
    duration_ms: u16,
    delta_steps: i32,
    down_settle_ms: u16,
    up_settle_ms: u16,
}

impl CutBatch {
    pub fn new(
        count: u32,
        duration_ms: u16,
        delta_steps: i32,
        down_settle_ms: u16,
        up_settle_ms: u16,
    ) -> Self {
        Self {
            remaining: count,
            duration_ms,
            delta_steps,
            down_settle_ms,
            up_settle_ms,
        }
    }

    /// `count` cuts of `length_mm`, converted with the axis geometry and
    /// the configured settle times.
    pub fn from_mm(config: &MotionConfig, count: u32, length_mm: u32) -> Self {
        Self::new(
            count,
            config.cut_duration_ms(length_mm),
            config.mm_to_steps(length_mm),
            config.cutter.cut_down_settle_ms,
            config.cutter.cut_up_settle_ms,
        )
    }

    #[inline]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        self.remaining == 0
    }

    /// Commands of one cut, without consuming it.
    pub fn burst(&self) -> [MotionCommand; CUT_BURST_LEN] {
        [
            MotionCommand::Move {
                duration_ms: self.duration_ms,
                delta_steps: self.delta_steps,
            },
            MotionCommand::CutterDown {
                settle_ms: self.down_settle_ms,
            },
            MotionCommand::CutterUp {
                settle_ms: self.up_settle_ms,
            },
        ]
    }

    /// Mark one cut as issued.
    pub fn consume(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }
}
