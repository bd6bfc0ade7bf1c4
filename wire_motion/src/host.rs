//! Simulated host: the main loop and the step interrupt on virtual time.
//!
//! On the board the timer interrupt preempts the main loop whenever its
//! deadline passes. Here a single loop advances the simulation clock to
//! whichever comes first, the armed timer deadline or the next poll, and
//! runs that context. Blocking cutter settles advance the clock through the
//! simulated delay.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use wire_common::hal::TickClock;
use wire_hal::{Simulation, SimulationBoard, open_backend};

use crate::batch::CutBatch;
use crate::config::MotionConfig;
use crate::controller::MotionController;
use crate::error::MotionResult;

/// Main loop period of the simulated host [µs].
pub const DEFAULT_LOOP_PERIOD_US: u32 = 100;

/// Main loop counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopStats {
    /// Main loop polls.
    pub polls: u64,
    /// Polls that reported back-pressure.
    pub back_pressure_polls: u64,
    /// Step interrupt invocations.
    pub timer_events: u64,
    /// Cuts issued from a batch.
    pub cuts_issued: u64,
    /// Virtual time elapsed [ticks].
    pub elapsed_ticks: u64,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// Queue drained, axis at rest, no batch pending.
    Idle,
    /// `max_ticks` elapsed first.
    TimedOut,
    /// The shutdown flag was raised.
    Interrupted,
}

pub struct SimHost {
    board: SimulationBoard,
    controller: MotionController<Simulation>,
    loop_period: u32,
    next_poll_at: u32,
    back_pressure: bool,
    stats: LoopStats,
    shutdown: Arc<AtomicBool>,
}

impl SimHost {
    /// Open the simulation backend and build a controller on it.
    pub fn new(config: &MotionConfig) -> MotionResult<Self> {
        config.validate()?;
        let board = open_backend("simulation", config.timer.ticks_per_ms)?;
        let controller = MotionController::new(board.parts(), config)?;
        let loop_period = (config.timer.ticks_per_ms / 1000).max(1) * DEFAULT_LOOP_PERIOD_US;
        Ok(Self {
            board,
            controller,
            loop_period,
            next_poll_at: 0,
            back_pressure: false,
            stats: LoopStats::default(),
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Flag that ends `run_until_idle` with [`RunOutcome::Interrupted`].
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    pub fn controller(&self) -> &MotionController<Simulation> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut MotionController<Simulation> {
        &mut self.controller
    }

    pub fn board(&self) -> &SimulationBoard {
        &self.board
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    pub fn start_batch(&mut self, batch: CutBatch) {
        self.controller.start_batch(batch);
    }

    /// Advance to the next timer deadline or poll, whichever is first, and
    /// run it.
    pub fn step(&mut self) {
        let clock = &self.board.clock;
        let before = clock.now();

        let until_poll = ticks_until(before, self.next_poll_at);
        let wait = match self.board.timer.deadline() {
            Some(deadline) => ticks_until(before, deadline).min(until_poll),
            None => until_poll,
        };
        clock.advance(wait);

        let generator = Arc::clone(self.controller.generator());
        if self
            .board
            .timer
            .fire_if_due(|now| generator.on_timer_event(now))
        {
            self.stats.timer_events += 1;
        }

        if ticks_until(clock.now(), self.next_poll_at) == 0 {
            self.back_pressure = self.controller.poll();
            self.stats.polls += 1;
            if self.back_pressure {
                self.stats.back_pressure_polls += 1;
            }
            if self.controller.feed_batch(self.back_pressure) {
                self.stats.cuts_issued += 1;
            }
            self.next_poll_at = clock.now().wrapping_add(self.loop_period);
        }

        self.stats.elapsed_ticks += clock.now().wrapping_sub(before) as u64;
    }

    /// Run until the controller is idle, `max_ticks` of virtual time have
    /// elapsed, or shutdown is requested.
    pub fn run_until_idle(&mut self, max_ticks: u64) -> RunOutcome {
        let start = self.stats.elapsed_ticks;
        // One poll first so freshly queued work is picked up.
        self.step();
        loop {
            if self.shutdown.load(Ordering::Acquire) {
                warn!("Shutdown requested, stopping motion");
                self.controller.stop_all();
                return RunOutcome::Interrupted;
            }
            if self.controller.is_idle() {
                let elapsed = self.stats.elapsed_ticks - start;
                info!(
                    "Idle after {:.3} s ({} polls, {} timer events)",
                    elapsed as f64 / (self.board.clock.ticks_per_ms() as f64 * 1000.0),
                    self.stats.polls,
                    self.stats.timer_events
                );
                return RunOutcome::Idle;
            }
            if self.stats.elapsed_ticks - start >= max_ticks {
                warn!("Run timed out after {max_ticks} ticks");
                return RunOutcome::TimedOut;
            }
            self.step();
        }
    }

    /// Virtual milliseconds to ticks.
    pub fn ms_to_ticks(&self, ms: u64) -> u64 {
        ms * self.board.clock.ticks_per_ms() as u64
    }
}

/// Ticks from `now` until `deadline`, zero if already past.
#[inline]
fn ticks_until(now: u32, deadline: u32) -> u32 {
    let delta = deadline.wrapping_sub(now) as i32;
    if delta > 0 { delta as u32 } else { 0 }
}

impl std::fmt::Debug for SimHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimHost")
            .field("loop_period", &self.loop_period)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
