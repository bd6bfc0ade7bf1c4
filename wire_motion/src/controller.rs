//! Motion controller façade.
//!
//! Owns the step pulse generator, the cutter actuator and the command
//! queue. Command handlers enqueue through the `queue_*` methods; the host
//! main loop calls [`MotionController::poll`] once per iteration, which
//! dispatches the next command whenever the axis is idle.
//!
//! ```text
//!        queue_*()            poll()                 timer event
//!  handlers ──────▶ CommandQueue ──────▶ dispatch ──────▶ StepPulseGenerator
//!                                          │
//!                                          └──────▶ CutterActuator (blocking)
//! ```
//!
//! # State Machine
//!
//! `Idle` → `Moving` on a dispatched move, `Moving` → `Idle` on the first
//! poll after the generator reports completion. There is no terminal
//! state.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use wire_common::consts::HOME_SPEED_STEPS_PER_S;
use wire_common::prelude::*;

use crate::batch::CutBatch;
use crate::command::MotionCommand;
use crate::config::MotionConfig;
use crate::cutter::CutterActuator;
use crate::error::{MotionError, MotionResult};
use crate::pulse::profile::SpeedProfile;
use crate::pulse::StepPulseGenerator;
use crate::queue::CommandQueue;
use crate::status::MotionStatus;

/// Generator type of a backend.
pub type AxisGenerator<H> = StepPulseGenerator<<H as MotionHal>::StepPin, <H as MotionHal>::DirPin>;

/// Controller-level state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControllerState {
    Idle,
    Moving,
}

pub struct MotionController<H: MotionHal> {
    generator: Arc<AxisGenerator<H>>,
    cutter: CutterActuator<H::Servo, H::Delay>,
    queue: CommandQueue,
    enable: H::EnablePin,
    timer: H::Timer,
    clock: H::Clock,
    motors_enabled: bool,
    in_motion: bool,
    /// Axis position once every queued move has run.
    commanded_position: i32,
    /// Microsteps per motor revolution.
    steps_per_rev: i32,
    batch: Option<CutBatch>,
}

impl<H: MotionHal> MotionController<H> {
    /// Build a controller from backend peripherals.
    ///
    /// The driver starts disabled and the cutter starts up.
    ///
    /// # Errors
    /// `MotionError::InvalidConfig` if `config` fails validation or the ramp
    /// table cannot be built.
    pub fn new(parts: HalParts<H>, config: &MotionConfig) -> MotionResult<Self> {
        config.validate()?;
        let profile = config.build_profile()?;
        let profile_name = profile.name();
        let generator = StepPulseGenerator::new(parts.step, parts.dir, profile, config.pulse_timing());

        parts.enable.set_high();
        let cutter = CutterActuator::new(parts.servo, parts.delay, config.cutter.positions());

        info!(
            "Motion controller ready: profile={profile_name}, ticks_per_ms={}, min_half_period={}, headroom={}",
            config.timer.ticks_per_ms, config.axis.min_half_period, config.queue.headroom
        );

        Ok(Self {
            generator: Arc::new(generator),
            cutter,
            queue: CommandQueue::with_headroom(config.queue.headroom),
            enable: parts.enable,
            timer: parts.timer,
            clock: parts.clock,
            motors_enabled: false,
            in_motion: false,
            commanded_position: 0,
            steps_per_rev: config.steps_per_rev().min(i32::MAX as u32) as i32,
            batch: None,
        })
    }

    /// Shared handle for the step interrupt binding.
    pub fn generator(&self) -> &Arc<AxisGenerator<H>> {
        &self.generator
    }

    // ─── Queued API ─────────────────────────────────────────────────

    /// Queue a relative move.
    ///
    /// # Errors
    /// `MotionError::QueueFull` if no slot is free.
    pub fn queue_move(&mut self, duration_ms: u16, delta_steps: i32) -> MotionResult<()> {
        self.queue.push(MotionCommand::Move {
            duration_ms,
            delta_steps,
        })?;
        self.commanded_position = self.commanded_position.wrapping_add(delta_steps);
        debug!("Queued move {delta_steps:+} in {duration_ms}ms");
        Ok(())
    }

    /// Queue a move to an absolute position, relative to where the queued
    /// moves leave the axis.
    pub fn queue_move_to(&mut self, duration_ms: u16, position: i32) -> MotionResult<()> {
        let delta = position.wrapping_sub(self.commanded_position);
        self.queue_move(duration_ms, delta)
    }

    /// Queue a relative move of whole motor revolutions.
    pub fn queue_move_revs(&mut self, duration_ms: u16, revs: i32) -> MotionResult<()> {
        self.queue_move(duration_ms, revs.saturating_mul(self.steps_per_rev))
    }

    /// Queue a return to position 0 at `HOME_SPEED_STEPS_PER_S`. Nothing is
    /// queued when the queued moves already end at 0.
    pub fn queue_home(&mut self) -> MotionResult<()> {
        let distance = self.commanded_position.unsigned_abs() as u64;
        if distance == 0 {
            return Ok(());
        }
        let duration_ms = (distance * 1000 / HOME_SPEED_STEPS_PER_S as u64).min(u16::MAX as u64);
        self.queue_move_to(duration_ms as u16, 0)
    }

    pub fn queue_cutter_up(&mut self, settle_ms: u16) -> MotionResult<()> {
        self.queue.push(MotionCommand::CutterUp { settle_ms })
    }

    pub fn queue_cutter_down(&mut self, settle_ms: u16) -> MotionResult<()> {
        self.queue.push(MotionCommand::CutterDown { settle_ms })
    }

    pub fn queue_toggle_cutter(&mut self, settle_ms: u16) -> MotionResult<()> {
        self.queue.push(MotionCommand::ToggleCutter { settle_ms })
    }

    /// Queue a feed followed by a cut (down, then up), all or nothing.
    pub fn queue_cut(&mut self, batch: &CutBatch) -> MotionResult<()> {
        let burst = batch.burst();
        self.queue.push_all(&burst)?;
        if let MotionCommand::Move { delta_steps, .. } = burst[0] {
            self.commanded_position = self.commanded_position.wrapping_add(delta_steps);
        }
        Ok(())
    }

    // ─── Poll Loop ──────────────────────────────────────────────────

    /// One main-loop iteration. Returns the queue's back-pressure flag.
    pub fn poll(&mut self) -> bool {
        if self.in_motion {
            if self.generator.is_active() {
                return self.queue.is_full();
            }
            self.timer.disarm();
            self.in_motion = false;
            info!("Move complete at {}", self.generator.position());
        }

        if let Some(cmd) = self.queue.pop() {
            self.dispatch(cmd);
        }
        self.queue.is_full()
    }

    fn dispatch(&mut self, cmd: MotionCommand) {
        debug!("Dispatching {}", cmd.name());
        match cmd {
            MotionCommand::Move {
                duration_ms,
                delta_steps,
            } => {
                if !self.motors_enabled {
                    self.motors_on();
                }
                let now = self.clock.now();
                match self
                    .generator
                    .start_move(&self.timer, now, duration_ms, delta_steps)
                {
                    Ok(plan) => self.in_motion = plan.armed,
                    Err(e) => warn!("Dropped move command: {e}"),
                }
            }
            MotionCommand::CutterUp { settle_ms } => self.cutter.move_up(settle_ms),
            MotionCommand::CutterDown { settle_ms } => self.cutter.move_down(settle_ms),
            MotionCommand::ToggleCutter { settle_ms } => self.cutter.toggle(settle_ms),
        }
    }

    // ─── Cut Batch ──────────────────────────────────────────────────

    /// Replace the running batch.
    pub fn start_batch(&mut self, batch: CutBatch) {
        info!("Cut batch started: {} cuts", batch.remaining());
        self.batch = (!batch.is_done()).then_some(batch);
    }

    /// Issue the next cut of the batch if the last poll reported no
    /// back-pressure and the queue has drained. Returns whether a cut was
    /// queued.
    pub fn feed_batch(&mut self, back_pressure: bool) -> bool {
        if back_pressure || !self.queue.is_empty() {
            return false;
        }
        let Some(mut batch) = self.batch else {
            return false;
        };
        if let Err(e) = self.queue_cut(&batch) {
            warn!("Cut batch stalled: {e}");
            return false;
        }
        batch.consume();
        debug!("Cut queued, {} remaining", batch.remaining());
        self.batch = (!batch.is_done()).then_some(batch);
        true
    }

    pub fn batch_remaining(&self) -> u32 {
        self.batch.map_or(0, |b| b.remaining())
    }

    // ─── Immediate API ──────────────────────────────────────────────

    /// Drop every queued command, cancel the batch and soft-stop the axis.
    pub fn stop_all(&mut self) {
        let dropped = self.queue.len();
        self.queue.clear();
        self.generator.stop();
        self.batch = None;
        self.commanded_position = self.generator.position();
        warn!("Stop: dropped {dropped} queued commands");
    }

    /// Enable the driver (active-low line).
    pub fn motors_on(&mut self) {
        self.enable.set_low();
        self.motors_enabled = true;
        info!("Motors on");
    }

    pub fn motors_off(&mut self) {
        self.enable.set_high();
        self.motors_enabled = false;
        info!("Motors off");
    }

    pub fn toggle_motors(&mut self) {
        if self.motors_enabled {
            self.motors_off();
        } else {
            self.motors_on();
        }
    }

    /// Redefine the current axis position as zero. Queued moves keep their
    /// relative offsets.
    ///
    /// # Errors
    /// `MotionError::MoveRejected` while the axis is moving.
    pub fn set_zero(&mut self) -> MotionResult<()> {
        if self.in_motion {
            return Err(MotionError::MoveRejected {
                position: self.generator.position(),
                target: self.generator.target(),
            });
        }
        let offset = self.generator.position();
        self.generator.set_zero()?;
        self.commanded_position = self.commanded_position.wrapping_sub(offset);
        info!("Position zeroed");
        Ok(())
    }

    // ─── Status ─────────────────────────────────────────────────────

    pub fn state(&self) -> ControllerState {
        if self.in_motion || self.generator.is_active() {
            ControllerState::Moving
        } else {
            ControllerState::Idle
        }
    }

    /// Nothing moving, nothing queued, no batch pending.
    pub fn is_idle(&self) -> bool {
        self.state() == ControllerState::Idle && self.queue.is_empty() && self.batch.is_none()
    }

    #[inline]
    pub fn motors_enabled(&self) -> bool {
        self.motors_enabled
    }

    #[inline]
    pub fn commanded_position(&self) -> i32 {
        self.commanded_position
    }

    pub fn queue(&self) -> &CommandQueue {
        &self.queue
    }

    pub fn cutter(&self) -> &CutterActuator<H::Servo, H::Delay> {
        &self.cutter
    }

    pub fn status(&self) -> MotionStatus {
        let mut status = MotionStatus::from_axis(self.generator.snapshot());
        status.profile = self.generator.profile().name().to_string();
        status.queue_len = self.queue.len();
        status.queue_full = self.queue.is_full();
        status.motors_enabled = self.motors_enabled;
        status.cutter = self.cutter.state();
        status.batch_remaining = self.batch_remaining();
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cutter::CutterState;
    use wire_hal::{Simulation, SimulationBoard};

    fn controller() -> (SimulationBoard, MotionController<Simulation>) {
        let config = MotionConfig::default();
        let board = SimulationBoard::new(config.timer.ticks_per_ms).unwrap();
        let controller = MotionController::new(board.parts(), &config).unwrap();
        (board, controller)
    }

    #[test]
    fn starts_with_motors_off_and_cutter_up() {
        let (board, controller) = controller();
        assert!(board.enable.level());
        assert!(!controller.motors_enabled());
        assert_eq!(board.servo.position(), Some(0));
        assert!(controller.is_idle());
    }

    #[test]
    fn move_dispatch_enables_motors_and_arms_timer() {
        let (board, mut controller) = controller();
        controller.queue_move(100, 1_000).unwrap();
        assert!(!controller.poll());
        assert!(controller.motors_enabled());
        assert!(!board.enable.level());
        assert!(board.timer.is_armed());
        assert_eq!(controller.state(), ControllerState::Moving);
        assert_eq!(controller.generator().target(), 1_000);
    }

    #[test]
    fn cutter_commands_run_synchronously() {
        let (board, mut controller) = controller();
        controller.queue_cutter_down(1_500).unwrap();
        controller.queue_toggle_cutter(0).unwrap();
        controller.poll();
        assert_eq!(controller.cutter().state(), CutterState::Down);
        assert_eq!(board.delay.total_ms(), 1_500);
        controller.poll();
        assert_eq!(controller.cutter().state(), CutterState::Up);
    }

    #[test]
    fn poll_holds_queue_while_moving() {
        let (_board, mut controller) = controller();
        controller.queue_move(100, 10).unwrap();
        controller.queue_cutter_down(0).unwrap();
        controller.poll();
        controller.poll();
        assert_eq!(controller.queue().len(), 1);
        assert_eq!(controller.cutter().state(), CutterState::Up);
    }

    #[test]
    fn queue_move_to_tracks_commanded_position() {
        let (_board, mut controller) = controller();
        controller.queue_move(10, 300).unwrap();
        controller.queue_move_to(10, 100).unwrap();
        assert_eq!(controller.commanded_position(), 100);
        assert_eq!(
            controller.queue().peek(),
            Some(&MotionCommand::Move {
                duration_ms: 10,
                delta_steps: 300
            })
        );
    }

    #[test]
    fn revolution_moves_scale_by_microsteps() {
        let (_board, mut controller) = controller();
        controller.queue_move_revs(500, 2).unwrap();
        controller.queue_move_revs(500, -3).unwrap();
        assert_eq!(controller.commanded_position(), -3_200);
        assert_eq!(
            controller.queue().peek(),
            Some(&MotionCommand::Move {
                duration_ms: 500,
                delta_steps: 6_400
            })
        );
    }

    #[test]
    fn home_returns_at_homing_speed() {
        let (_board, mut controller) = controller();
        controller.queue_home().unwrap();
        assert!(controller.queue().is_empty());

        controller.queue_move(10, 6_000).unwrap();
        controller.queue_home().unwrap();
        assert_eq!(controller.commanded_position(), 0);
        assert_eq!(controller.queue().len(), 2);
        controller.queue.pop();
        // 6000 steps at 3000 steps/s.
        assert_eq!(
            controller.queue.pop(),
            Some(MotionCommand::Move {
                duration_ms: 2_000,
                delta_steps: -6_000
            })
        );
    }

    #[test]
    fn stop_all_clears_queue_and_batch() {
        let (_board, mut controller) = controller();
        controller.start_batch(CutBatch::new(5, 10, 100, 0, 0));
        assert!(controller.feed_batch(false));
        controller.queue_move(10, 50).unwrap();
        controller.stop_all();
        assert!(controller.queue().is_empty());
        assert_eq!(controller.batch_remaining(), 0);
        assert_eq!(controller.commanded_position(), 0);
    }

    #[test]
    fn feed_batch_respects_back_pressure_and_pending_work() {
        let (_board, mut controller) = controller();
        controller.start_batch(CutBatch::new(2, 10, 100, 0, 0));
        assert!(!controller.feed_batch(true));
        assert!(controller.feed_batch(false));
        assert_eq!(controller.queue().len(), 3);
        assert!(!controller.feed_batch(false));
        assert_eq!(controller.batch_remaining(), 1);
    }

    #[test]
    fn motor_toggle_drives_active_low_enable() {
        let (board, mut controller) = controller();
        controller.toggle_motors();
        assert!(!board.enable.level());
        controller.toggle_motors();
        assert!(board.enable.level());
        controller.motors_on();
        assert!(controller.status().motors_enabled);
    }

    #[test]
    fn rejects_invalid_config() {
        let mut config = MotionConfig::default();
        config.queue.headroom = 100;
        let board = SimulationBoard::new(80_000).unwrap();
        assert!(matches!(
            MotionController::<Simulation>::new(board.parts(), &config),
            Err(MotionError::InvalidConfig(_))
        ));
    }
}
