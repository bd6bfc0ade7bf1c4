//! Simulation backend.
//!
//! A software model of the wire cutter board: an 80 MHz-style tick counter
//! advanced explicitly by the caller, a one-slot periodic timer, three GPIO
//! lines with edge counters, the cutter servo and a delay that consumes
//! virtual time.

mod clock;
mod gpio;
mod servo;
mod timer;

pub use clock::SimClock;
pub use gpio::SimPin;
pub use servo::{SimDelay, SimServo};
pub use timer::SimTimer;

use std::sync::Arc;

use wire_common::hal::{HalError, HalParts, MotionHal};

/// `MotionHal` marker for the simulation backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Simulation;

impl MotionHal for Simulation {
    type StepPin = Arc<SimPin>;
    type DirPin = Arc<SimPin>;
    type EnablePin = Arc<SimPin>;
    type Timer = Arc<SimTimer>;
    type Clock = Arc<SimClock>;
    type Servo = SimServo;
    type Delay = SimDelay;
}

/// Simulated board holding inspection handles to every peripheral.
#[derive(Debug, Clone)]
pub struct SimulationBoard {
    /// Tick counter.
    pub clock: Arc<SimClock>,
    /// Step interrupt timer.
    pub timer: Arc<SimTimer>,
    /// Step line.
    pub step: Arc<SimPin>,
    /// Direction line (high = forward).
    pub dir: Arc<SimPin>,
    /// Active-low driver enable line.
    pub enable: Arc<SimPin>,
    /// Cutter servo.
    pub servo: SimServo,
    /// Blocking delay.
    pub delay: SimDelay,
}

impl SimulationBoard {
    /// Create a board whose clock runs at `ticks_per_ms`.
    ///
    /// The enable line starts high (driver disabled), as on the real board.
    ///
    /// # Errors
    /// `HalError::ConfigError` if `ticks_per_ms` is zero.
    pub fn new(ticks_per_ms: u32) -> Result<Self, HalError> {
        if ticks_per_ms == 0 {
            return Err(HalError::ConfigError(
                "ticks_per_ms must be non-zero".to_string(),
            ));
        }
        let clock = Arc::new(SimClock::new(ticks_per_ms));
        Ok(Self {
            timer: Arc::new(SimTimer::new(Arc::clone(&clock))),
            step: Arc::new(SimPin::new(false)),
            dir: Arc::new(SimPin::new(false)),
            enable: Arc::new(SimPin::new(true)),
            servo: SimServo::default(),
            delay: SimDelay::new(Arc::clone(&clock)),
            clock,
        })
    }

    /// Peripheral handles for a controller; the board keeps its own
    /// handles for inspection.
    pub fn parts(&self) -> HalParts<Simulation> {
        HalParts {
            step: Arc::clone(&self.step),
            dir: Arc::clone(&self.dir),
            enable: Arc::clone(&self.enable),
            timer: Arc::clone(&self.timer),
            clock: Arc::clone(&self.clock),
            servo: self.servo.clone(),
            delay: self.delay.clone(),
        }
    }
}
