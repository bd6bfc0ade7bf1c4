//! Hardware capability traits and error types.
//!
//! The motion engine never touches a peripheral directly. It consumes these
//! capabilities, which a HAL backend (simulation, ESP8266 timer1, …) provides:
//!
//! - `TickClock` - free-running monotonic tick counter
//! - `StepTimer` - one periodic callback slot re-armed with a tick interval
//! - `DigitalOutput` - step, direction and driver-enable lines
//! - `ServoOutput` - position-controlled cutter servo
//! - `Delay` - blocking wait, foreground context only
//!
//! # Context Contracts
//!
//! | Capability | Interrupt context | Foreground context |
//! |------------|-------------------|--------------------|
//! | `TickClock::now` | yes | yes |
//! | `StepTimer` | no (the return value re-arms) | yes |
//! | `DigitalOutput` | step line only | all lines |
//! | `ServoOutput` | no | yes |
//! | `Delay` | **never** | yes |

use std::sync::Arc;
use thiserror::Error;

/// Error types for HAL backends.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HalError {
    /// Backend construction failed
    #[error("Initialization failed: {0}")]
    InitFailed(String),

    /// Backend configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Backend not found
    #[error("Driver not found: {0}")]
    DriverNotFound(String),
}

/// Free-running tick counter.
///
/// `now()` wraps at `u32::MAX`; deadlines are compared with wrapping
/// arithmetic, so intervals must stay below `u32::MAX / 2`. The step
/// handler never requests more than `consts::MAX_EVENT_INTERVAL`.
pub trait TickClock {
    /// Current tick count.
    fn now(&self) -> u32;

    /// Tick rate.
    fn ticks_per_ms(&self) -> u32;
}

/// Periodic callback slot driving the step interrupt.
///
/// After `arm(interval)` the platform calls the step handler once the
/// interval has elapsed and re-arms itself with the interval the handler
/// returns, until `disarm()` is called from the foreground.
pub trait StepTimer {
    /// Attach the step handler and schedule the first call.
    fn arm(&self, interval_ticks: u32);

    /// Detach the step handler.
    fn disarm(&self);

    /// Whether the step handler is attached.
    fn is_armed(&self) -> bool;
}

/// Single digital output line.
pub trait DigitalOutput {
    /// Drive the line to the given level.
    fn set(&self, high: bool);

    /// Drive the line high.
    #[inline]
    fn set_high(&self) {
        self.set(true);
    }

    /// Drive the line low.
    #[inline]
    fn set_low(&self) {
        self.set(false);
    }
}

/// Position-controlled servo output.
pub trait ServoOutput {
    /// Command the servo to `position` (backend units, e.g. degrees).
    fn write(&mut self, position: u16);
}

/// Blocking delay provider.
pub trait Delay {
    /// Block the calling context for `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);
}

/// Bundle of capability types provided by one HAL backend.
///
/// The motion controller is generic over a backend rather than over each
/// capability, so a board names its peripheral types once.
pub trait MotionHal {
    /// Step pulse line (driven from interrupt context).
    type StepPin: DigitalOutput;
    /// Direction line.
    type DirPin: DigitalOutput;
    /// Active-low driver enable line.
    type EnablePin: DigitalOutput;
    /// Step interrupt timer.
    type Timer: StepTimer;
    /// Tick counter.
    type Clock: TickClock;
    /// Cutter servo.
    type Servo: ServoOutput;
    /// Blocking delay.
    type Delay: Delay;
}

/// Owned peripheral handles of one backend, consumed by the controller.
pub struct HalParts<H: MotionHal> {
    pub step: H::StepPin,
    pub dir: H::DirPin,
    pub enable: H::EnablePin,
    pub timer: H::Timer,
    pub clock: H::Clock,
    pub servo: H::Servo,
    pub delay: H::Delay,
}

impl<T: TickClock + ?Sized> TickClock for Arc<T> {
    #[inline]
    fn now(&self) -> u32 {
        (**self).now()
    }

    #[inline]
    fn ticks_per_ms(&self) -> u32 {
        (**self).ticks_per_ms()
    }
}

impl<T: StepTimer + ?Sized> StepTimer for Arc<T> {
    #[inline]
    fn arm(&self, interval_ticks: u32) {
        (**self).arm(interval_ticks)
    }

    #[inline]
    fn disarm(&self) {
        (**self).disarm()
    }

    #[inline]
    fn is_armed(&self) -> bool {
        (**self).is_armed()
    }
}

impl<T: DigitalOutput + ?Sized> DigitalOutput for Arc<T> {
    #[inline]
    fn set(&self, high: bool) {
        (**self).set(high)
    }
}
