//! # Wire Cutter Motion Engine
//!
//! Real-time core of the wire cutter: one stepper axis that feeds wire and
//! one servo that drives the cutter lever. Command handlers enqueue work,
//! the main loop drains it one command at a time, and a hardware timer
//! interrupt emits the step pulses.
//!
//! ## Components
//!
//! 1. **RampTable**: precomputed repeat counts for linear acceleration
//! 2. **StepPulseGenerator**: interrupt-context stepping, owns axis state
//! 3. **CommandQueue**: bounded FIFO with back-pressure headroom
//! 4. **CutterActuator**: two-position servo with settle delays
//! 5. **MotionController**: the façade and per-iteration poll
//!
//! ## Execution Contexts
//!
//! The step interrupt runs `StepPulseGenerator::on_timer_event`, O(1) and
//! allocation-free. Everything else, including blocking cutter settles,
//! runs in the foreground main loop. Shared axis state is a set of
//! individually atomic fields gated by the `active` flag.

pub mod batch;
pub mod command;
pub mod config;
pub mod controller;
pub mod cutter;
pub mod error;
pub mod host;
pub mod pulse;
pub mod queue;
pub mod ramp;
pub mod status;

pub use crate::command::MotionCommand;
pub use crate::config::MotionConfig;
pub use crate::controller::MotionController;
pub use crate::error::{MotionError, MotionResult};
pub use crate::host::{RunOutcome, SimHost};
pub use crate::pulse::StepPulseGenerator;
pub use crate::queue::CommandQueue;
pub use crate::status::MotionStatus;
