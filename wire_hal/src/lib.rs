//! # Wire Cutter HAL Library
//!
//! Hardware backends implementing the capability traits from
//! `wire_common::hal`. Each backend provides a `MotionHal` bundle that the
//! motion controller is instantiated with.
//!
//! # Module Structure
//!
//! - [`drivers`] - backend implementations and lookup by name
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                    wire_hal                                │
//! │  ┌───────────────┐   ┌──────────────────────────────────┐  │
//! │  │ open_backend()│──►│ SimulationBoard (MotionHal)      │  │
//! │  └───────────────┘   │  SimClock  SimTimer  SimPin x3   │  │
//! │                      │  SimServo  SimDelay              │  │
//! │                      └──────────────────────────────────┘  │
//! └────────────────────────────────────────────────────────────┘
//! ```

#![deny(warnings)]
#![deny(missing_docs)]

pub mod drivers;

pub use crate::drivers::open_backend;
pub use crate::drivers::simulation::{
    Simulation, SimClock, SimDelay, SimPin, SimServo, SimTimer, SimulationBoard,
};
