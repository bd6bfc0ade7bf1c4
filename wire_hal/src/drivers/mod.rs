//! HAL backend implementations.
//!
//! - [`simulation`] - software model of the timer, GPIO and servo for
//!   development and testing
//!
//! # Adding New Backends
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement the capability traits from `wire_common::hal`
//! 3. Provide a `MotionHal` marker type naming the peripheral types
//! 4. Add the backend name to [`BACKENDS`] and [`open_backend`]

pub mod simulation;

use tracing::info;
use wire_common::hal::HalError;

use self::simulation::SimulationBoard;

/// Names of the built-in backends.
pub const BACKENDS: &[&str] = &["simulation"];

/// Open a backend by name.
///
/// Only the simulation backend builds on a host; target boards provide
/// their own `MotionHal` implementation in firmware.
///
/// # Errors
/// `HalError::DriverNotFound` for an unknown name, `HalError::ConfigError`
/// for an invalid tick rate.
pub fn open_backend(name: &str, ticks_per_ms: u32) -> Result<SimulationBoard, HalError> {
    match name {
        "simulation" => {
            let board = SimulationBoard::new(ticks_per_ms)?;
            info!("Opened simulation backend ({} ticks/ms)", ticks_per_ms);
            Ok(board)
        }
        other => Err(HalError::DriverNotFound(other.to_string())),
    }
}
