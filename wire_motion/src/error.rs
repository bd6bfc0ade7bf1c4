//! Error types for the motion engine.
//!
//! No condition here is fatal: every error is recovered locally by
//! discarding the offending request and returning to idle.

use thiserror::Error;
use wire_common::config::ConfigError;
use wire_common::hal::HalError;

/// Errors reported by the motion engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MotionError {
    /// A move (or position reset) was requested while a move is active.
    #[error("ERR_MOVE_REJECTED: move already in progress (position {position}, target {target})")]
    MoveRejected {
        /// Axis position when the request was rejected.
        position: i32,
        /// Target of the in-flight move.
        target: i32,
    },

    /// The command queue has no free slot for the request.
    #[error("ERR_QUEUE_FULL: command queue full ({capacity} slots)")]
    QueueFull {
        /// Queue capacity.
        capacity: usize,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// HAL backend could not be opened.
    #[error("hardware backend: {0}")]
    Hal(#[from] HalError),
}

/// Result type for motion operations.
pub type MotionResult<T> = Result<T, MotionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_context() {
        let err = MotionError::MoveRejected {
            position: 12,
            target: 1000,
        };
        let text = err.to_string();
        assert!(text.starts_with("ERR_MOVE_REJECTED"));
        assert!(text.contains("1000"));

        let err = MotionError::QueueFull { capacity: 64 };
        assert!(err.to_string().contains("64"));
    }

    #[test]
    fn config_error_converts() {
        let err: MotionError = ConfigError::ValidationError("headroom".into()).into();
        assert!(matches!(err, MotionError::InvalidConfig(_)));

        let err: MotionError = HalError::DriverNotFound("esp8266".into()).into();
        assert!(err.to_string().contains("esp8266"));
    }
}
