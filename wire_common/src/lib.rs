//! Wire Cutter Common Library
//!
//! Shared constants, configuration loading utilities and the hardware
//! capability traits consumed by the motion engine.
//!
//! # Module Structure
//!
//! - [`consts`] - System-wide numeric limits and defaults
//! - [`config`] - Configuration loading traits and types
//! - [`hal`] - Hardware capability traits (clock, timer, GPIO, servo, delay)
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use wire_common::prelude::*;
//! ```

pub mod config;
pub mod consts;
pub mod hal;
pub mod prelude;
