//! Haptic effect catalog
//!
//! Maps abstract effect and composite primitive identifiers onto the
//! precompiled waveforms held by the actuator, together with their
//! durations and calibrated volume levels.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod catalog;
pub mod constants;
pub mod ids;

pub use catalog::*;
pub use constants::*;
pub use ids::*;
