//! Hardware boundary for haptic actuators.
//!
//! The orchestration engine never talks to a driver directly. It consumes
//! three capability traits:
//!
//! - [`HwApi`]: raw driver access (calibration scalars, force-feedback
//!   effect descriptors, OWT slot upload/erase, gain, play bits, state
//!   polling and the haptic PCM amplifier path)
//! - [`HwCal`]: the persisted calibration store, read once at startup
//! - [`HwGpio`]: the digital trigger line used to start two actuators on
//!   the same edge
//!
//! Every call is synchronous and may fail with [`HwError`], which converts
//! into [`vibrator_errors::HapticError::HardwareIo`].

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod api;
pub mod cal;
pub mod error;
pub mod gpio;

pub use api::{AlsaDevice, FfEffect, FfWaveform, HwApi, VibeState, WaveformBank};
pub use cal::HwCal;
pub use error::{HwError, HwResult};
pub use gpio::HwGpio;
