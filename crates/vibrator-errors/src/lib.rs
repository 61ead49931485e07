//! Error taxonomy for the haptic effect orchestration engine.
//!
//! Every fallible operation in the vibrator workspace reports one of five
//! conditions:
//!
//! - [`HapticError::UnsupportedOperation`]: the capability is absent
//!   (unsupported effect or primitive, external control active, ...)
//! - [`HapticError::IllegalArgument`]: a value is out of range or a request
//!   is malformed
//! - [`HapticError::ResourceExhausted`]: no room for a custom waveform slot
//! - [`HapticError::HardwareIo`]: a calibration, upload, erase, poll or
//!   trigger call failed
//! - [`HapticError::Interrupted`]: an in-flight effect was preempted or
//!   stopped before it finished
//!
//! # Modules
//!
//! - [`common`]: severity and category classification
//! - [`haptic`]: the top-level [`HapticError`] enum and [`ResultExt`]
//! - [`status`]: mapping onto platform exception codes
//! - [`validation`]: range-check helpers that produce `IllegalArgument`
//!
//! # Example
//!
//! ```
//! use vibrator_errors::prelude::*;
//!
//! fn check_amplitude(value: f32) -> Result<f32> {
//!     if !(value > 0.0 && value <= 1.0) {
//!         return Err(out_of_range("amplitude", value, 0.0, 1.0));
//!     }
//!     Ok(value)
//! }
//!
//! assert!(check_amplitude(0.5).is_ok());
//! assert_eq!(
//!     check_amplitude(1.5).map_err(|e| e.category()),
//!     Err(ErrorCategory::Validation)
//! );
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod common;
pub mod haptic;
pub mod prelude;
pub mod status;
pub mod validation;

pub use common::{ErrorCategory, ErrorSeverity};
pub use haptic::{HapticError, ResultExt};
pub use status::ExceptionCode;

/// A specialized `Result` type for haptic operations.
pub type Result<T> = std::result::Result<T, HapticError>;
