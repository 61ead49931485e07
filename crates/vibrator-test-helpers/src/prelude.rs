//! Convenience re-exports for common test utilities.
//!
//! ```rust,ignore
//! use vibrator_test_helpers::prelude::*;
//! ```

pub use crate::must::{must, must_some, must_with, wait_until};

#[cfg(feature = "fakes")]
pub use crate::fakes::{FakeHwApi, FakeHwCal, FakeHwGpio, HwCall};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;
