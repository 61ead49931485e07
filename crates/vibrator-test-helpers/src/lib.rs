//! Shared test utilities for the vibrator workspace.
//!
//! # Modules
//!
//! - [`mod@must`] - Unwrap helpers with good error messages and `#[track_caller]`
//! - [`fakes`] - In-memory `HwApi`, `HwCal` and `HwGpio` implementations
//! - [`prelude`] - Convenience re-exports
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! vibrator-test-helpers = { workspace = true }
//! ```
//!
//! ```rust,ignore
//! use vibrator_test_helpers::prelude::*;
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![allow(clippy::unwrap_used, clippy::panic)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod must;
pub mod prelude;

#[cfg(feature = "fakes")]
#[cfg_attr(docsrs, doc(cfg(feature = "fakes")))]
pub mod fakes;

pub use must::*;
