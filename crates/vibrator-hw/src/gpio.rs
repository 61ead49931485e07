//! GPIO trigger line trait.

use core::fmt;

use crate::error::HwResult;

/// Digital line that starts every armed actuator on its rising edge.
pub trait HwGpio: Send + Sync {
    /// Claim and configure the line as an output.
    fn init(&self) -> HwResult<()>;

    /// Drive the line high or low.
    fn set_output(&self, level: bool) -> HwResult<()>;

    /// Write GPIO diagnostics.
    fn debug(&self, out: &mut dyn fmt::Write) -> fmt::Result;
}
