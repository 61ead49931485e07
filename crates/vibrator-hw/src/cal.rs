//! Calibration store trait.

use core::fmt;

/// Persisted calibration constants for one actuator.
///
/// Values that were never calibrated are reported as `None`; the
/// calibration resolver decides which of them are required.
pub trait HwCal: Send + Sync {
    /// Calibration file format version.
    fn version(&self) -> Option<u32>;

    /// Resonant frequency, hex string in Q10.14.
    fn f0(&self) -> Option<String>;

    /// Frequency offset applied when two actuators are driven together.
    fn f0_sync_offset(&self) -> Option<u32>;

    /// Series resistance, hex string.
    fn redc(&self) -> Option<String>;

    /// Q factor, hex string in Q8.16.
    fn q(&self) -> Option<String>;

    /// Frequency shift in Hz applied to long vibrations.
    fn long_frequency_shift(&self) -> Option<i32>;

    /// Volume pair `[min, max]` for tick effects.
    fn tick_vol_levels(&self) -> Option<[u32; 2]>;

    /// Volume pair `[min, max]` for click effects.
    fn click_vol_levels(&self) -> Option<[u32; 2]>;

    /// Volume pair `[min, max]` for long vibrations.
    fn long_vol_levels(&self) -> Option<[u32; 2]>;

    /// Whether the firmware supports frequency chirps.
    fn is_chirp_enabled(&self) -> bool;

    /// Bitmask of supported composite primitives; `None` when absent.
    fn supported_primitives(&self) -> Option<u32>;

    /// Whether resonant frequency compensation should be enabled.
    fn is_f0_comp_enabled(&self) -> bool;

    /// Whether series resistance compensation should be enabled.
    fn is_redc_comp_enabled(&self) -> bool;

    /// Write calibration diagnostics.
    fn debug(&self, out: &mut dyn fmt::Write) -> fmt::Result;
}
