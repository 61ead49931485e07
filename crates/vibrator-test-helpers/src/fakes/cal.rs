use std::fmt;

use vibrator_hw::HwCal;

/// Calibration store with public, editable values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeHwCal {
    pub version: Option<u32>,
    pub f0: Option<String>,
    pub f0_sync_offset: Option<u32>,
    pub redc: Option<String>,
    pub q: Option<String>,
    pub long_frequency_shift: Option<i32>,
    pub tick_vol_levels: Option<[u32; 2]>,
    pub click_vol_levels: Option<[u32; 2]>,
    pub long_vol_levels: Option<[u32; 2]>,
    pub chirp_enabled: bool,
    pub supported_primitives: Option<u32>,
    pub f0_comp_enabled: bool,
    pub redc_comp_enabled: bool,
}

impl FakeHwCal {
    /// A fully calibrated actuator: 160 Hz resonance, Q of 20, chirp on.
    pub fn calibrated() -> Self {
        Self {
            version: Some(2),
            f0: Some("0x280000".to_string()),
            f0_sync_offset: None,
            redc: Some("0x5a00".to_string()),
            q: Some("0x140000".to_string()),
            long_frequency_shift: None,
            tick_vol_levels: Some([5, 30]),
            click_vol_levels: Some([20, 60]),
            long_vol_levels: Some([30, 90]),
            chirp_enabled: true,
            supported_primitives: None,
            f0_comp_enabled: true,
            redc_comp_enabled: true,
        }
    }

    /// Only the required values; every optional value absent.
    pub fn minimal() -> Self {
        Self {
            version: None,
            long_frequency_shift: None,
            chirp_enabled: false,
            f0_comp_enabled: false,
            redc_comp_enabled: false,
            ..Self::calibrated()
        }
    }

    pub fn with_click(mut self, min: u32, max: u32) -> Self {
        self.click_vol_levels = Some([min, max]);
        self
    }

    pub fn with_chirp(mut self, enabled: bool) -> Self {
        self.chirp_enabled = enabled;
        self
    }

    pub fn with_supported_primitives(mut self, mask: u32) -> Self {
        self.supported_primitives = Some(mask);
        self
    }

    pub fn with_long_frequency_shift(mut self, shift_hz: i32) -> Self {
        self.long_frequency_shift = Some(shift_hz);
        self
    }

    pub fn with_f0_sync_offset(mut self, offset: u32) -> Self {
        self.f0_sync_offset = Some(offset);
        self
    }
}

impl Default for FakeHwCal {
    fn default() -> Self {
        Self::calibrated()
    }
}

impl HwCal for FakeHwCal {
    fn version(&self) -> Option<u32> {
        self.version
    }

    fn f0(&self) -> Option<String> {
        self.f0.clone()
    }

    fn f0_sync_offset(&self) -> Option<u32> {
        self.f0_sync_offset
    }

    fn redc(&self) -> Option<String> {
        self.redc.clone()
    }

    fn q(&self) -> Option<String> {
        self.q.clone()
    }

    fn long_frequency_shift(&self) -> Option<i32> {
        self.long_frequency_shift
    }

    fn tick_vol_levels(&self) -> Option<[u32; 2]> {
        self.tick_vol_levels
    }

    fn click_vol_levels(&self) -> Option<[u32; 2]> {
        self.click_vol_levels
    }

    fn long_vol_levels(&self) -> Option<[u32; 2]> {
        self.long_vol_levels
    }

    fn is_chirp_enabled(&self) -> bool {
        self.chirp_enabled
    }

    fn supported_primitives(&self) -> Option<u32> {
        self.supported_primitives
    }

    fn is_f0_comp_enabled(&self) -> bool {
        self.f0_comp_enabled
    }

    fn is_redc_comp_enabled(&self) -> bool {
        self.redc_comp_enabled
    }

    fn debug(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        writeln!(out, "FakeHwCal:")?;
        writeln!(out, "  Version: {:?}", self.version)?;
        writeln!(out, "  F0: {:?}", self.f0)
    }
}
