//! Calibration value types.

use crate::{CalibrationError, CalibrationResult};

/// Highest volume level a table may encode, in percent of full scale.
pub const VOLTAGE_SCALE_MAX: u32 = 100;

/// Fractional bits of the resonant frequency fixed-point encoding.
pub const Q14_BIT_SHIFT: u32 = 14;

/// Fractional bits of the Q factor fixed-point encoding.
pub const Q16_BIT_SHIFT: u32 = 16;

/// Frequency offsets are 24-bit two's complement values.
pub const FREQUENCY_OFFSET_MODULUS: u32 = 1 << 24;

/// Default minimum interval between on/off transitions.
pub const MIN_ON_OFF_INTERVAL_US: u32 = 8500;

pub const PWLE_FREQUENCY_MIN_HZ: f32 = 1.0;
pub const PWLE_FREQUENCY_RESOLUTION_HZ: f32 = 1.0;
pub const PWLE_BW_MAP_SIZE: usize = 1000;

/// A `[min, max]` volume pair from the calibration store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolLevels {
    pub min: u32,
    pub max: u32,
}

impl VolLevels {
    /// Validate and build a volume pair for the table named `field`.
    pub fn new(field: &'static str, [min, max]: [u32; 2]) -> CalibrationResult<Self> {
        if min > max || max > VOLTAGE_SCALE_MAX {
            return Err(CalibrationError::InvalidVolLevels { field, min, max });
        }
        Ok(Self { min, max })
    }

    /// Level at position `t` between the table bounds.
    ///
    /// `t` is clamped to `[0, 1]`; NaN selects the minimum.
    pub fn level_at(&self, t: f32) -> u32 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let span = self.max.saturating_sub(self.min) as f32;
        let level = (self.min as f32 + t * span).round() as u32;
        level.clamp(self.min, self.max)
    }

    pub fn contains(&self, level: u32) -> bool {
        (self.min..=self.max).contains(&level)
    }
}

/// Frequency range and bandwidth-amplitude map for PWLE synthesis.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyMap {
    pub minimum_hz: f32,
    pub resolution_hz: f32,
    pub bandwidth_amplitude: Vec<f32>,
}

impl FrequencyMap {
    /// Map with the default range and a flat bandwidth response.
    pub fn flat() -> Self {
        Self {
            minimum_hz: PWLE_FREQUENCY_MIN_HZ,
            resolution_hz: PWLE_FREQUENCY_RESOLUTION_HZ,
            bandwidth_amplitude: vec![1.0; PWLE_BW_MAP_SIZE],
        }
    }

    /// Highest frequency covered by the map.
    pub fn maximum_hz(&self) -> f32 {
        let steps = self.bandwidth_amplitude.len().saturating_sub(1) as f32;
        self.minimum_hz + self.resolution_hz * steps
    }

    pub fn contains(&self, frequency_hz: f32) -> bool {
        frequency_hz >= self.minimum_hz && frequency_hz <= self.maximum_hz()
    }
}

/// Parse a hex calibration string, with or without a `0x` prefix.
pub fn parse_hex(field: &'static str, raw: &str) -> CalibrationResult<u32> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    u32::from_str_radix(digits, 16).map_err(|e| CalibrationError::Malformed {
        field,
        reason: format!("'{trimmed}' is not hex: {e}"),
    })
}

/// Frequency offset register value for a long-vibration shift in Hz.
pub fn frequency_shift_offset(shift_hz: i32) -> u32 {
    let magnitude = shift_hz.unsigned_abs() << Q14_BIT_SHIFT;
    if shift_hz >= 0 {
        magnitude & (FREQUENCY_OFFSET_MODULUS - 1)
    } else {
        FREQUENCY_OFFSET_MODULUS.wrapping_sub(magnitude) & (FREQUENCY_OFFSET_MODULUS - 1)
    }
}
