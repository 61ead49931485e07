//! Per-actuator calibration profile.

use core::fmt;

use tracing::{debug, info};
use vibrator_errors::Result;
use vibrator_hw::{HwApi, HwCal};

use crate::types::{
    FrequencyMap, Q14_BIT_SHIFT, Q16_BIT_SHIFT, VolLevels, frequency_shift_offset, parse_hex,
};
use crate::{CalibrationError, CalibrationResult};

/// Position of an actuator in the ordered actuator collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActuatorRole {
    /// First actuator; owns the long-vibration frequency shift
    Primary,
    /// Any further actuator driven in sync with the primary
    Secondary,
}

impl fmt::Display for ActuatorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActuatorRole::Primary => write!(f, "primary"),
            ActuatorRole::Secondary => write!(f, "secondary"),
        }
    }
}

/// Calibration constants resolved for one actuator.
///
/// Loaded once by [`CalibrationProfile::load`] and immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationProfile {
    pub role: ActuatorRole,
    pub version: u32,
    f0_raw: String,
    f0: u32,
    redc_raw: String,
    q_raw: String,
    q: u32,
    /// Frequency offset register value applied to long vibrations
    pub frequency_offset: u32,
    pub long_frequency_shift: i32,
    pub tick: VolLevels,
    pub click: VolLevels,
    pub long: VolLevels,
    pub chirp_enabled: bool,
    /// `None` when every primitive is supported
    pub supported_primitives: Option<u32>,
    pub f0_comp_enabled: bool,
    pub redc_comp_enabled: bool,
}

impl CalibrationProfile {
    /// Read and validate the calibration store.
    ///
    /// Resonant frequency, resistance, Q factor and the three volume tables
    /// are required. Everything else falls back to a disabled or zero
    /// default.
    pub fn load(cal: &dyn HwCal, role: ActuatorRole) -> CalibrationResult<Self> {
        let f0_raw = cal.f0().ok_or(CalibrationError::Missing("f0"))?;
        let f0 = parse_hex("f0", &f0_raw)?;
        let redc_raw = cal.redc().ok_or(CalibrationError::Missing("redc"))?;
        parse_hex("redc", &redc_raw)?;
        let q_raw = cal.q().ok_or(CalibrationError::Missing("q"))?;
        let q = parse_hex("q", &q_raw)?;

        let tick = VolLevels::new(
            "tick",
            cal.tick_vol_levels()
                .ok_or(CalibrationError::Missing("tick_vol_levels"))?,
        )?;
        let click = VolLevels::new(
            "click",
            cal.click_vol_levels()
                .ok_or(CalibrationError::Missing("click_vol_levels"))?,
        )?;
        let long = VolLevels::new(
            "long",
            cal.long_vol_levels()
                .ok_or(CalibrationError::Missing("long_vol_levels"))?,
        )?;

        let long_frequency_shift = cal.long_frequency_shift().unwrap_or(0);
        let sync_offset = cal.f0_sync_offset().unwrap_or(0);
        let frequency_offset = match role {
            ActuatorRole::Primary if long_frequency_shift != 0 => {
                frequency_shift_offset(long_frequency_shift)
            }
            _ => sync_offset,
        };

        let profile = Self {
            role,
            version: cal.version().unwrap_or(0),
            f0_raw: f0_raw.trim().to_string(),
            f0,
            redc_raw: redc_raw.trim().to_string(),
            q_raw: q_raw.trim().to_string(),
            q,
            frequency_offset,
            long_frequency_shift,
            tick,
            click,
            long,
            chirp_enabled: cal.is_chirp_enabled(),
            supported_primitives: cal.supported_primitives().filter(|mask| *mask != 0),
            f0_comp_enabled: cal.is_f0_comp_enabled(),
            redc_comp_enabled: cal.is_redc_comp_enabled(),
        };

        info!(
            role = %role,
            version = profile.version,
            f0_hz = profile.resonant_frequency_hz(),
            q = profile.q_factor(),
            chirp = profile.chirp_enabled,
            "Calibration loaded"
        );
        Ok(profile)
    }

    /// Push the physical constants to the driver.
    pub fn apply(&self, api: &dyn HwApi, min_on_off_interval_us: u32) -> Result<()> {
        api.set_f0(&self.f0_raw)?;
        api.set_redc(&self.redc_raw)?;
        api.set_q(&self.q_raw)?;
        api.set_f0_comp_enable(self.f0_comp_enabled)?;
        api.set_redc_comp_enable(self.redc_comp_enabled)?;
        api.set_min_on_off_interval(min_on_off_interval_us)?;
        debug!(role = %self.role, "Calibration applied");
        Ok(())
    }

    pub fn resonant_frequency_hz(&self) -> f32 {
        self.f0 as f32 / (1_u32 << Q14_BIT_SHIFT) as f32
    }

    pub fn q_factor(&self) -> f32 {
        self.q as f32 / (1_u32 << Q16_BIT_SHIFT) as f32
    }

    /// Frequency map for PWLE synthesis; present only with chirp support.
    pub fn frequency_map(&self) -> Option<FrequencyMap> {
        self.chirp_enabled.then(FrequencyMap::flat)
    }

    /// Raw resonant frequency string as stored.
    pub fn f0_raw(&self) -> &str {
        &self.f0_raw
    }

    pub fn redc_raw(&self) -> &str {
        &self.redc_raw
    }

    pub fn q_raw(&self) -> &str {
        &self.q_raw
    }
}
