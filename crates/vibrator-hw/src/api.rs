//! Driver access trait and the force-feedback descriptor types it exchanges.

use core::fmt;
use std::time::Duration;

use crate::error::HwResult;

/// Waveform memory bank addressed by a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum WaveformBank {
    /// Factory waveforms loaded into RAM
    Ram = 0,
    /// Waveforms burned into ROM
    Rom = 1,
    /// Open wavetable (uploaded at runtime)
    Owt = 2,
}

/// Payload carried by a force-feedback descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FfWaveform {
    /// Placeholder for an index with nothing loaded
    #[default]
    Empty,
    /// Precompiled waveform selected by bank and index
    Bank {
        /// Memory bank
        bank: WaveformBank,
        /// Waveform index inside the bank
        index: u16,
    },
    /// Serialized compose or PWLE payload uploaded into an OWT slot
    Owt(Vec<u8>),
}

/// Force-feedback effect descriptor as handed to the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfEffect {
    /// Driver-assigned id, `-1` until the driver accepts the descriptor
    pub id: i16,
    /// Waveform payload
    pub waveform: FfWaveform,
    /// Replay length in milliseconds
    pub replay_length_ms: u16,
    /// GPIO trigger button, `0` when the effect is played by command only
    pub trigger_button: u16,
}

impl FfEffect {
    /// Descriptor for a precompiled RAM waveform, not yet registered.
    pub fn physical(index: u16) -> Self {
        Self {
            id: -1,
            waveform: FfWaveform::Bank {
                bank: WaveformBank::Ram,
                index,
            },
            replay_length_ms: 0,
            trigger_button: 0,
        }
    }

    /// Placeholder for an index that holds nothing.
    pub fn empty() -> Self {
        Self {
            id: -1,
            waveform: FfWaveform::Empty,
            replay_length_ms: 0,
            trigger_button: 0,
        }
    }

    /// OWT payload bytes, if this descriptor carries one.
    pub fn owt_payload(&self) -> Option<&[u8]> {
        match &self.waveform {
            FfWaveform::Owt(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// Actuator playback state as reported by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum VibeState {
    /// Nothing playing
    Stopped = 0,
    /// Haptic waveform playing
    Haptic = 1,
    /// Audio-synchronous playback path active
    Asp = 2,
}

/// Sound card and device pair for the haptic PCM path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AlsaDevice {
    /// Card number
    pub card: u32,
    /// Device number
    pub device: u32,
}

impl fmt::Display for AlsaDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hw:{},{}", self.card, self.device)
    }
}

/// Raw driver access for one actuator.
///
/// Implementations use interior mutability; the engine serializes all
/// upload, erase and trigger sequences itself, so no call is made
/// concurrently with another on the same actuator except state polls.
pub trait HwApi: Send + Sync {
    /// Write the resonant frequency (hex string, Q10.14).
    fn set_f0(&self, value: &str) -> HwResult<()>;

    /// Write the resonant frequency offset (24-bit two's complement, Q10.14).
    fn set_f0_offset(&self, value: u32) -> HwResult<()>;

    /// Write the series resistance (hex string).
    fn set_redc(&self, value: &str) -> HwResult<()>;

    /// Write the Q factor (hex string, Q8.16).
    fn set_q(&self, value: &str) -> HwResult<()>;

    /// Number of effects currently registered with the driver.
    fn effect_count(&self) -> HwResult<u32>;

    /// Block until the actuator reaches `state`.
    ///
    /// Returns `Ok(false)` when `timeout` elapses first. `None` waits
    /// without a bound.
    fn poll_vibe_state(&self, state: VibeState, timeout: Option<Duration>) -> HwResult<bool>;

    /// Whether the driver reports OWT free space at all.
    fn has_owt_free_space(&self) -> bool;

    /// Remaining OWT space in bytes.
    fn owt_free_space(&self) -> HwResult<u32>;

    /// Enable or disable resonant frequency compensation.
    fn set_f0_comp_enable(&self, enable: bool) -> HwResult<()>;

    /// Enable or disable series resistance compensation.
    fn set_redc_comp_enable(&self, enable: bool) -> HwResult<()>;

    /// Minimum interval between consecutive on/off transitions.
    fn set_min_on_off_interval(&self, interval_us: u32) -> HwResult<()>;

    /// Global gain in percent (0..=100).
    fn set_ff_gain(&self, gain: u16) -> HwResult<()>;

    /// Register or update a descriptor; the driver assigns `effect.id` on
    /// first registration.
    fn set_ff_effect(&self, effect: &mut FfEffect, replay_length_ms: u16) -> HwResult<()>;

    /// Start or stop playback of the effect at `index`.
    fn set_ff_play(&self, index: u32, on: bool) -> HwResult<()>;

    /// Haptic PCM device, when the platform routes one.
    fn haptic_alsa_device(&self) -> Option<AlsaDevice>;

    /// Enable or disable the haptic PCM amplifier.
    fn set_haptic_pcm_amp(&self, enable: bool, device: AlsaDevice) -> HwResult<()>;

    /// Upload `payload` into a fresh OWT slot and return its effect index.
    fn upload_owt_effect(&self, payload: &[u8], effect: &mut FfEffect) -> HwResult<u32>;

    /// Erase the OWT slot at `index`, resetting its entry in `effects`.
    fn erase_owt_effect(&self, index: u32, effects: &mut [FfEffect]) -> HwResult<()>;

    /// Write driver diagnostics.
    fn debug(&self, out: &mut dyn fmt::Write) -> fmt::Result;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_physical_descriptor() {
        let effect = FfEffect::physical(9);
        assert_eq!(effect.id, -1);
        assert_eq!(
            effect.waveform,
            FfWaveform::Bank {
                bank: WaveformBank::Ram,
                index: 9
            }
        );
        assert!(effect.owt_payload().is_none());
    }

    #[test]
    fn test_alsa_device_display() {
        let device = AlsaDevice { card: 0, device: 3 };
        assert_eq!(device.to_string(), "hw:0,3");
    }
}
