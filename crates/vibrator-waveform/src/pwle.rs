//! Piecewise-linear envelope (PWLE) synthesis.

use serde::{Deserialize, Serialize};
use vibrator_calibration::FrequencyMap;
use vibrator_effects::{Braking, MAX_COLD_START_LATENCY_MS};
use vibrator_errors::validation::{ensure_len, ensure_range};
use vibrator_errors::{HapticError, Result};

use crate::chunk::PWLE_WLENGTH_MAX_MS;
use crate::{ChunkError, ComposedWaveform, WaveformChunk};

/// Longest single PWLE segment.
pub const PWLE_PRIMITIVE_DURATION_MAX_MS: i32 = 16383;

/// Most segments (and encoded sections) in one PWLE request.
pub const COMPOSE_PWLE_SIZE_MAX: usize = 127;

pub const PWLE_LEVEL_MIN: f32 = 0.0;
pub const PWLE_LEVEL_MAX: f32 = 1.0;

/// Highest amplitude the DSP encodes; requests above it are capped.
pub const DSP_PWLE_LEVEL_MAX: f32 = 0.999_511_8;

const DSP_PWLE_LEVEL_MIN: f32 = -1.0;

pub const PWLE_CHIRP_BIT: u32 = 0x8;
pub const PWLE_BRAKE_BIT: u32 = 0x4;
pub const PWLE_AMP_REG_BIT: u32 = 0x2;

/// Ramp from a start point to an end point over `duration_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivePwle {
    pub start_amplitude: f32,
    pub start_frequency: f32,
    pub end_amplitude: f32,
    pub end_frequency: f32,
    pub duration_ms: i32,
}

impl ActivePwle {
    /// Constant amplitude and frequency for `duration_ms`.
    pub fn steady(amplitude: f32, frequency: f32, duration_ms: i32) -> Self {
        Self {
            start_amplitude: amplitude,
            start_frequency: frequency,
            end_amplitude: amplitude,
            end_frequency: frequency,
            duration_ms,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrakingPwle {
    pub braking: Braking,
    pub duration_ms: i32,
}

/// One PWLE request segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PrimitivePwle {
    Active(ActivePwle),
    Braking(BrakingPwle),
}

fn to_fixed(field: &str, input: f32, scale: f32, min: f32, max: f32) -> std::result::Result<u32, ChunkError> {
    if !(input >= min && input <= max) {
        return Err(ChunkError::InvalidSegment(format!(
            "{field} {input} outside [{min}, {max}]"
        )));
    }
    Ok((input * scale).round().max(0.0) as u32)
}

impl WaveformChunk {
    /// Append one active section: delay 16, amplitude 12, frequency 12,
    /// flags 8.
    pub fn push_active_segment(
        &mut self,
        duration_ms: f32,
        amplitude: f32,
        frequency: f32,
        chirp: bool,
        frequency_max: f32,
    ) -> std::result::Result<(), ChunkError> {
        let delay = to_fixed(
            "duration",
            duration_ms,
            4.0,
            0.0,
            PWLE_PRIMITIVE_DURATION_MAX_MS as f32,
        )?;
        let amp = to_fixed("amplitude", amplitude, 2048.0, DSP_PWLE_LEVEL_MIN, DSP_PWLE_LEVEL_MAX)?;
        let freq = to_fixed("frequency", frequency, 4.0, 0.0, frequency_max)?;
        let flags = if chirp { PWLE_CHIRP_BIT } else { 0 };

        self.write(16, delay)?;
        self.write(12, amp)?;
        self.write(12, freq)?;
        self.write(8, (flags | 1) << 4)
    }

    /// Append one braking section.
    pub fn push_braking_segment(
        &mut self,
        duration_ms: f32,
        braking: Braking,
    ) -> std::result::Result<(), ChunkError> {
        let delay = to_fixed(
            "duration",
            duration_ms,
            4.0,
            0.0,
            PWLE_PRIMITIVE_DURATION_MAX_MS as f32,
        )?;
        let flags = match braking {
            Braking::None => PWLE_BRAKE_BIT,
            Braking::Clab => PWLE_BRAKE_BIT | PWLE_AMP_REG_BIT,
        };

        self.write(16, delay)?;
        self.write(12, 0)?;
        self.write(12, 0)?;
        self.write(8, (flags | 1) << 4)
    }
}

fn next_section(count: &mut usize) -> Result<()> {
    *count += 1;
    if *count > COMPOSE_PWLE_SIZE_MAX {
        return Err(HapticError::IllegalArgument(format!(
            "PWLE needs more than {COMPOSE_PWLE_SIZE_MAX} sections"
        )));
    }
    Ok(())
}

/// Validate and serialize a PWLE sequence.
///
/// A zero-length section jumps to an active segment's start point whenever
/// it differs from the previous end point. Braking segments are encoded as
/// a zero-length and a timed braking section and reset the previous end
/// point.
///
/// # Errors
///
/// [`HapticError::IllegalArgument`] for a segment outside the duration,
/// amplitude or frequency bounds, an unsupported braking type, more than
/// [`COMPOSE_PWLE_SIZE_MAX`] entries or sections, or a total length beyond
/// the wavetable limit.
pub fn compose_pwle(
    map: &FrequencyMap,
    supported_braking: &[Braking],
    segments: &[PrimitivePwle],
) -> Result<ComposedWaveform> {
    ensure_len("PWLE", segments.len(), 1, COMPOSE_PWLE_SIZE_MAX)?;

    let frequency_min = map.minimum_hz;
    let frequency_max = map.maximum_hz();
    let mut chunk = WaveformChunk::pwle();
    let mut nsections = 0_usize;
    let mut total_ms = 0_u32;
    let mut previous_end: Option<(f32, f32)> = None;

    for segment in segments {
        match segment {
            PrimitivePwle::Active(active) => {
                let duration =
                    ensure_range("duration", active.duration_ms, 0, PWLE_PRIMITIVE_DURATION_MAX_MS)?;
                ensure_range("start amplitude", active.start_amplitude, PWLE_LEVEL_MIN, PWLE_LEVEL_MAX)?;
                ensure_range("end amplitude", active.end_amplitude, PWLE_LEVEL_MIN, PWLE_LEVEL_MAX)?;
                ensure_range("start frequency", active.start_frequency, frequency_min, frequency_max)?;
                ensure_range("end frequency", active.end_frequency, frequency_min, frequency_max)?;

                let start_amplitude = active.start_amplitude.min(DSP_PWLE_LEVEL_MAX);
                let end_amplitude = active.end_amplitude.min(DSP_PWLE_LEVEL_MAX);
                let start = (start_amplitude, active.start_frequency);
                let continues = previous_end.is_some_and(|(amp, freq)| {
                    (amp - start.0).abs() < f32::EPSILON && (freq - start.1).abs() < f32::EPSILON
                });
                if !continues {
                    chunk.push_active_segment(0.0, start.0, start.1, false, frequency_max)?;
                    next_section(&mut nsections)?;
                }

                let chirp = (active.start_frequency - active.end_frequency).abs() >= f32::EPSILON;
                chunk.push_active_segment(
                    duration as f32,
                    end_amplitude,
                    active.end_frequency,
                    chirp,
                    frequency_max,
                )?;
                next_section(&mut nsections)?;

                previous_end = Some((end_amplitude, active.end_frequency));
                total_ms += duration.unsigned_abs();
            }
            PrimitivePwle::Braking(braking) => {
                if !supported_braking.contains(&braking.braking) {
                    return Err(HapticError::IllegalArgument(format!(
                        "braking {} is not supported",
                        braking.braking
                    )));
                }
                let duration =
                    ensure_range("braking duration", braking.duration_ms, 0, PWLE_PRIMITIVE_DURATION_MAX_MS)?;

                chunk.push_braking_segment(0.0, braking.braking)?;
                next_section(&mut nsections)?;
                chunk.push_braking_segment(duration as f32, braking.braking)?;
                next_section(&mut nsections)?;

                previous_end = None;
                total_ms += duration.unsigned_abs();
            }
        }
    }

    chunk.flush()?;
    let total_ms = total_ms + MAX_COLD_START_LATENCY_MS;
    if total_ms > PWLE_WLENGTH_MAX_MS {
        return Err(HapticError::IllegalArgument(format!(
            "PWLE length {total_ms} ms exceeds {PWLE_WLENGTH_MAX_MS} ms"
        )));
    }
    chunk.set_wlength(total_ms)?;
    chunk.set_nsections(nsections)?;
    Ok(ComposedWaveform {
        chunk,
        duration_ms: total_ms,
    })
}
