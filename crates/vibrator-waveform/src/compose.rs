//! Compound effects and composite primitive sequences.

use serde::{Deserialize, Serialize};
use vibrator_calibration::VOLTAGE_SCALE_MAX;
use vibrator_effects::{
    COMPOSE_DELAY_MAX_MS, COMPOSE_SIZE_MAX, CompositePrimitive, CompoundSegment, EffectCatalog,
    MAX_COLD_START_LATENCY_MS, waveform,
};
use vibrator_errors::validation::{ensure_len, ensure_range};
use vibrator_errors::{HapticError, Result};

use crate::{ChunkError, ComposedWaveform, WaveformChunk};

/// One entry of a composed sequence: wait `delay_ms`, then play
/// `primitive` at `scale`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositeEffect {
    pub delay_ms: i32,
    pub primitive: CompositePrimitive,
    pub scale: f32,
}

impl CompositeEffect {
    pub fn new(primitive: CompositePrimitive, scale: f32, delay_ms: i32) -> Self {
        Self {
            delay_ms,
            primitive,
            scale,
        }
    }
}

impl WaveformChunk {
    /// Append one compose section: amplitude 8, index 8, repeat 8, flags 8,
    /// delay 16.
    pub fn push_compose_segment(
        &mut self,
        vol: u32,
        index: u16,
        repeat: u8,
        flags: u8,
        delay_ms: u32,
    ) -> std::result::Result<(), ChunkError> {
        if index > waveform::MAX_PHYSICAL {
            return Err(ChunkError::InvalidSegment(format!(
                "waveform index {index} is not a physical waveform"
            )));
        }
        if vol > VOLTAGE_SCALE_MAX {
            return Err(ChunkError::InvalidSegment(format!(
                "volume level {vol} exceeds {VOLTAGE_SCALE_MAX}"
            )));
        }
        let delay = u16::try_from(delay_ms).map_err(|_| {
            ChunkError::InvalidSegment(format!("delay {delay_ms} ms does not fit 16 bits"))
        })?;
        self.write(8, vol)?;
        self.write(8, u32::from(index))?;
        self.write(8, u32::from(repeat))?;
        self.write(8, u32::from(flags))?;
        self.write(16, u32::from(delay))
    }
}

/// Serialize a compound effect resolved by the catalog.
pub fn compose_compound(segments: &[CompoundSegment], duration_ms: u32) -> Result<ComposedWaveform> {
    ensure_len("compound segments", segments.len(), 1, COMPOSE_SIZE_MAX)?;
    let mut chunk = WaveformChunk::compose();
    for segment in segments {
        chunk.push_compose_segment(segment.vol, segment.index, 0, 0, segment.delay_ms)?;
    }
    chunk.flush()?;
    chunk.set_nsections(segments.len())?;
    Ok(ComposedWaveform { chunk, duration_ms })
}

fn checked_delay(delay_ms: i32) -> Result<u32> {
    let delay = ensure_range("delay", delay_ms, 0, COMPOSE_DELAY_MAX_MS as i32)?;
    u32::try_from(delay).map_err(|e| HapticError::IllegalArgument(e.to_string()))
}

/// Validate and serialize a composite primitive sequence.
///
/// The delay of each entry precedes it, so entry *i+1*'s delay is carried
/// by section *i*; a delay on the first entry adds a silent leading section.
///
/// # Errors
///
/// - [`HapticError::IllegalArgument`] for an empty or oversized sequence, a
///   scale outside `[0, 1]`, a delay outside `[0, 10000]` ms or a `Noop`
///   followed by no delay
/// - [`HapticError::UnsupportedOperation`] for a primitive the actuator does
///   not carry
pub fn compose_primitives(
    catalog: &EffectCatalog,
    composite: &[CompositeEffect],
) -> Result<ComposedWaveform> {
    ensure_len("composite", composite.len(), 1, COMPOSE_SIZE_MAX)?;

    let mut chunk = WaveformChunk::compose();
    let mut nsections = composite.len();
    let mut total_ms = 0_u32;

    let leading = composite.first().map_or(Ok(0), |first| checked_delay(first.delay_ms))?;
    if leading > 0 {
        chunk.push_compose_segment(0, 0, 0, 0, leading)?;
        nsections += 1;
        total_ms += leading;
    }

    for (i, current) in composite.iter().enumerate() {
        ensure_range("scale", current.scale, 0.0, 1.0)?;

        let entry = catalog.primitive(current.primitive)?;
        let (index, vol) = match entry.index {
            Some(index) => {
                total_ms += entry.duration_ms;
                let scale = entry.clamp_scale(current.scale);
                (index, catalog.vol_level(index, scale))
            }
            None => (0, 0),
        };

        let next_delay = match composite.get(i + 1) {
            Some(next) => checked_delay(next.delay_ms)?,
            None => 0,
        };
        total_ms += next_delay;

        if index == 0 && next_delay == 0 {
            return Err(HapticError::IllegalArgument(format!(
                "entry {i} has neither a waveform nor a following delay"
            )));
        }

        chunk.push_compose_segment(vol, index, 0, 0, next_delay)?;
    }

    chunk.flush()?;
    chunk.set_nsections(nsections)?;
    Ok(ComposedWaveform {
        chunk,
        duration_ms: total_ms + MAX_COLD_START_LATENCY_MS,
    })
}
