//! Effect and primitive resolution

use serde::{Deserialize, Serialize};
use vibrator_calibration::{CalibrationProfile, VolLevels};
use vibrator_errors::{HapticError, Result};

use crate::constants::{
    DOUBLE_CLICK_SILENCE_MS, MAX_COLD_START_LATENCY_MS, MAX_PAUSE_TIMING_ERROR_MS,
    PRIMITIVE_MAX_SCALE, PRIMITIVE_MIN_SCALE, waveform, waveform_duration_ms,
};
use crate::ids::{CompositePrimitive, Effect, EffectStrength};

/// Effects that `perform` and always-on bindings accept.
pub const SUPPORTED_EFFECTS: [Effect; 5] = [
    Effect::TextureTick,
    Effect::Tick,
    Effect::Click,
    Effect::HeavyClick,
    Effect::DoubleClick,
];

/// A single precompiled waveform at a calibrated volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleEffect {
    pub index: u16,
    pub vol: u32,
    pub duration_ms: u32,
}

/// One waveform of a compound effect followed by `delay_ms` of silence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompoundSegment {
    pub index: u16,
    pub vol: u32,
    pub delay_ms: u32,
}

/// How a named effect is played.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectPlan {
    /// Trigger one precompiled waveform
    Simple(SimpleEffect),
    /// Serialize the segments into a compose payload and upload it
    Compound {
        segments: Vec<CompoundSegment>,
        duration_ms: u32,
    },
}

impl EffectPlan {
    pub fn duration_ms(&self) -> u32 {
        match self {
            EffectPlan::Simple(simple) => simple.duration_ms,
            EffectPlan::Compound { duration_ms, .. } => *duration_ms,
        }
    }
}

/// Waveform and scale limits of a composite primitive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveEntry {
    pub primitive: CompositePrimitive,
    /// `None` for [`CompositePrimitive::Noop`]
    pub index: Option<u16>,
    pub duration_ms: u32,
    pub min_scale: f32,
    pub max_scale: f32,
}

impl PrimitiveEntry {
    /// Clamp a requested scale into this primitive's usable range.
    pub fn clamp_scale(&self, scale: f32) -> f32 {
        scale.clamp(self.min_scale, self.max_scale)
    }
}

/// Effect tables derived from the primary actuator's calibration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectCatalog {
    tick: VolLevels,
    click: VolLevels,
    long: VolLevels,
    supported_primitives: u32,
}

impl EffectCatalog {
    pub fn new(profile: &CalibrationProfile) -> Self {
        let all = CompositePrimitive::ALL
            .iter()
            .fold(0, |mask, p| mask | p.bit());
        Self {
            tick: profile.tick,
            click: profile.click,
            long: profile.long,
            supported_primitives: profile.supported_primitives.unwrap_or(all),
        }
    }

    pub fn supported_effects(&self) -> Vec<Effect> {
        SUPPORTED_EFFECTS.to_vec()
    }

    pub fn supported_always_on_effects(&self) -> Vec<Effect> {
        SUPPORTED_EFFECTS.to_vec()
    }

    /// Resolve a named effect at `strength`.
    ///
    /// # Errors
    ///
    /// [`HapticError::UnsupportedOperation`] for effects outside
    /// [`SUPPORTED_EFFECTS`].
    pub fn resolve(&self, effect: Effect, strength: EffectStrength) -> Result<EffectPlan> {
        match effect {
            Effect::DoubleClick => {
                let first = self.simple(Effect::Click, strength)?;
                let second = self.simple(Effect::HeavyClick, strength)?;
                let duration_ms = first.duration_ms
                    + DOUBLE_CLICK_SILENCE_MS
                    + second.duration_ms
                    + MAX_PAUSE_TIMING_ERROR_MS;
                Ok(EffectPlan::Compound {
                    segments: vec![
                        CompoundSegment {
                            index: first.index,
                            vol: first.vol,
                            delay_ms: DOUBLE_CLICK_SILENCE_MS,
                        },
                        CompoundSegment {
                            index: second.index,
                            vol: second.vol,
                            delay_ms: 0,
                        },
                    ],
                    duration_ms,
                })
            }
            other => self.simple(other, strength).map(EffectPlan::Simple),
        }
    }

    fn simple(&self, effect: Effect, strength: EffectStrength) -> Result<SimpleEffect> {
        let (index, table) = match effect {
            Effect::TextureTick => (waveform::LIGHT_TICK, self.tick),
            Effect::Tick => (waveform::CLICK, self.tick),
            Effect::Click | Effect::HeavyClick => (waveform::CLICK, self.click),
            other => {
                return Err(HapticError::UnsupportedOperation(format!(
                    "effect {other}"
                )));
            }
        };
        Ok(SimpleEffect {
            index,
            vol: table.level_at(strength.position()),
            duration_ms: waveform_duration_ms(index) + MAX_COLD_START_LATENCY_MS,
        })
    }

    pub fn is_supported_primitive(&self, primitive: CompositePrimitive) -> bool {
        primitive == CompositePrimitive::Noop || self.supported_primitives & primitive.bit() != 0
    }

    pub fn supported_primitives(&self) -> Vec<CompositePrimitive> {
        CompositePrimitive::ALL
            .iter()
            .copied()
            .filter(|p| self.is_supported_primitive(*p))
            .collect()
    }

    /// Waveform and scale limits for `primitive`.
    ///
    /// # Errors
    ///
    /// [`HapticError::UnsupportedOperation`] when the firmware does not
    /// carry the primitive.
    pub fn primitive(&self, primitive: CompositePrimitive) -> Result<PrimitiveEntry> {
        if !self.is_supported_primitive(primitive) {
            return Err(HapticError::UnsupportedOperation(format!(
                "primitive {primitive}"
            )));
        }
        let index = match primitive {
            CompositePrimitive::Noop => None,
            CompositePrimitive::Click => Some(waveform::CLICK),
            CompositePrimitive::Thud => Some(waveform::THUD),
            CompositePrimitive::Spin => Some(waveform::SPIN),
            CompositePrimitive::QuickRise => Some(waveform::QUICK_RISE),
            CompositePrimitive::SlowRise => Some(waveform::SLOW_RISE),
            CompositePrimitive::QuickFall => Some(waveform::QUICK_FALL),
            CompositePrimitive::LightTick => Some(waveform::LIGHT_TICK),
            CompositePrimitive::LowTick => Some(waveform::LOW_TICK),
        };
        let id = primitive.raw() as usize;
        Ok(PrimitiveEntry {
            primitive,
            index,
            duration_ms: index.map_or(0, waveform_duration_ms),
            min_scale: PRIMITIVE_MIN_SCALE.get(id).copied().unwrap_or(0.0),
            max_scale: PRIMITIVE_MAX_SCALE.get(id).copied().unwrap_or(1.0),
        })
    }

    pub fn primitive_duration(&self, primitive: CompositePrimitive) -> Result<u32> {
        self.primitive(primitive).map(|entry| entry.duration_ms)
    }

    /// Volume table governing the waveform at `index`.
    pub fn vol_levels_for(&self, index: u16) -> VolLevels {
        match index {
            waveform::LIGHT_TICK => self.tick,
            waveform::QUICK_RISE | waveform::QUICK_FALL => self.long,
            _ => self.click,
        }
    }

    /// Calibrated volume for the waveform at `index` at position `t`.
    pub fn vol_level(&self, index: u16, t: f32) -> u32 {
        self.vol_levels_for(index).level_at(t)
    }

    pub fn tick(&self) -> VolLevels {
        self.tick
    }

    pub fn click(&self) -> VolLevels {
        self.click
    }

    pub fn long(&self) -> VolLevels {
        self.long
    }
}
