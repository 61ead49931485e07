//! Always-on effect bindings.
//!
//! A binding is kept until explicitly disabled and never touches the
//! one-shot playback state.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info};
use vibrator_effects::{Effect, EffectCatalog, EffectPlan, EffectStrength};
use vibrator_errors::{HapticError, Result};
use vibrator_waveform::compose_compound;

/// Highest always-on id.
pub const ALWAYS_ON_ID_MAX: i32 = 3;

/// What an always-on binding plays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AlwaysOnWaveform {
    /// Precompiled waveform at a calibrated volume
    Indexed { index: u16, vol: u32 },
    /// Serialized compose payload; it gets a hardware slot only when uploaded
    Compound(Vec<u8>),
}

/// Resolved waveform bound to an always-on id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlwaysOnBinding {
    pub id: i32,
    pub effect: Effect,
    pub strength: EffectStrength,
    pub waveform: AlwaysOnWaveform,
}

/// Always-on id to binding map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AlwaysOnTable {
    bindings: BTreeMap<i32, AlwaysOnBinding>,
}

fn check_id(id: i32) -> Result<()> {
    if (0..=ALWAYS_ON_ID_MAX).contains(&id) {
        Ok(())
    } else {
        Err(HapticError::unsupported(format!("always-on id {id}")))
    }
}

impl AlwaysOnTable {
    /// Bind `effect` at `strength` to `id`, replacing any previous binding.
    ///
    /// # Errors
    ///
    /// [`HapticError::UnsupportedOperation`] for an id outside
    /// `0..=ALWAYS_ON_ID_MAX` or an effect the catalog cannot resolve.
    pub fn enable(
        &mut self,
        catalog: &EffectCatalog,
        id: i32,
        effect: Effect,
        strength: EffectStrength,
    ) -> Result<AlwaysOnBinding> {
        check_id(id)?;
        let waveform = match catalog.resolve(effect, strength)? {
            EffectPlan::Simple(simple) => AlwaysOnWaveform::Indexed {
                index: simple.index,
                vol: simple.vol,
            },
            EffectPlan::Compound {
                segments,
                duration_ms,
            } => AlwaysOnWaveform::Compound(compose_compound(&segments, duration_ms)?.bytes().to_vec()),
        };
        let binding = AlwaysOnBinding {
            id,
            effect,
            strength,
            waveform,
        };
        info!(id, %effect, %strength, waveform = ?binding.waveform, "Always-on effect enabled");
        self.bindings.insert(id, binding.clone());
        Ok(binding)
    }

    /// Remove the binding for `id`. Disabling an unbound id is not an error.
    pub fn disable(&mut self, id: i32) -> Result<Option<AlwaysOnBinding>> {
        check_id(id)?;
        let removed = self.bindings.remove(&id);
        debug!(id, bound = removed.is_some(), "Always-on effect disabled");
        Ok(removed)
    }

    pub fn get(&self, id: i32) -> Option<&AlwaysOnBinding> {
        self.bindings.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AlwaysOnBinding> {
        self.bindings.values()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use vibrator_calibration::{ActuatorRole, CalibrationProfile};
    use vibrator_effects::waveform;
    use vibrator_test_helpers::prelude::*;

    use super::*;

    fn catalog() -> EffectCatalog {
        let profile = must(CalibrationProfile::load(
            &FakeHwCal::calibrated(),
            ActuatorRole::Primary,
        ));
        EffectCatalog::new(&profile)
    }

    #[test]
    fn test_simple_binding_uses_precompiled_index() -> TestResult {
        let mut table = AlwaysOnTable::default();
        let binding = table.enable(&catalog(), 0, Effect::Click, EffectStrength::Strong)?;
        assert_eq!(
            binding.waveform,
            AlwaysOnWaveform::Indexed {
                index: waveform::CLICK,
                vol: 60
            }
        );
        assert_eq!(table.get(0), Some(&binding));
        Ok(())
    }

    #[test]
    fn test_compound_binding_carries_payload() -> TestResult {
        let mut table = AlwaysOnTable::default();
        let binding = table.enable(&catalog(), 2, Effect::DoubleClick, EffectStrength::Medium)?;
        assert!(matches!(&binding.waveform, AlwaysOnWaveform::Compound(payload) if !payload.is_empty()));
        Ok(())
    }

    #[test]
    fn test_rebinding_replaces() -> TestResult {
        let catalog = catalog();
        let mut table = AlwaysOnTable::default();
        table.enable(&catalog, 1, Effect::Click, EffectStrength::Light)?;
        table.enable(&catalog, 1, Effect::Tick, EffectStrength::Strong)?;
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(1).map(|b| b.effect), Some(Effect::Tick));
        Ok(())
    }

    #[test]
    fn test_id_out_of_range() {
        let mut table = AlwaysOnTable::default();
        let result = table.enable(&catalog(), ALWAYS_ON_ID_MAX + 1, Effect::Click, EffectStrength::Light);
        assert!(matches!(result, Err(HapticError::UnsupportedOperation { .. })));
        assert!(table.disable(-1).is_err());
        assert!(table.is_empty());
    }

    #[test]
    fn test_disable_unbound_is_ok() -> TestResult {
        let mut table = AlwaysOnTable::default();
        assert_eq!(table.disable(3)?, None);
        Ok(())
    }
}
