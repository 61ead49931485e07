//! Diagnostic dump.

use core::fmt::{self, Write};

use tracing::warn;

use crate::always_on::AlwaysOnWaveform;
use crate::vibrator::Vibrator;

impl Vibrator {
    /// Write the engine state followed by each hardware diagnostic section.
    pub fn dump(&self, out: &mut dyn Write) -> fmt::Result {
        writeln!(out, "Vibrator:")?;
        writeln!(out, "  capabilities: {:#06x}", self.capabilities.bits())?;
        writeln!(out, "  external control: {}", self.external_control)?;
        writeln!(out, "  long scale: {}", self.long_scale)?;

        let hw = self.controller.actuators();
        writeln!(out, "  frequency offsets:")?;
        for actuator in hw.iter() {
            writeln!(
                out,
                "    {}: {:#08x}",
                actuator.role(),
                actuator.profile().frequency_offset
            )?;
        }

        let profile = &self.profile;
        writeln!(out, "  volume levels:")?;
        writeln!(out, "    tick: {} - {}", profile.tick.min, profile.tick.max)?;
        writeln!(out, "    click: {} - {}", profile.click.min, profile.click.max)?;
        writeln!(out, "    long: {} - {}", profile.long.min, profile.long.max)?;

        writeln!(out, "  playback: {}", self.controller.phase())?;
        match self.controller.active() {
            Some(active) => writeln!(
                out,
                "  active: {:?} index {} for {} ms (generation {})",
                active.source, active.index, active.duration_ms, active.generation
            )?,
            None => writeln!(out, "  active: none")?,
        }

        let slots = self.controller.slots();
        match slots.held() {
            Some(held) => writeln!(
                out,
                "  held slot: {} ({} bytes, retain {})",
                held.index,
                held.payload.len(),
                held.retain
            )?,
            None => writeln!(out, "  held slot: none")?,
        }
        writeln!(out, "  uploads: {} erases: {}", slots.uploads(), slots.erases())?;

        writeln!(out, "  always-on:")?;
        if self.always_on.is_empty() {
            writeln!(out, "    none")?;
        }
        for binding in self.always_on.iter() {
            write!(out, "    {}: {} {}", binding.id, binding.effect, binding.strength)?;
            match &binding.waveform {
                AlwaysOnWaveform::Indexed { index, vol } => writeln!(out, " index {index} vol {vol}")?,
                AlwaysOnWaveform::Compound(payload) => writeln!(out, " compound {} bytes", payload.len())?,
            }
        }

        hw.debug(out)
    }

    /// The dump as a string, cut short at the first section that fails.
    pub fn dump_string(&self) -> String {
        let mut out = String::new();
        if let Err(e) = self.dump(&mut out) {
            warn!("Diagnostic dump incomplete: {e}");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use vibrator_effects::{Effect, EffectStrength};
    use vibrator_test_helpers::prelude::*;

    use crate::config::VibratorConfig;
    use crate::vibrator::{ActuatorHandles, Vibrator};

    #[test]
    fn test_dump_sections() -> TestResult {
        let api = Arc::new(FakeHwApi::new());
        let mut vibrator = Vibrator::new(
            vec![ActuatorHandles::new(api, Arc::new(FakeHwCal::calibrated()))],
            None,
            VibratorConfig::default(),
        )?;
        vibrator.always_on_enable(1, Effect::Click, EffectStrength::Strong)?;
        vibrator.always_on_enable(2, Effect::DoubleClick, EffectStrength::Light)?;

        let dump = vibrator.dump_string();
        assert!(dump.starts_with("Vibrator:\n"));
        assert!(dump.contains("    primary: "));
        assert!(dump.contains("    click: 20 - 60"));
        assert!(dump.contains("  playback: Idle"));
        assert!(dump.contains("  active: none"));
        assert!(dump.contains("    1: Click Strong index 2 vol 60"));
        assert!(dump.contains("    2: DoubleClick Light compound "));
        Ok(())
    }
}
