//! Ordered actuator collection and the "arm all, then fire" trigger step.
//!
//! The first actuator is the primary. Every hardware sequence that touches
//! more than one actuator lives here so that a failure on any of them
//! leaves none started and no custom slot behind. More than one actuator
//! is only ever started by the shared GPIO edge; without a working sync
//! line such a set refuses to play rather than start one side alone.

use core::fmt;
use std::sync::Arc;

use tracing::{debug, info, trace, warn};
use vibrator_calibration::{ActuatorRole, CalibrationProfile};
use vibrator_effects::{waveform, waveform_duration_ms};
use vibrator_errors::{HapticError, Result};
use vibrator_hw::{FfEffect, HwApi, HwCal, HwGpio};

/// Base of the GPIO trigger button code; the effect index fills the low bits.
pub const GPIO_TRIGGER_BUTTON: u16 = 0x9000;

/// One actuator: driver handle, calibration and its effect table.
pub struct Actuator {
    api: Arc<dyn HwApi>,
    cal: Arc<dyn HwCal>,
    profile: CalibrationProfile,
    effects: Vec<FfEffect>,
}

impl Actuator {
    /// Load calibration, push it to the driver and register the
    /// precompiled waveforms.
    pub fn init(
        api: Arc<dyn HwApi>,
        cal: Arc<dyn HwCal>,
        role: ActuatorRole,
        min_on_off_interval_us: u32,
    ) -> Result<Self> {
        let profile = CalibrationProfile::load(cal.as_ref(), role)?;
        profile.apply(api.as_ref(), min_on_off_interval_us)?;

        let registered = api.effect_count()?;
        let mut effects = Vec::with_capacity(usize::from(waveform::MAX_INDEX));
        for index in 0..waveform::MAX_PHYSICAL {
            let mut effect = FfEffect::physical(index);
            let replay = u16::try_from(waveform_duration_ms(index)).unwrap_or(u16::MAX);
            api.set_ff_effect(&mut effect, replay)?;
            effects.push(effect);
        }
        effects.resize(usize::from(waveform::MAX_INDEX), FfEffect::empty());

        let mut actuator = Self {
            api,
            cal,
            profile,
            effects,
        };
        actuator.erase_stale(registered);
        debug!(
            role = %role,
            registered,
            "Actuator effect table initialized"
        );
        Ok(actuator)
    }

    /// Erase uploaded effects left behind by a previous owner.
    fn erase_stale(&mut self, registered: u32) {
        for index in u32::from(waveform::MAX_PHYSICAL)..registered {
            match self.api.erase_owt_effect(index, &mut self.effects) {
                Ok(()) => debug!(index, "Erased stale uploaded effect"),
                Err(e) => warn!(index, "Failed to erase stale uploaded effect: {e}"),
            }
        }
    }

    pub fn role(&self) -> ActuatorRole {
        self.profile.role
    }

    pub fn profile(&self) -> &CalibrationProfile {
        &self.profile
    }

    pub fn api(&self) -> &dyn HwApi {
        self.api.as_ref()
    }

    pub fn effects(&self) -> &[FfEffect] {
        &self.effects
    }

    fn effect_mut(&mut self, index: u32) -> Result<&mut FfEffect> {
        let slot = usize::try_from(index).map_err(|e| HapticError::illegal(e.to_string()))?;
        if slot >= self.effects.len() {
            self.effects.resize(slot + 1, FfEffect::empty());
        }
        self.effects
            .get_mut(slot)
            .ok_or_else(|| HapticError::illegal(format!("effect index {index} out of table")))
    }

    /// Driver id used to play the effect at `index`.
    fn play_id(&self, index: u32) -> u32 {
        let id = usize::try_from(index)
            .ok()
            .and_then(|slot| self.effects.get(slot))
            .map_or(-1, |effect| effect.id);
        u32::try_from(id).unwrap_or(index)
    }

    fn write_descriptor(&mut self, index: u32, replay_length_ms: u16, trigger_button: u16) -> Result<()> {
        let api = Arc::clone(&self.api);
        let effect = self.effect_mut(index)?;
        effect.trigger_button = trigger_button;
        api.set_ff_effect(effect, replay_length_ms)?;
        Ok(())
    }

    /// Whether an upload at `index` is still resident on this actuator.
    fn holds_upload(&self, index: u32) -> bool {
        usize::try_from(index)
            .ok()
            .and_then(|slot| self.effects.get(slot))
            .is_some_and(|effect| effect.owt_payload().is_some())
    }

    fn replay_length(&self, index: u32) -> u16 {
        usize::try_from(index)
            .ok()
            .and_then(|slot| self.effects.get(slot))
            .map_or(0, |effect| effect.replay_length_ms)
    }
}

impl fmt::Debug for Actuator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Actuator")
            .field("role", &self.profile.role)
            .field("effects", &self.effects.len())
            .finish()
    }
}

/// How one trigger should start the actuators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerPlan {
    /// Effect table index
    pub index: u32,
    /// New replay length, for effects whose length varies per request
    pub replay_length_ms: Option<u16>,
    /// Gain in percent
    pub gain: u16,
}

/// Primary-first actuator collection plus the optional sync line.
pub struct ActuatorSet {
    primary: Actuator,
    secondary: Vec<Actuator>,
    gpio: Option<Arc<dyn HwGpio>>,
    gpio_ready: bool,
}

impl ActuatorSet {
    /// # Errors
    ///
    /// [`HapticError::IllegalArgument`] when `actuators` is empty.
    pub fn new(actuators: Vec<Actuator>, gpio: Option<Arc<dyn HwGpio>>) -> Result<Self> {
        let mut actuators = actuators.into_iter();
        let primary = actuators
            .next()
            .ok_or_else(|| HapticError::illegal("at least one actuator is required"))?;
        let mut set = Self {
            primary,
            secondary: actuators.collect(),
            gpio,
            gpio_ready: false,
        };
        if !set.secondary.is_empty() {
            set.gpio_ready = match &set.gpio {
                Some(gpio) => match gpio.init() {
                    Ok(()) => true,
                    Err(e) => {
                        warn!("GPIO sync line failed to initialize, playback disabled: {e}");
                        false
                    }
                },
                None => {
                    warn!("No GPIO sync line for secondary actuators, playback disabled");
                    false
                }
            };
        }
        info!(
            actuators = set.len(),
            gpio_sync = set.gpio_ready,
            "Actuator set ready"
        );
        Ok(set)
    }

    pub fn primary(&self) -> &Actuator {
        &self.primary
    }

    pub fn iter(&self) -> impl Iterator<Item = &Actuator> {
        std::iter::once(&self.primary).chain(self.secondary.iter())
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut Actuator> {
        std::iter::once(&mut self.primary).chain(self.secondary.iter_mut())
    }

    fn get_mut(&mut self, position: usize) -> Option<&mut Actuator> {
        match position.checked_sub(1) {
            None => Some(&mut self.primary),
            Some(rest) => self.secondary.get_mut(rest),
        }
    }

    pub fn len(&self) -> usize {
        self.secondary.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn gpio_sync(&self) -> bool {
        self.gpio_ready
    }

    /// Fail unless a trigger can start every actuator together.
    ///
    /// # Errors
    ///
    /// [`HapticError::HardwareIo`] when secondary actuators are present but
    /// the sync line is not usable.
    pub fn ensure_triggerable(&self) -> Result<()> {
        if self.secondary.is_empty() || self.gpio_ready {
            Ok(())
        } else {
            Err(HapticError::hardware(
                "gpio trigger",
                format!("sync line unavailable for {} actuators", self.len()),
            ))
        }
    }

    /// Set the gain on every actuator.
    pub fn set_gain(&self, gain: u16) -> Result<()> {
        for actuator in self.iter() {
            actuator.api.set_ff_gain(gain)?;
        }
        Ok(())
    }

    /// Write each actuator's own frequency offset, or clear it.
    pub fn set_frequency_offset(&self, enable: bool) -> Result<()> {
        for actuator in self.iter() {
            let offset = if enable { actuator.profile.frequency_offset } else { 0 };
            actuator.api.set_f0_offset(offset)?;
        }
        Ok(())
    }

    /// Upload `payload` on every actuator and return the shared slot index.
    ///
    /// Free space is checked on every actuator before anything is uploaded.
    /// A failure part way erases the copies already uploaded.
    ///
    /// # Errors
    ///
    /// - [`HapticError::UnsupportedOperation`] when an actuator has no OWT
    /// - [`HapticError::ResourceExhausted`] when the payload does not fit
    /// - [`HapticError::HardwareIo`] when an upload fails or the actuators
    ///   disagree on the slot index
    pub fn upload(&mut self, payload: &[u8]) -> Result<u32> {
        for actuator in self.iter() {
            if !actuator.api.has_owt_free_space() {
                return Err(HapticError::unsupported("custom waveform upload"));
            }
            let free = actuator.api.owt_free_space()?;
            let available = usize::try_from(free).unwrap_or(usize::MAX);
            if payload.len() > available {
                warn!(
                    role = %actuator.role(),
                    requested = payload.len(),
                    available,
                    "Not enough OWT space"
                );
                return Err(HapticError::exhausted("OWT space", payload.len(), available));
            }
        }

        let mut slot: Option<u32> = None;
        for position in 0..self.len() {
            let Some(actuator) = self.get_mut(position) else {
                break;
            };
            let mut effect = FfEffect::empty();
            let index = match actuator.api.upload_owt_effect(payload, &mut effect) {
                Ok(index) => index,
                Err(e) => {
                    warn!(role = %actuator.role(), "Upload failed: {e}");
                    if let Some(index) = slot {
                        self.erase_first(position, index);
                    }
                    return Err(e.into());
                }
            };
            if let Some(expected) = slot.filter(|expected| *expected != index) {
                let role = actuator.role();
                if let Err(e) = actuator.api.erase_owt_effect(index, &mut actuator.effects) {
                    warn!(role = %role, index, "Rollback erase failed: {e}");
                }
                self.erase_first(position, expected);
                return Err(HapticError::hardware(
                    "upload_owt_effect",
                    format!("{role} actuator assigned slot {index}, expected {expected}"),
                ));
            }
            *actuator.effect_mut(index)? = effect;
            slot = Some(index);
        }

        let index = slot.ok_or_else(|| {
            HapticError::hardware("upload_owt_effect", "no actuator accepted the upload")
        })?;
        debug!(index, len = payload.len(), "Uploaded custom waveform");
        Ok(index)
    }

    /// Erase `index` on the first `count` actuators, logging failures.
    fn erase_first(&mut self, count: usize, index: u32) {
        for actuator in self.iter_mut().take(count) {
            if let Err(e) = actuator.api.erase_owt_effect(index, &mut actuator.effects) {
                warn!(role = %actuator.role(), index, "Rollback erase failed: {e}");
            }
        }
    }

    /// Erase the slot at `index` on every actuator still holding it.
    ///
    /// Actuators whose copy is already gone are skipped, so a retry after a
    /// partial failure only touches the ones that failed. Every holder is
    /// attempted; the first failure is returned.
    pub fn erase(&mut self, index: u32) -> Result<()> {
        let mut first_error = None;
        for actuator in self.iter_mut() {
            if !actuator.holds_upload(index) {
                trace!(role = %actuator.role(), index, "Slot already erased");
                continue;
            }
            match actuator.api.erase_owt_effect(index, &mut actuator.effects) {
                Ok(()) => {
                    if let Ok(entry) = actuator.effect_mut(index) {
                        *entry = FfEffect::empty();
                    }
                }
                Err(e) => {
                    warn!(role = %actuator.role(), index, "Erase failed: {e}");
                    first_error.get_or_insert(HapticError::from(e));
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => {
                debug!(index, "Erased custom waveform");
                Ok(())
            }
        }
    }

    /// Apply gain and replay length, then start every actuator.
    ///
    /// With a sync line every actuator is armed with the GPIO trigger button
    /// before a single rising edge starts them. A lone actuator is started
    /// by a play command.
    pub fn trigger(&mut self, plan: &TriggerPlan) -> Result<()> {
        self.ensure_triggerable()?;
        self.set_gain(plan.gain)?;
        if let Some(replay) = plan.replay_length_ms {
            for actuator in self.iter_mut() {
                let trigger_button = actuator
                    .effects
                    .get(usize::try_from(plan.index).unwrap_or(usize::MAX))
                    .map_or(0, |effect| effect.trigger_button);
                actuator.write_descriptor(plan.index, replay, trigger_button)?;
            }
        }

        if self.gpio_ready {
            self.trigger_synced(plan.index)
        } else {
            let primary = &self.primary;
            primary.api.set_ff_play(primary.play_id(plan.index), true)?;
            Ok(())
        }
    }

    fn trigger_synced(&mut self, index: u32) -> Result<()> {
        let button = GPIO_TRIGGER_BUTTON | (u16::try_from(index).unwrap_or(0x0FFF) & 0x0FFF);
        let mut armed = 0_usize;
        let mut failure = None;
        for actuator in self.iter_mut() {
            let replay = actuator.replay_length(index);
            match actuator.write_descriptor(index, replay, button) {
                Ok(()) => armed += 1,
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        let fired = match (failure, &self.gpio) {
            (Some(e), _) => Err(e),
            (None, Some(gpio)) => gpio.set_output(true).map_err(HapticError::from),
            (None, None) => Err(HapticError::hardware("gpio trigger", "line missing")),
        };
        if let Err(e) = fired {
            warn!(index, armed, "GPIO trigger aborted before the edge: {e}");
            self.disarm(index, armed);
            return Err(e);
        }
        debug!(index, actuators = armed, "Fired GPIO trigger");
        Ok(())
    }

    /// Clear the trigger button on the first `count` actuators.
    fn disarm(&mut self, index: u32, count: usize) {
        for actuator in self.iter_mut().take(count) {
            let replay = actuator.replay_length(index);
            if let Err(e) = actuator.write_descriptor(index, replay, 0) {
                warn!(role = %actuator.role(), index, "Disarm failed: {e}");
            }
        }
    }

    /// Stop playback of `index` on every actuator.
    pub fn stop(&self, index: u32) -> Result<()> {
        let mut first_error = None;
        for actuator in self.iter() {
            if let Err(e) = actuator.api.set_ff_play(actuator.play_id(index), false) {
                warn!(role = %actuator.role(), index, "Stop failed: {e}");
                first_error.get_or_insert(HapticError::from(e));
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Drop the sync line and disarm `index` after playback.
    pub fn reset_trigger(&mut self, index: u32) -> Result<()> {
        if !self.gpio_ready {
            return Ok(());
        }
        if let Some(gpio) = &self.gpio {
            gpio.set_output(false)?;
        }
        let still_loaded: Vec<bool> = self
            .iter()
            .map(|actuator| {
                usize::try_from(index)
                    .ok()
                    .and_then(|slot| actuator.effects.get(slot))
                    .is_some_and(|effect| effect.trigger_button != 0 && effect.id >= 0)
            })
            .collect();
        for (actuator, loaded) in self.iter_mut().zip(still_loaded) {
            if loaded {
                let replay = actuator.replay_length(index);
                actuator.write_descriptor(index, replay, 0)?;
            }
        }
        Ok(())
    }

    /// Diagnostics for every actuator and the sync line.
    pub fn debug(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        for actuator in self.iter() {
            writeln!(out, "  {} actuator:", actuator.role())?;
            writeln!(out, "    Frequency offset: {:#x}", actuator.profile.frequency_offset)?;
            writeln!(out, "    Effects:")?;
            for (index, effect) in actuator.effects.iter().enumerate() {
                write!(
                    out,
                    "      {index:2}: id {:3} replay {:5} ms trigger {:#06x}",
                    effect.id, effect.replay_length_ms, effect.trigger_button
                )?;
                match effect.owt_payload() {
                    Some(bytes) => {
                        write!(out, " owt")?;
                        for byte in bytes {
                            write!(out, " {byte:02x}")?;
                        }
                        writeln!(out)?;
                    }
                    None => writeln!(out)?,
                }
            }
            actuator.api.debug(out)?;
            actuator.cal.debug(out)?;
        }
        if let Some(gpio) = &self.gpio {
            writeln!(out, "  GPIO sync: {}", self.gpio_ready)?;
            gpio.debug(out)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ActuatorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActuatorSet")
            .field("primary", &self.primary)
            .field("secondary", &self.secondary)
            .field("gpio_sync", &self.gpio_ready)
            .finish()
    }
}
