//! Vibrator service facade.

use std::sync::Arc;

use tracing::{debug, info, instrument};
use vibrator_calibration::{ActuatorRole, CalibrationProfile, VOLTAGE_SCALE_MAX};
use vibrator_effects::{
    Braking, COMPOSE_DELAY_MAX_MS, COMPOSE_SIZE_MAX, CompositePrimitive, Effect, EffectCatalog,
    EffectPlan, EffectStrength, LONG_VIBRATION_THRESHOLD_MS, MAX_COLD_START_LATENCY_MS,
    MAX_TIME_MS, waveform,
};
use vibrator_errors::validation::ensure_range;
use vibrator_errors::{HapticError, Result};
use vibrator_hw::{AlsaDevice, HwApi, HwCal, HwGpio};
use vibrator_waveform::{
    COMPOSE_PWLE_SIZE_MAX, CompositeEffect, PWLE_PRIMITIVE_DURATION_MAX_MS, PrimitivePwle,
    compose_compound, compose_primitives, compose_pwle,
};

use crate::actuator::{Actuator, ActuatorSet};
use crate::always_on::{AlwaysOnBinding, AlwaysOnTable};
use crate::capabilities::Capabilities;
use crate::completion::CompletionCallback;
use crate::config::VibratorConfig;
use crate::playback::{
    ActiveEffect, PlayRequest, PlaybackController, PlaybackMonitor, PlaybackSource,
    PlaybackWaveform,
};

/// Driver and calibration handles for one actuator.
#[derive(Clone)]
pub struct ActuatorHandles {
    pub api: Arc<dyn HwApi>,
    pub cal: Arc<dyn HwCal>,
}

impl ActuatorHandles {
    pub fn new(api: Arc<dyn HwApi>, cal: Arc<dyn HwCal>) -> Self {
        Self { api, cal }
    }
}

/// Haptic effect orchestration for one or more actuators.
///
/// All operations run on the caller's thread; completion callbacks run on
/// a per-effect completion thread.
pub struct Vibrator {
    pub(crate) controller: PlaybackController,
    pub(crate) catalog: EffectCatalog,
    pub(crate) profile: CalibrationProfile,
    pub(crate) capabilities: Capabilities,
    pub(crate) always_on: AlwaysOnTable,
    pub(crate) long_scale: f32,
    pub(crate) external_control: bool,
    haptic_pcm: Option<AlsaDevice>,
    primary_api: Arc<dyn HwApi>,
    config: VibratorConfig,
}

impl Vibrator {
    /// Initialize every actuator and build the effect tables.
    ///
    /// The first handle is the primary actuator. Calibration comes from the
    /// primary; secondaries contribute their own frequency offsets.
    ///
    /// # Errors
    ///
    /// - [`HapticError::IllegalArgument`] for an invalid configuration,
    ///   no actuators, or malformed calibration values
    /// - [`HapticError::HardwareIo`] for missing required calibration or a
    ///   failed driver write
    #[instrument(skip_all, fields(actuators = handles.len()))]
    pub fn new(
        handles: Vec<ActuatorHandles>,
        gpio: Option<Arc<dyn HwGpio>>,
        config: VibratorConfig,
    ) -> Result<Self> {
        config.validate()?;
        let primary_api = handles
            .first()
            .map(|handle| Arc::clone(&handle.api))
            .ok_or_else(|| HapticError::illegal("at least one actuator is required"))?;

        let mut actuators = Vec::with_capacity(handles.len());
        for (position, handle) in handles.into_iter().enumerate() {
            let role = if position == 0 {
                ActuatorRole::Primary
            } else {
                ActuatorRole::Secondary
            };
            actuators.push(Actuator::init(
                handle.api,
                handle.cal,
                role,
                config.min_on_off_interval_us,
            )?);
        }

        let set = ActuatorSet::new(actuators, gpio)?;
        let profile = set.primary().profile().clone();
        let has_owt = set.iter().all(|actuator| actuator.api().has_owt_free_space());
        let haptic_pcm = primary_api.haptic_alsa_device();
        let capabilities = Capabilities::detect(has_owt, haptic_pcm.is_some(), profile.chirp_enabled);
        let catalog = EffectCatalog::new(&profile);

        let mut vibrator = Self {
            controller: PlaybackController::new(set, Arc::clone(&primary_api), config.timing.clone()),
            catalog,
            profile,
            capabilities,
            always_on: AlwaysOnTable::default(),
            long_scale: 1.0,
            external_control: false,
            haptic_pcm,
            primary_api,
            config,
        };
        let gain = vibrator.long_gain();
        vibrator.controller.set_idle_gain(gain);

        info!(
            capabilities = vibrator.capabilities.bits(),
            f0_hz = vibrator.profile.resonant_frequency_hz(),
            "Vibrator ready"
        );
        Ok(vibrator)
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn config(&self) -> &VibratorConfig {
        &self.config
    }

    /// Observer for the playback state, usable from other threads.
    pub fn monitor(&self) -> PlaybackMonitor {
        self.controller.monitor()
    }

    pub fn active_effect(&self) -> Option<ActiveEffect> {
        self.controller.active()
    }

    fn require(&self, capability: Capabilities, what: &str) -> Result<()> {
        if self.capabilities.contains(capability) {
            Ok(())
        } else {
            Err(HapticError::unsupported(what))
        }
    }

    /// Everything except `capabilities`, `off`, `set_external_control` and
    /// the dump is refused while the PCM path owns the actuator.
    fn reject_during_external_control(&self, what: &str) -> Result<()> {
        if self.external_control {
            Err(HapticError::unsupported(format!("{what} while external control is active")))
        } else {
            Ok(())
        }
    }

    /// Gain for long vibrations at the current amplitude.
    fn long_gain(&self) -> u16 {
        let gain = (self.long_scale * self.profile.long.max as f32).round().max(0.0) as u32;
        u16::try_from(gain).unwrap_or(u16::MAX)
    }

    /// Vibrate for `timeout_ms` at the current amplitude.
    ///
    /// # Errors
    ///
    /// [`HapticError::IllegalArgument`] for a duration outside
    /// `0..=65535` ms.
    pub fn on(&mut self, timeout_ms: i32, callback: CompletionCallback) -> Result<()> {
        self.reject_during_external_control("on")?;
        let requested = ensure_range("duration", timeout_ms, 0, MAX_TIME_MS as i32)?.unsigned_abs();

        let index = if requested < LONG_VIBRATION_THRESHOLD_MS {
            waveform::SHORT_VIBRATION
        } else {
            waveform::LONG_VIBRATION
        };
        let duration_ms = match requested.checked_add(MAX_COLD_START_LATENCY_MS) {
            Some(padded) if padded <= MAX_TIME_MS => padded,
            _ => requested,
        };
        let replay = u16::try_from(duration_ms).unwrap_or(u16::MAX);

        self.controller.play(
            PlayRequest {
                source: PlaybackSource::Vibration,
                waveform: PlaybackWaveform::Indexed(index),
                duration_ms,
                gain: self.long_gain(),
                replay_length_ms: Some(replay),
                frequency_offset: true,
            },
            callback,
        )?;
        Ok(())
    }

    /// Stop whatever is playing. The stopped effect reports
    /// [`EffectOutcome::Interrupted`](crate::EffectOutcome::Interrupted).
    pub fn off(&mut self) -> Result<()> {
        debug!("Off requested");
        self.controller.stop()
    }

    /// Play a named effect and return its expected duration.
    ///
    /// # Errors
    ///
    /// [`HapticError::UnsupportedOperation`] for effects outside
    /// [`supported_effects`](Self::supported_effects).
    pub fn perform(
        &mut self,
        effect: Effect,
        strength: EffectStrength,
        callback: CompletionCallback,
    ) -> Result<u32> {
        self.reject_during_external_control("perform")?;
        let plan = self.catalog.resolve(effect, strength)?;
        let duration_ms = plan.duration_ms();
        let (waveform, gain) = match plan {
            EffectPlan::Simple(simple) => (
                PlaybackWaveform::Indexed(simple.index),
                u16::try_from(simple.vol).unwrap_or(u16::MAX),
            ),
            EffectPlan::Compound {
                segments,
                duration_ms,
            } => {
                let composed = compose_compound(&segments, duration_ms)?;
                (
                    PlaybackWaveform::Custom {
                        payload: composed.bytes().to_vec(),
                        retain: true,
                    },
                    full_gain(),
                )
            }
        };

        self.controller.play(
            PlayRequest {
                source: PlaybackSource::Effect(effect, strength),
                waveform,
                duration_ms,
                gain,
                replay_length_ms: None,
                frequency_offset: false,
            },
            callback,
        )?;
        Ok(duration_ms)
    }

    pub fn supported_effects(&self) -> Result<Vec<Effect>> {
        self.reject_during_external_control("supported_effects")?;
        Ok(self.catalog.supported_effects())
    }

    /// Scale long vibrations by `amplitude` in `(0, 1]`.
    pub fn set_amplitude(&mut self, amplitude: f32) -> Result<()> {
        self.reject_during_external_control("set_amplitude")?;
        if !(amplitude > 0.0 && amplitude <= 1.0) {
            return Err(HapticError::illegal(format!(
                "amplitude {amplitude} is outside (0, 1]"
            )));
        }
        self.long_scale = amplitude;
        let gain = self.long_gain();
        self.controller.set_idle_gain(gain);
        self.controller.actuators().set_gain(gain)?;
        debug!(amplitude, gain, "Amplitude set");
        Ok(())
    }

    /// Hand the actuator to the haptic PCM path, or take it back.
    ///
    /// Enabling stops any playing effect first.
    ///
    /// # Errors
    ///
    /// [`HapticError::UnsupportedOperation`] when the platform has no haptic
    /// PCM device.
    pub fn set_external_control(&mut self, enabled: bool) -> Result<()> {
        let device = self
            .haptic_pcm
            .ok_or_else(|| HapticError::unsupported("external control"))?;
        if enabled == self.external_control {
            return Ok(());
        }
        if enabled {
            self.controller.stop()?;
            self.controller.actuators().set_gain(self.long_gain())?;
        }
        self.primary_api.set_haptic_pcm_amp(enabled, device)?;
        self.external_control = enabled;
        info!(enabled, %device, "External control changed");
        Ok(())
    }

    /// # Errors
    ///
    /// [`HapticError::UnsupportedOperation`] without compose support.
    pub fn supported_primitives(&self) -> Result<Vec<CompositePrimitive>> {
        self.reject_during_external_control("supported_primitives")?;
        self.require(Capabilities::COMPOSE_EFFECTS, "composite primitives")?;
        Ok(self.catalog.supported_primitives())
    }

    pub fn primitive_duration(&self, primitive: CompositePrimitive) -> Result<u32> {
        self.reject_during_external_control("primitive_duration")?;
        self.require(Capabilities::COMPOSE_EFFECTS, "composite primitives")?;
        self.catalog.primitive_duration(primitive)
    }

    pub fn composition_size_max(&self) -> Result<usize> {
        self.reject_during_external_control("composition_size_max")?;
        Ok(COMPOSE_SIZE_MAX)
    }

    pub fn composition_delay_max(&self) -> Result<u32> {
        self.reject_during_external_control("composition_delay_max")?;
        Ok(COMPOSE_DELAY_MAX_MS)
    }

    /// Play a composite primitive sequence and return its duration.
    ///
    /// The whole sequence is validated before any hardware is touched.
    pub fn compose(&mut self, composite: &[CompositeEffect], callback: CompletionCallback) -> Result<u32> {
        self.reject_during_external_control("compose")?;
        self.require(Capabilities::COMPOSE_EFFECTS, "compose")?;
        let composed = compose_primitives(&self.catalog, composite)?;
        let duration_ms = composed.duration_ms;
        self.controller.play(
            PlayRequest {
                source: PlaybackSource::Composition,
                waveform: PlaybackWaveform::Custom {
                    payload: composed.bytes().to_vec(),
                    retain: false,
                },
                duration_ms,
                gain: full_gain(),
                replay_length_ms: None,
                frequency_offset: false,
            },
            callback,
        )?;
        Ok(duration_ms)
    }

    pub fn supported_always_on_effects(&self) -> Result<Vec<Effect>> {
        self.reject_during_external_control("supported_always_on_effects")?;
        Ok(self.catalog.supported_always_on_effects())
    }

    pub fn always_on_enable(&mut self, id: i32, effect: Effect, strength: EffectStrength) -> Result<()> {
        self.reject_during_external_control("always_on_enable")?;
        self.always_on.enable(&self.catalog, id, effect, strength)?;
        Ok(())
    }

    pub fn always_on_disable(&mut self, id: i32) -> Result<()> {
        self.reject_during_external_control("always_on_disable")?;
        self.always_on.disable(id)?;
        Ok(())
    }

    pub fn always_on_binding(&self, id: i32) -> Option<&AlwaysOnBinding> {
        self.always_on.get(id)
    }

    /// Resonant frequency of the primary actuator in Hz.
    pub fn resonant_frequency(&self) -> Result<f32> {
        self.reject_during_external_control("resonant_frequency")?;
        Ok(self.profile.resonant_frequency_hz())
    }

    pub fn q_factor(&self) -> Result<f32> {
        self.reject_during_external_control("q_factor")?;
        Ok(self.profile.q_factor())
    }

    fn frequency_map(&self) -> Result<vibrator_calibration::FrequencyMap> {
        self.reject_during_external_control("frequency queries")?;
        self.require(Capabilities::FREQUENCY_CONTROL, "frequency control")?;
        self.profile
            .frequency_map()
            .ok_or_else(|| HapticError::unsupported("frequency control"))
    }

    pub fn frequency_resolution(&self) -> Result<f32> {
        self.frequency_map().map(|map| map.resolution_hz)
    }

    pub fn frequency_minimum(&self) -> Result<f32> {
        self.frequency_map().map(|map| map.minimum_hz)
    }

    pub fn bandwidth_amplitude_map(&self) -> Result<Vec<f32>> {
        self.frequency_map().map(|map| map.bandwidth_amplitude)
    }

    pub fn pwle_primitive_duration_max(&self) -> Result<i32> {
        self.reject_during_external_control("pwle_primitive_duration_max")?;
        Ok(PWLE_PRIMITIVE_DURATION_MAX_MS)
    }

    pub fn pwle_composition_size_max(&self) -> Result<usize> {
        self.reject_during_external_control("pwle_composition_size_max")?;
        Ok(COMPOSE_PWLE_SIZE_MAX)
    }

    /// # Errors
    ///
    /// [`HapticError::UnsupportedOperation`] without PWLE support.
    pub fn supported_braking(&self) -> Result<Vec<Braking>> {
        self.reject_during_external_control("supported_braking")?;
        self.require(Capabilities::COMPOSE_PWLE_EFFECTS, "braking")?;
        Ok(vec![Braking::None])
    }

    /// Play a PWLE sequence and return its duration.
    ///
    /// The whole sequence is validated before any hardware is touched.
    pub fn compose_pwle(&mut self, segments: &[PrimitivePwle], callback: CompletionCallback) -> Result<u32> {
        self.reject_during_external_control("compose_pwle")?;
        self.require(Capabilities::COMPOSE_PWLE_EFFECTS, "compose PWLE")?;
        let map = self.frequency_map()?;
        let braking = self.supported_braking()?;
        let composed = compose_pwle(&map, &braking, segments)?;
        let duration_ms = composed.duration_ms;
        self.controller.play(
            PlayRequest {
                source: PlaybackSource::Pwle,
                waveform: PlaybackWaveform::Custom {
                    payload: composed.bytes().to_vec(),
                    retain: false,
                },
                duration_ms,
                gain: full_gain(),
                replay_length_ms: None,
                frequency_offset: false,
            },
            callback,
        )?;
        Ok(duration_ms)
    }
}

fn full_gain() -> u16 {
    u16::try_from(VOLTAGE_SCALE_MAX).unwrap_or(100)
}

impl std::fmt::Debug for Vibrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vibrator")
            .field("capabilities", &self.capabilities)
            .field("controller", &self.controller)
            .field("external_control", &self.external_control)
            .finish()
    }
}
