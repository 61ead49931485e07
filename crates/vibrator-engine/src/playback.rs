//! Playback state machine.
//!
//! `Idle → Uploading → Triggering → Playing → Idle`, with `Stopping` entered
//! from `Playing` by an explicit stop or by a newer request.
//!
//! Two locks are involved and always taken in this order:
//!
//! 1. the transition lock, owning the [`ActuatorSet`], held for every
//!    upload, erase and trigger sequence
//! 2. the state lock, owning the phase, the [`ActiveEffect`] and the
//!    [`SlotLedger`], held only for read-modify-write
//!
//! Each triggered effect gets one completion thread. It polls the primary
//! actuator without holding either lock, checks a cancel channel between
//! poll slices, cleans up, and invokes the callback exactly once. Neither
//! lock is held while the control thread joins it.

use core::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, Sender, TryRecvError};
use parking_lot::{Mutex, MutexGuard};
use serde::Serialize;
use tracing::{debug, error, info, trace, warn};
use vibrator_effects::{Effect, EffectStrength};
use vibrator_errors::{HapticError, Result};
use vibrator_hw::{HwApi, VibeState};

use crate::actuator::{ActuatorSet, TriggerPlan};
use crate::completion::{CompletionCallback, EffectOutcome};
use crate::config::TimingConfig;
use crate::slots::{HeldSlot, SlotAction, SlotLedger};

/// Controller phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PlaybackPhase {
    Idle,
    Uploading,
    Triggering,
    Playing,
    Stopping,
}

impl fmt::Display for PlaybackPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// What a playback request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PlaybackSource {
    /// `on(duration)`
    Vibration,
    /// `perform(effect, strength)`
    Effect(Effect, EffectStrength),
    /// `compose(sequence)`
    Composition,
    /// `compose_pwle(segments)`
    Pwle,
}

/// Waveform to play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackWaveform {
    /// Precompiled waveform at a fixed table index
    Indexed(u16),
    /// Serialized payload that needs a custom slot
    Custom { payload: Vec<u8>, retain: bool },
}

/// Fully resolved playback request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayRequest {
    pub source: PlaybackSource,
    pub waveform: PlaybackWaveform,
    /// Expected playing time, cold-start latency included
    pub duration_ms: u32,
    /// Gain in percent
    pub gain: u16,
    /// Replay length override for variable-length waveforms
    pub replay_length_ms: Option<u16>,
    /// Apply each actuator's frequency offset for this effect
    pub frequency_offset: bool,
}

/// The single effect currently playing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveEffect {
    pub source: PlaybackSource,
    /// Effect table index being played
    pub index: u32,
    pub duration_ms: u32,
    /// Increases with every trigger; identifies the owning completion task
    pub generation: u64,
    pub started: Instant,
    pub frequency_offset: bool,
}

#[derive(Debug)]
struct PlaybackState {
    phase: PlaybackPhase,
    active: Option<ActiveEffect>,
    /// Generation being stopped by the control thread
    stopping: Option<u64>,
    slots: SlotLedger,
    generation: u64,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            phase: PlaybackPhase::Idle,
            active: None,
            stopping: None,
            slots: SlotLedger::default(),
            generation: 0,
        }
    }
}

/// How the completion wait ended, before cleanup decides the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WaitEnd {
    Stopped,
    Cancelled,
    TimedOut,
}

struct Shared {
    hw: Mutex<ActuatorSet>,
    state: Mutex<PlaybackState>,
    primary: Arc<dyn HwApi>,
    timing: TimingConfig,
}

struct Waiter {
    generation: u64,
    cancel: Sender<()>,
    handle: JoinHandle<()>,
}

/// Read-only view of the controller, usable from any thread.
#[derive(Clone)]
pub struct PlaybackMonitor {
    shared: Arc<Shared>,
}

impl PlaybackMonitor {
    pub fn phase(&self) -> PlaybackPhase {
        self.shared.state.lock().phase
    }

    pub fn active(&self) -> Option<ActiveEffect> {
        self.shared.state.lock().active.clone()
    }

    pub fn held_slot(&self) -> Option<HeldSlot> {
        self.shared.state.lock().slots.held().cloned()
    }
}

impl fmt::Debug for PlaybackMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackMonitor")
            .field("phase", &self.phase())
            .finish()
    }
}

/// Owns the actuators and the single active effect.
pub struct PlaybackController {
    shared: Arc<Shared>,
    waiter: Option<Waiter>,
    idle_gain: u16,
}

impl PlaybackController {
    pub fn new(actuators: ActuatorSet, primary: Arc<dyn HwApi>, timing: TimingConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                hw: Mutex::new(actuators),
                state: Mutex::new(PlaybackState::default()),
                primary,
                timing,
            }),
            waiter: None,
            idle_gain: u16::try_from(vibrator_calibration::VOLTAGE_SCALE_MAX).unwrap_or(100),
        }
    }

    pub fn monitor(&self) -> PlaybackMonitor {
        PlaybackMonitor {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.shared.state.lock().phase
    }

    pub fn active(&self) -> Option<ActiveEffect> {
        self.shared.state.lock().active.clone()
    }

    /// Exclusive access to the actuators between transitions.
    pub fn actuators(&self) -> MutexGuard<'_, ActuatorSet> {
        self.shared.hw.lock()
    }

    /// Gain restored whenever an effect is stopped.
    pub fn set_idle_gain(&mut self, gain: u16) {
        self.idle_gain = gain;
    }

    /// Start `request`, stopping whatever plays first.
    ///
    /// The previous effect's callback has received
    /// [`EffectOutcome::Interrupted`] by the time the new effect is
    /// triggered. On error the new callback is dropped without being
    /// invoked and no custom slot is left behind.
    pub fn play(&mut self, request: PlayRequest, callback: CompletionCallback) -> Result<ActiveEffect> {
        self.stop()?;

        let mut hw = self.shared.hw.lock();
        hw.ensure_triggerable()?;

        let index = match &request.waveform {
            PlaybackWaveform::Indexed(index) => u32::from(*index),
            PlaybackWaveform::Custom { payload, retain } => {
                self.set_phase(PlaybackPhase::Uploading);
                match self.acquire_slot(&mut hw, payload, *retain) {
                    Ok(index) => index,
                    Err(e) => {
                        self.set_phase(PlaybackPhase::Idle);
                        return Err(e);
                    }
                }
            }
        };

        self.set_phase(PlaybackPhase::Triggering);
        if request.frequency_offset {
            if let Err(e) = hw.set_frequency_offset(true) {
                self.abandon(&mut hw, index, false);
                return Err(e);
            }
        }

        let active = {
            let mut state = self.shared.state.lock();
            state.generation += 1;
            let active = ActiveEffect {
                source: request.source,
                index,
                duration_ms: request.duration_ms,
                generation: state.generation,
                started: Instant::now(),
                frequency_offset: request.frequency_offset,
            };
            state.active = Some(active.clone());
            active
        };

        let plan = TriggerPlan {
            index,
            replay_length_ms: request.replay_length_ms,
            gain: request.gain,
        };
        if let Err(e) = hw.trigger(&plan) {
            warn!(source = ?request.source, index, "Trigger failed: {e}");
            self.abandon(&mut hw, index, request.frequency_offset);
            return Err(e);
        }
        self.set_phase(PlaybackPhase::Playing);
        drop(hw);

        let (cancel_tx, cancel_rx) = channel::bounded(1);
        let shared = Arc::clone(&self.shared);
        let task = active.clone();
        let spawned = thread::Builder::new()
            .name(format!("vibrator-wait-{}", active.generation))
            .spawn(move || shared.run_waiter(task, cancel_rx, callback));
        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                error!("Failed to spawn completion task: {e}");
                let mut hw = self.shared.hw.lock();
                if let Err(stop_err) = hw.stop(index) {
                    warn!("Stop after spawn failure failed: {stop_err}");
                }
                self.abandon(&mut hw, index, request.frequency_offset);
                return Err(HapticError::hardware("spawn completion task", e));
            }
        };
        self.waiter = Some(Waiter {
            generation: active.generation,
            cancel: cancel_tx,
            handle,
        });

        info!(
            source = ?active.source,
            index,
            duration_ms = active.duration_ms,
            gain = request.gain,
            generation = active.generation,
            "Effect triggered"
        );
        Ok(active)
    }

    /// Stop the active effect, if any, and wait for its callback.
    ///
    /// Hardware failures while stopping are returned after the completion
    /// task has been joined.
    pub fn stop(&mut self) -> Result<()> {
        let Some(waiter) = self.waiter.take() else {
            return Ok(());
        };

        let still_active = {
            let mut state = self.shared.state.lock();
            let owned = state
                .active
                .as_ref()
                .is_some_and(|active| active.generation == waiter.generation);
            if owned {
                state.stopping = Some(waiter.generation);
                state.phase = PlaybackPhase::Stopping;
            }
            owned.then(|| state.active.clone()).flatten()
        };

        let mut result = Ok(());
        if let Some(active) = &still_active {
            debug!(index = active.index, generation = active.generation, "Stopping effect");
            let hw = self.shared.hw.lock();
            result = hw.stop(active.index);
            if active.frequency_offset {
                result = result.and(hw.set_frequency_offset(false));
            }
            result = result.and(hw.set_gain(self.idle_gain));
        }
        if waiter.cancel.try_send(()).is_err() {
            trace!(generation = waiter.generation, "Completion task already finished");
        }
        if waiter.handle.join().is_err() {
            error!(generation = waiter.generation, "Completion task panicked");
        }

        if still_active.is_some() {
            match self
                .shared
                .primary
                .poll_vibe_state(VibeState::Stopped, Some(self.shared.timing.stop_settle_timeout()))
            {
                Ok(true) => {}
                Ok(false) => warn!("Actuator did not settle after stop"),
                Err(e) => warn!("Failed to poll actuator after stop: {e}"),
            }
        }

        let mut state = self.shared.state.lock();
        if state
            .active
            .as_ref()
            .is_some_and(|active| active.generation == waiter.generation)
        {
            state.active = None;
        }
        state.stopping = None;
        state.phase = PlaybackPhase::Idle;
        result
    }

    fn set_phase(&self, phase: PlaybackPhase) {
        let mut state = self.shared.state.lock();
        if state.phase != phase {
            trace!(from = %state.phase, to = %phase, "Playback phase");
        }
        state.phase = phase;
    }

    /// Reuse, replace or upload the custom slot for `payload`.
    fn acquire_slot(&self, hw: &mut ActuatorSet, payload: &[u8], retain: bool) -> Result<u32> {
        let action = self.shared.state.lock().slots.plan(payload, retain);
        match action {
            SlotAction::Reuse(index) => {
                debug!(index, "Reusing retained custom waveform");
                return Ok(index);
            }
            SlotAction::Replace(index) => {
                hw.erase(index)?;
                self.shared.state.lock().slots.release(index);
            }
            SlotAction::Upload => {}
        }
        let index = hw.upload(payload)?;
        self.shared.state.lock().slots.hold(index, payload, retain);
        Ok(index)
    }

    /// Undo a failed trigger: forget the active effect and drop any
    /// non-retained slot.
    fn abandon(&self, hw: &mut ActuatorSet, index: u32, frequency_offset: bool) {
        if frequency_offset {
            if let Err(e) = hw.set_frequency_offset(false) {
                warn!("Failed to clear frequency offset: {e}");
            }
        }
        let erase = self.shared.state.lock().slots.erase_after_playback(index);
        if erase {
            match hw.erase(index) {
                Ok(()) => self.shared.state.lock().slots.release(index),
                Err(e) => warn!(index, "Failed to erase slot after aborted trigger: {e}"),
            }
        }
        let mut state = self.shared.state.lock();
        state.active = None;
        state.phase = PlaybackPhase::Idle;
    }

    /// Slot bookkeeping snapshot.
    pub fn slots(&self) -> SlotLedger {
        self.shared.state.lock().slots.clone()
    }

    pub fn timing(&self) -> &TimingConfig {
        &self.shared.timing
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("Failed to stop effect on shutdown: {e}");
        }
    }
}

impl fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackController")
            .field("phase", &self.phase())
            .field("active", &self.active())
            .finish()
    }
}

impl Shared {
    fn run_waiter(&self, active: ActiveEffect, cancel: Receiver<()>, callback: CompletionCallback) {
        let end = self.await_playback(&active, &cancel);
        let outcome = self.finish(&active, end);
        debug!(
            generation = active.generation,
            %outcome,
            elapsed_ms = active.started.elapsed().as_millis(),
            "Effect finished"
        );
        callback(outcome);
    }

    fn await_playback(&self, active: &ActiveEffect, cancel: &Receiver<()>) -> WaitEnd {
        match self
            .primary
            .poll_vibe_state(VibeState::Haptic, Some(self.timing.haptic_state_timeout()))
        {
            Ok(true) => {}
            Ok(false) => debug!(generation = active.generation, "Playback start not observed"),
            Err(e) => warn!(generation = active.generation, "Failed to poll playback start: {e}"),
        }

        let deadline = active.started
            + Duration::from_millis(u64::from(active.duration_ms))
            + self.timing.completion_guard();
        loop {
            match cancel.try_recv() {
                Ok(()) | Err(TryRecvError::Disconnected) => return WaitEnd::Cancelled,
                Err(TryRecvError::Empty) => {}
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return WaitEnd::TimedOut;
            }
            let slice = remaining.min(self.timing.poll_slice());
            match self.primary.poll_vibe_state(VibeState::Stopped, Some(slice)) {
                Ok(true) => return WaitEnd::Stopped,
                Ok(false) => {}
                Err(e) => {
                    warn!(generation = active.generation, "Failed to poll playback stop: {e}");
                    if cancel.recv_timeout(slice).is_ok() {
                        return WaitEnd::Cancelled;
                    }
                }
            }
        }
    }

    /// Release what the effect held and decide its outcome.
    fn finish(&self, active: &ActiveEffect, end: WaitEnd) -> EffectOutcome {
        let mut hw = self.hw.lock();
        if end == WaitEnd::TimedOut {
            warn!(
                generation = active.generation,
                duration_ms = active.duration_ms,
                "Effect did not report completion in time; stopping it"
            );
            if let Err(e) = hw.stop(active.index) {
                warn!("Stop after timeout failed: {e}");
            }
        }

        let erase = self.state.lock().slots.erase_after_playback(active.index);
        if erase {
            match hw.erase(active.index) {
                Ok(()) => self.state.lock().slots.release(active.index),
                Err(e) => warn!(index = active.index, "Failed to erase custom waveform: {e}"),
            }
        }
        if let Err(e) = hw.reset_trigger(active.index) {
            warn!(index = active.index, "Failed to reset trigger: {e}");
        }

        let mut state = self.state.lock();
        let stopping = state.stopping == Some(active.generation);
        if state
            .active
            .as_ref()
            .is_some_and(|current| current.generation == active.generation)
        {
            state.active = None;
            if !stopping {
                state.phase = PlaybackPhase::Idle;
            }
        }
        if stopping || end == WaitEnd::Cancelled {
            EffectOutcome::Interrupted
        } else {
            EffectOutcome::Completed
        }
    }
}
