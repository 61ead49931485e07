use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::io;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use vibrator_hw::{
    AlsaDevice, FfEffect, FfWaveform, HwApi, HwError, HwResult, VibeState,
};

/// First index the fake hands out for uploaded OWT effects.
const FIRST_OWT_INDEX: u32 = 14;

/// A recorded hardware call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HwCall {
    SetF0(String),
    SetF0Offset(u32),
    SetRedc(String),
    SetQ(String),
    SetF0CompEnable(bool),
    SetRedcCompEnable(bool),
    SetMinOnOffInterval(u32),
    SetFfGain(u16),
    SetFfEffect {
        id: i16,
        replay_length_ms: u16,
        trigger_button: u16,
    },
    SetFfPlay {
        index: u32,
        on: bool,
    },
    UploadOwt {
        index: u32,
        len: usize,
    },
    EraseOwt(u32),
    SetHapticPcmAmp(bool),
}

struct Playback {
    index: u32,
    until: Option<Instant>,
}

struct FakeState {
    calls: Vec<HwCall>,
    failures: HashSet<&'static str>,
    owt_capacity: u32,
    owt_slots: BTreeMap<u32, usize>,
    peak_owt_slots: usize,
    next_physical_id: i16,
    playing: Option<Playback>,
    armed: Option<u32>,
    play_duration: Option<Duration>,
    has_owt: bool,
    alsa: Option<AlsaDevice>,
}

/// Fake driver for one actuator.
pub struct FakeHwApi {
    state: Mutex<FakeState>,
}

impl FakeHwApi {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                calls: Vec::new(),
                failures: HashSet::new(),
                owt_capacity: 4096,
                owt_slots: BTreeMap::new(),
                peak_owt_slots: 0,
                next_physical_id: 0,
                playing: None,
                armed: None,
                play_duration: Some(Duration::from_millis(5)),
                has_owt: true,
                alsa: Some(AlsaDevice { card: 0, device: 4 }),
            }),
        }
    }

    /// Limit OWT space to `bytes`.
    pub fn with_owt_capacity(self, bytes: u32) -> Self {
        self.state.lock().owt_capacity = bytes;
        self
    }

    /// Report no OWT free space attribute at all.
    pub fn without_owt(self) -> Self {
        self.state.lock().has_owt = false;
        self
    }

    pub fn without_alsa(self) -> Self {
        self.state.lock().alsa = None;
        self
    }

    /// Make playback last `duration`; `None` plays until stopped.
    pub fn with_play_duration(self, duration: Option<Duration>) -> Self {
        self.state.lock().play_duration = duration;
        self
    }

    /// Make every call named `operation` fail.
    pub fn fail_on(&self, operation: &'static str) {
        self.state.lock().failures.insert(operation);
    }

    pub fn clear_failures(&self) {
        self.state.lock().failures.clear();
    }

    pub fn calls(&self) -> Vec<HwCall> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    pub fn count_calls(&self, pred: impl Fn(&HwCall) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn upload_count(&self) -> usize {
        self.count_calls(|c| matches!(c, HwCall::UploadOwt { .. }))
    }

    pub fn erase_count(&self) -> usize {
        self.count_calls(|c| matches!(c, HwCall::EraseOwt(_)))
    }

    /// Gains written so far, oldest first.
    pub fn gains(&self) -> Vec<u16> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                HwCall::SetFfGain(g) => Some(*g),
                _ => None,
            })
            .collect()
    }

    /// OWT slots currently held.
    pub fn owt_slots(&self) -> usize {
        self.state.lock().owt_slots.len()
    }

    /// Largest number of OWT slots held at once.
    pub fn peak_owt_slots(&self) -> usize {
        self.state.lock().peak_owt_slots
    }

    pub fn is_playing(&self) -> bool {
        let mut state = self.state.lock();
        Self::refresh(&mut state);
        state.playing.is_some()
    }

    /// Simulate the GPIO rising edge: start the armed effect, if any.
    pub fn gpio_edge(&self) {
        let mut state = self.state.lock();
        if let Some(index) = state.armed {
            let until = state.play_duration.map(|d| Instant::now() + d);
            state.playing = Some(Playback { index, until });
        }
    }

    fn refresh(state: &mut FakeState) {
        let finished = state
            .playing
            .as_ref()
            .and_then(|p| p.until)
            .is_some_and(|until| Instant::now() >= until);
        if finished {
            state.playing = None;
        }
    }

    fn record(&self, operation: &'static str, call: HwCall) -> HwResult<()> {
        let mut state = self.state.lock();
        if state.failures.contains(operation) {
            return Err(HwError::io(operation, io::Error::other("injected failure")));
        }
        state.calls.push(call);
        Ok(())
    }

    fn check(&self, operation: &'static str) -> HwResult<()> {
        if self.state.lock().failures.contains(operation) {
            return Err(HwError::io(operation, io::Error::other("injected failure")));
        }
        Ok(())
    }

    fn owt_used(state: &FakeState) -> u32 {
        state.owt_slots.values().map(|len| *len as u32).sum()
    }
}

impl Default for FakeHwApi {
    fn default() -> Self {
        Self::new()
    }
}

impl HwApi for FakeHwApi {
    fn set_f0(&self, value: &str) -> HwResult<()> {
        self.record("set_f0", HwCall::SetF0(value.to_string()))
    }

    fn set_f0_offset(&self, value: u32) -> HwResult<()> {
        self.record("set_f0_offset", HwCall::SetF0Offset(value))
    }

    fn set_redc(&self, value: &str) -> HwResult<()> {
        self.record("set_redc", HwCall::SetRedc(value.to_string()))
    }

    fn set_q(&self, value: &str) -> HwResult<()> {
        self.record("set_q", HwCall::SetQ(value.to_string()))
    }

    fn effect_count(&self) -> HwResult<u32> {
        self.check("effect_count")?;
        let state = self.state.lock();
        Ok(state.next_physical_id as u32 + state.owt_slots.len() as u32)
    }

    fn poll_vibe_state(&self, target: VibeState, timeout: Option<Duration>) -> HwResult<bool> {
        self.check("poll_vibe_state")?;
        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            {
                let mut state = self.state.lock();
                Self::refresh(&mut state);
                let current = if state.playing.is_some() {
                    VibeState::Haptic
                } else {
                    VibeState::Stopped
                };
                if current == target {
                    return Ok(true);
                }
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Ok(false);
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    fn has_owt_free_space(&self) -> bool {
        self.state.lock().has_owt
    }

    fn owt_free_space(&self) -> HwResult<u32> {
        self.check("owt_free_space")?;
        let state = self.state.lock();
        Ok(state.owt_capacity.saturating_sub(Self::owt_used(&state)))
    }

    fn set_f0_comp_enable(&self, enable: bool) -> HwResult<()> {
        self.record("set_f0_comp_enable", HwCall::SetF0CompEnable(enable))
    }

    fn set_redc_comp_enable(&self, enable: bool) -> HwResult<()> {
        self.record("set_redc_comp_enable", HwCall::SetRedcCompEnable(enable))
    }

    fn set_min_on_off_interval(&self, interval_us: u32) -> HwResult<()> {
        self.record(
            "set_min_on_off_interval",
            HwCall::SetMinOnOffInterval(interval_us),
        )
    }

    fn set_ff_gain(&self, gain: u16) -> HwResult<()> {
        self.record("set_ff_gain", HwCall::SetFfGain(gain))
    }

    fn set_ff_effect(&self, effect: &mut FfEffect, replay_length_ms: u16) -> HwResult<()> {
        self.check("set_ff_effect")?;
        let mut state = self.state.lock();
        if effect.id < 0 {
            effect.id = state.next_physical_id;
            state.next_physical_id += 1;
        }
        effect.replay_length_ms = replay_length_ms;
        state.armed = (effect.trigger_button != 0).then_some(effect.id as u32);
        state.calls.push(HwCall::SetFfEffect {
            id: effect.id,
            replay_length_ms,
            trigger_button: effect.trigger_button,
        });
        Ok(())
    }

    fn set_ff_play(&self, index: u32, on: bool) -> HwResult<()> {
        self.record("set_ff_play", HwCall::SetFfPlay { index, on })?;
        let mut state = self.state.lock();
        if on {
            let until = state.play_duration.map(|d| Instant::now() + d);
            state.playing = Some(Playback { index, until });
        } else if state.playing.as_ref().is_some_and(|p| p.index == index) {
            state.playing = None;
        }
        Ok(())
    }

    fn haptic_alsa_device(&self) -> Option<AlsaDevice> {
        self.state.lock().alsa
    }

    fn set_haptic_pcm_amp(&self, enable: bool, _device: AlsaDevice) -> HwResult<()> {
        self.record("set_haptic_pcm_amp", HwCall::SetHapticPcmAmp(enable))
    }

    fn upload_owt_effect(&self, payload: &[u8], effect: &mut FfEffect) -> HwResult<u32> {
        self.check("upload_owt_effect")?;
        let mut state = self.state.lock();
        let free = state.owt_capacity.saturating_sub(Self::owt_used(&state));
        if payload.len() as u32 > free {
            return Err(HwError::io(
                "upload_owt_effect",
                io::Error::new(io::ErrorKind::OutOfMemory, "no OWT space"),
            ));
        }
        let mut index = FIRST_OWT_INDEX;
        while state.owt_slots.contains_key(&index) {
            index += 1;
        }
        state.owt_slots.insert(index, payload.len());
        state.peak_owt_slots = state.peak_owt_slots.max(state.owt_slots.len());
        effect.id = index as i16;
        effect.waveform = FfWaveform::Owt(payload.to_vec());
        state.calls.push(HwCall::UploadOwt {
            index,
            len: payload.len(),
        });
        Ok(index)
    }

    fn erase_owt_effect(&self, index: u32, effects: &mut [FfEffect]) -> HwResult<()> {
        self.check("erase_owt_effect")?;
        let mut state = self.state.lock();
        if state.owt_slots.remove(&index).is_none() {
            return Err(HwError::rejected(
                "erase_owt_effect",
                format!("no OWT effect at index {index}"),
            ));
        }
        if let Some(entry) = effects.get_mut(index as usize) {
            *entry = FfEffect::empty();
        }
        state.calls.push(HwCall::EraseOwt(index));
        Ok(())
    }

    fn debug(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        let state = self.state.lock();
        writeln!(out, "FakeHwApi:")?;
        writeln!(out, "  OWT slots: {}", state.owt_slots.len())?;
        writeln!(
            out,
            "  OWT used: {}/{}",
            Self::owt_used(&state),
            state.owt_capacity
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owt_accounting() {
        let api = FakeHwApi::new().with_owt_capacity(100);
        let mut effect = FfEffect::empty();
        let index = api.upload_owt_effect(&[0; 60], &mut effect).unwrap();
        assert_eq!(index, FIRST_OWT_INDEX);
        assert_eq!(api.owt_free_space().unwrap(), 40);
        assert!(api.upload_owt_effect(&[0; 60], &mut effect).is_err());

        let mut table = vec![FfEffect::empty(); 16];
        api.erase_owt_effect(index, &mut table).unwrap();
        assert_eq!(api.owt_free_space().unwrap(), 100);
        assert!(api.erase_owt_effect(index, &mut table).is_err());
    }

    #[test]
    fn test_playback_ends() {
        let api = FakeHwApi::new().with_play_duration(Some(Duration::from_millis(2)));
        api.set_ff_play(2, true).unwrap();
        assert!(api.is_playing());
        assert!(
            api.poll_vibe_state(VibeState::Stopped, Some(Duration::from_millis(200)))
                .unwrap()
        );
    }

    #[test]
    fn test_injected_failure() {
        let api = FakeHwApi::new();
        api.fail_on("set_ff_gain");
        assert!(api.set_ff_gain(50).is_err());
        assert!(api.gains().is_empty());
    }
}
