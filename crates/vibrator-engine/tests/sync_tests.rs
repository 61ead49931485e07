//! Dual-actuator synchronization tests
//!
//! These tests verify that:
//! 1. With a working sync line both actuators start from one rising edge
//! 2. A staging failure starts neither actuator
//! 3. Without a working sync line neither actuator is ever started
//! 4. Uploads land in the same slot on every actuator or nowhere
//! 5. A slot erased on only some actuators is finished off by the next request

use std::sync::Arc;

use vibrator_engine::prelude::*;
use vibrator_engine::{GPIO_TRIGGER_BUTTON, TimingConfig};
use vibrator_hw::HwGpio;
use vibrator_test_helpers::prelude::*;

struct Pair {
    primary: Arc<FakeHwApi>,
    secondary: Arc<FakeHwApi>,
    gpio: Arc<FakeHwGpio>,
    vibrator: Vibrator,
}

fn config() -> VibratorConfig {
    VibratorConfig {
        timing: TimingConfig {
            completion_guard_ms: 5_000,
            ..TimingConfig::default()
        },
        ..VibratorConfig::default()
    }
}

fn pair_with(primary: FakeHwApi, secondary: FakeHwApi, gpio: FakeHwGpio, config: VibratorConfig) -> Pair {
    let primary = Arc::new(primary);
    let secondary = Arc::new(secondary);
    let gpio = Arc::new(gpio);
    gpio.connect(primary.clone());
    gpio.connect(secondary.clone());

    let line: Arc<dyn HwGpio> = gpio.clone();
    let vibrator = must(Vibrator::new(
        vec![
            ActuatorHandles::new(primary.clone(), Arc::new(FakeHwCal::calibrated())),
            ActuatorHandles::new(
                secondary.clone(),
                Arc::new(FakeHwCal::calibrated().with_f0_sync_offset(0x1234)),
            ),
        ],
        Some(line),
        config,
    ));
    Pair {
        primary,
        secondary,
        gpio,
        vibrator,
    }
}

fn pair(gpio: FakeHwGpio) -> Pair {
    pair_with(FakeHwApi::new(), FakeHwApi::new(), gpio, config())
}

fn starts(api: &FakeHwApi) -> usize {
    api.count_calls(|c| matches!(c, HwCall::SetFfPlay { on: true, .. }))
}

fn last_trigger_button(api: &FakeHwApi, id: i16) -> Option<u16> {
    api.calls().iter().rev().find_map(|c| match c {
        HwCall::SetFfEffect {
            id: effect,
            trigger_button,
            ..
        } if *effect == id => Some(*trigger_button),
        _ => None,
    })
}

#[test]
fn test_synced_perform_uses_one_edge() -> TestResult {
    let mut pair = pair(FakeHwGpio::new());
    let (callback, outcome) = completion::channel();

    pair.vibrator.perform(Effect::Click, EffectStrength::Strong, callback)?;

    assert_eq!(pair.gpio.rising_edges(), 1);
    for api in [&pair.primary, &pair.secondary] {
        assert_eq!(
            api.count_calls(|c| matches!(
                c,
                HwCall::SetFfEffect { id: 2, trigger_button, .. } if *trigger_button == (GPIO_TRIGGER_BUTTON | 2)
            )),
            1
        );
        assert_eq!(starts(api), 0);
        assert_eq!(api.gains().last(), Some(&60));
    }

    assert_eq!(outcome.blocking_recv(), Ok(EffectOutcome::Completed));
    assert!(!pair.gpio.level());
    assert_eq!(last_trigger_button(&pair.primary, 2), Some(0));
    assert_eq!(last_trigger_button(&pair.secondary, 2), Some(0));
    Ok(())
}

#[test]
fn test_synced_compose_uploads_to_both() -> TestResult {
    let mut pair = pair(FakeHwGpio::new());
    let sequence = [CompositeEffect::new(CompositePrimitive::Click, 0.5, 0)];

    let (callback, outcome) = completion::channel();
    pair.vibrator.compose(&sequence, callback)?;

    assert_eq!(pair.primary.upload_count(), 1);
    assert_eq!(pair.secondary.upload_count(), 1);
    assert_eq!(pair.gpio.rising_edges(), 1);
    assert_eq!(
        pair.secondary
            .count_calls(|c| matches!(c, HwCall::SetFfEffect { id: 14, trigger_button: 0x900E, .. })),
        1
    );

    assert_eq!(outcome.blocking_recv(), Ok(EffectOutcome::Completed));
    assert_eq!(pair.primary.owt_slots(), 0);
    assert_eq!(pair.secondary.owt_slots(), 0);
    Ok(())
}

#[test]
fn test_edge_failure_starts_nothing() {
    let mut pair = pair(FakeHwGpio::new());
    pair.gpio.fail_output(true);

    let result = pair
        .vibrator
        .perform(Effect::Click, EffectStrength::Light, completion::noop());

    assert!(matches!(result, Err(HapticError::HardwareIo { .. })));
    assert_eq!(pair.gpio.rising_edges(), 0);
    for api in [&pair.primary, &pair.secondary] {
        assert!(!api.is_playing());
        assert_eq!(last_trigger_button(api, 2), Some(0));
    }
    assert!(pair.vibrator.active_effect().is_none());
}

#[test]
fn test_arm_failure_disarms_primary() {
    let mut pair = pair(FakeHwGpio::new());
    pair.secondary.fail_on("set_ff_effect");

    let result = pair
        .vibrator
        .perform(Effect::Click, EffectStrength::Light, completion::noop());

    assert!(matches!(result, Err(HapticError::HardwareIo { .. })));
    assert_eq!(pair.gpio.rising_edges(), 0);
    assert!(!pair.primary.is_playing());
    assert_eq!(last_trigger_button(&pair.primary, 2), Some(0));
}

#[test]
fn test_arm_failure_erases_both_slots() {
    let mut pair = pair(FakeHwGpio::new());
    pair.secondary.fail_on("set_ff_effect");
    let sequence = [CompositeEffect::new(CompositePrimitive::Click, 0.5, 0)];

    let result = pair.vibrator.compose(&sequence, completion::noop());

    assert!(matches!(result, Err(HapticError::HardwareIo { .. })));
    assert_eq!(pair.primary.owt_slots(), 0);
    assert_eq!(pair.secondary.owt_slots(), 0);
}

#[test]
fn test_broken_line_refuses_dual_playback() {
    let mut pair = pair(FakeHwGpio::broken());
    let sequence = [CompositeEffect::new(CompositePrimitive::Click, 0.5, 0)];

    let performed = pair
        .vibrator
        .perform(Effect::Click, EffectStrength::Medium, completion::noop());
    let composed = pair.vibrator.compose(&sequence, completion::noop());

    assert!(matches!(performed, Err(HapticError::HardwareIo { .. })));
    assert!(matches!(composed, Err(HapticError::HardwareIo { .. })));
    for api in [&pair.primary, &pair.secondary] {
        assert_eq!(starts(api), 0);
        assert_eq!(api.upload_count(), 0);
        assert!(api.gains().is_empty());
    }
    assert!(pair.vibrator.active_effect().is_none());
}

#[test]
fn test_failing_secondary_never_leaves_primary_playing_alone() {
    let mut pair = pair(FakeHwGpio::broken());
    pair.secondary.fail_on("set_ff_play");

    let result = pair
        .vibrator
        .perform(Effect::Click, EffectStrength::Light, completion::noop());

    assert!(matches!(result, Err(HapticError::HardwareIo { .. })));
    assert_eq!(starts(&pair.primary), 0);
    assert_eq!(starts(&pair.secondary), 0);
    assert!(!pair.primary.is_playing());
}

#[test]
fn test_missing_line_refuses_dual_playback() {
    let primary = Arc::new(FakeHwApi::new());
    let secondary = Arc::new(FakeHwApi::new());
    let mut vibrator = must(Vibrator::new(
        vec![
            ActuatorHandles::new(primary.clone(), Arc::new(FakeHwCal::calibrated())),
            ActuatorHandles::new(secondary.clone(), Arc::new(FakeHwCal::calibrated())),
        ],
        None,
        config(),
    ));

    let result = vibrator.on(100, completion::noop());

    assert!(matches!(result, Err(HapticError::HardwareIo { .. })));
    assert_eq!(starts(&primary), 0);
    assert_eq!(starts(&secondary), 0);
    assert!(vibrator.dump_string().contains("secondary actuator:"));
}

#[test]
fn test_erase_failure_on_one_actuator_recovers() -> TestResult {
    let mut pair = pair(FakeHwGpio::new());
    let sequence = [CompositeEffect::new(CompositePrimitive::Click, 0.5, 0)];
    pair.secondary.fail_on("erase_owt_effect");

    let (callback, outcome) = completion::channel();
    pair.vibrator.compose(&sequence, callback)?;
    assert_eq!(outcome.blocking_recv(), Ok(EffectOutcome::Completed));
    assert_eq!(pair.primary.owt_slots(), 0);
    assert_eq!(pair.secondary.owt_slots(), 1);

    pair.secondary.clear_failures();
    for _ in 0..3 {
        let (callback, outcome) = completion::channel();
        pair.vibrator.compose(&sequence, callback)?;
        assert_eq!(outcome.blocking_recv(), Ok(EffectOutcome::Completed));
    }

    for api in [&pair.primary, &pair.secondary] {
        assert_eq!(api.upload_count(), 4);
        assert_eq!(api.owt_slots(), 0);
        assert!(api.peak_owt_slots() <= 1);
    }
    assert!(pair.vibrator.monitor().held_slot().is_none());
    Ok(())
}

#[test]
fn test_upload_failure_rolls_back_primary() {
    let mut pair = pair(FakeHwGpio::new());
    pair.secondary.fail_on("upload_owt_effect");
    let sequence = [CompositeEffect::new(CompositePrimitive::Click, 0.5, 0)];

    let result = pair.vibrator.compose(&sequence, completion::noop());

    assert!(matches!(result, Err(HapticError::HardwareIo { .. })));
    assert_eq!(pair.primary.upload_count(), 1);
    assert_eq!(pair.primary.erase_count(), 1);
    assert_eq!(pair.primary.owt_slots(), 0);
    assert_eq!(pair.gpio.rising_edges(), 0);
}

#[test]
fn test_secondary_space_checked_before_upload() {
    let mut pair = pair_with(
        FakeHwApi::new(),
        FakeHwApi::new().with_owt_capacity(4),
        FakeHwGpio::new(),
        config(),
    );
    let sequence = [CompositeEffect::new(CompositePrimitive::Click, 0.5, 0)];

    let result = pair.vibrator.compose(&sequence, completion::noop());

    assert!(matches!(result, Err(HapticError::ResourceExhausted { .. })));
    assert_eq!(pair.primary.upload_count(), 0);
}

#[test]
fn test_on_writes_each_frequency_offset() -> TestResult {
    let mut pair = pair_with(
        FakeHwApi::new().with_play_duration(None),
        FakeHwApi::new().with_play_duration(None),
        FakeHwGpio::new(),
        config(),
    );

    pair.vibrator.on(100, completion::noop())?;
    assert!(pair.secondary.calls().contains(&HwCall::SetF0Offset(0x1234)));
    assert!(pair.primary.calls().contains(&HwCall::SetF0Offset(0)));

    pair.vibrator.off()?;
    let last_offset = pair
        .secondary
        .calls()
        .into_iter()
        .rev()
        .find(|c| matches!(c, HwCall::SetF0Offset(_)));
    assert_eq!(last_offset, Some(HwCall::SetF0Offset(0)));
    Ok(())
}

#[test]
fn test_dump_lists_both_actuators() {
    let pair = pair(FakeHwGpio::new());
    let dump = pair.vibrator.dump_string();
    assert!(dump.contains("  primary actuator:"));
    assert!(dump.contains("  secondary actuator:"));
    assert!(dump.contains("    secondary: 0x001234"));
    assert!(dump.contains("  GPIO sync: true"));
    assert!(dump.contains("FakeHwGpio:"));
}
