//! Property-based tests for request validation and playback interleaving

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use proptest::prelude::*;
use vibrator_engine::prelude::*;
use vibrator_test_helpers::prelude::*;

fn vibrator() -> (Arc<FakeHwApi>, Vibrator) {
    vibrator_playing_for(Some(Duration::from_millis(5)))
}

fn vibrator_playing_for(play: Option<Duration>) -> (Arc<FakeHwApi>, Vibrator) {
    let api = Arc::new(FakeHwApi::new().with_play_duration(play));
    let vibrator = must(Vibrator::new(
        vec![ActuatorHandles::new(api.clone(), Arc::new(FakeHwCal::calibrated()))],
        None,
        VibratorConfig::default(),
    ));
    (api, vibrator)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_amplitude_gain_within_long_table(amplitude in 0.001_f32..=1.0) {
        let (api, mut vibrator) = vibrator();
        prop_assert!(vibrator.set_amplitude(amplitude).is_ok());
        let gain = api.gains().last().copied();
        let expected = (amplitude * 90.0).round() as u16;
        prop_assert_eq!(gain, Some(expected));
        prop_assert!(expected <= 90);
    }

    #[test]
    fn prop_amplitude_above_one_rejected(amplitude in 1.0001_f32..1000.0) {
        let (api, mut vibrator) = vibrator();
        let result = vibrator.set_amplitude(amplitude);
        prop_assert!(matches!(result, Err(HapticError::IllegalArgument(_))));
        prop_assert!(api.gains().is_empty());
    }

    #[test]
    fn prop_out_of_range_duration_never_plays(
        duration in prop_oneof![i32::MIN..0, 65_536_i32..=i32::MAX]
    ) {
        let (api, mut vibrator) = vibrator();
        let result = vibrator.on(duration, completion::noop());
        prop_assert!(matches!(result, Err(HapticError::IllegalArgument(_))));
        prop_assert_eq!(
            api.count_calls(|c| matches!(c, HwCall::SetFfPlay { .. })),
            0
        );
    }

    #[test]
    fn prop_primitive_durations_are_bounded(raw in 0_i32..9) {
        let (_api, vibrator) = vibrator();
        let primitive = CompositePrimitive::try_from(raw).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let duration = vibrator.primitive_duration(primitive).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert!(duration <= 1_000);
    }
}

#[derive(Debug, Clone)]
enum Step {
    On(i32),
    Perform(Effect, EffectStrength),
    Compose(i32),
    Pwle(i32),
    Off,
}

fn step() -> impl Strategy<Value = Step> {
    let effects = vec![
        Effect::TextureTick,
        Effect::Tick,
        Effect::Click,
        Effect::HeavyClick,
        Effect::DoubleClick,
    ];
    let strengths = vec![EffectStrength::Light, EffectStrength::Medium, EffectStrength::Strong];
    prop_oneof![
        (1_i32..200).prop_map(Step::On),
        (prop::sample::select(effects), prop::sample::select(strengths))
            .prop_map(|(effect, strength)| Step::Perform(effect, strength)),
        (0_i32..50).prop_map(Step::Compose),
        (1_i32..50).prop_map(Step::Pwle),
        Just(Step::Off),
    ]
}

fn counted(counter: &Arc<AtomicUsize>) -> CompletionCallback {
    let counter = Arc::clone(counter);
    Box::new(move |_: EffectOutcome| {
        counter.fetch_add(1, Ordering::SeqCst);
    })
}

fn run(vibrator: &mut Vibrator, step: &Step, callback: CompletionCallback) -> Result<bool> {
    match step {
        Step::On(ms) => vibrator.on(*ms, callback).map(|()| true),
        Step::Perform(effect, strength) => vibrator.perform(*effect, *strength, callback).map(|_| true),
        Step::Compose(delay) => {
            let sequence = [
                CompositeEffect::new(CompositePrimitive::Click, 0.7, 0),
                CompositeEffect::new(CompositePrimitive::LightTick, 0.4, *delay),
            ];
            vibrator.compose(&sequence, callback).map(|_| true)
        }
        Step::Pwle(ms) => {
            let segments = [PrimitivePwle::Active(ActivePwle::steady(0.5, 150.0, *ms))];
            vibrator.compose_pwle(&segments, callback).map(|_| true)
        }
        Step::Off => vibrator.off().map(|()| false),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_interleaved_requests_keep_one_active_effect(
        steps in prop::collection::vec(step(), 1..10),
        play_until_stopped in any::<bool>(),
    ) {
        let play = if play_until_stopped { None } else { Some(Duration::from_millis(3)) };
        let (api, mut vibrator) = vibrator_playing_for(play);
        let monitor = vibrator.monitor();
        let mut counters: Vec<Arc<AtomicUsize>> = Vec::new();

        for step in &steps {
            let counter = Arc::new(AtomicUsize::new(0));
            let triggered = run(&mut vibrator, step, counted(&counter))
                .map_err(|e| TestCaseError::fail(format!("{step:?}: {e}")))?;
            if triggered {
                counters.push(counter);
            }

            // Every effect but the newest has reported by the time a call returns.
            let outstanding = counters.len().saturating_sub(1);
            for earlier in counters.iter().take(outstanding) {
                prop_assert_eq!(earlier.load(Ordering::SeqCst), 1);
            }
            // The active effect is cleared before its callback runs.
            let newest_fired = counters.last().is_some_and(|c| c.load(Ordering::SeqCst) == 1);
            let active = monitor.active();
            prop_assert!(!(newest_fired && active.is_some()));
            prop_assert!(api.peak_owt_slots() <= 1);
        }

        vibrator.off().map_err(|e| TestCaseError::fail(e.to_string()))?;
        std::thread::sleep(Duration::from_millis(10));
        for counter in &counters {
            prop_assert_eq!(counter.load(Ordering::SeqCst), 1);
        }
        prop_assert!(monitor.active().is_none());
        prop_assert!(api.owt_slots() <= 1);
        prop_assert!(api.peak_owt_slots() <= 1);
    }
}
