//! PWLE payload layout and request validation.

use insta::assert_snapshot;
use vibrator_calibration::FrequencyMap;
use vibrator_effects::Braking;
use vibrator_errors::HapticError;
use vibrator_test_helpers::prelude::*;
use vibrator_waveform::{
    ActivePwle, BrakingPwle, COMPOSE_PWLE_SIZE_MAX, PrimitivePwle, compose_pwle,
};

const NO_BRAKING: &[Braking] = &[Braking::None];

fn steady(amplitude: f32, frequency: f32, duration_ms: i32) -> PrimitivePwle {
    PrimitivePwle::Active(ActivePwle::steady(amplitude, frequency, duration_ms))
}

fn braking(braking: Braking, duration_ms: i32) -> PrimitivePwle {
    PrimitivePwle::Braking(BrakingPwle {
        braking,
        duration_ms,
    })
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .chunks(4)
        .map(|word| word.iter().map(|b| format!("{b:02x}")).collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

#[test]
fn steady_segment_starts_with_a_ramp_section() -> TestResult {
    let composed = compose_pwle(&FrequencyMap::flat(), NO_BRAKING, &[steady(0.5, 200.0, 10)])?;
    assert_eq!(composed.duration_ms, 16);
    assert_snapshot!(hex(composed.bytes()), @"00800080 00000000 00200004 00003201 00000284 00003201 00000000");
    Ok(())
}

#[test]
fn continuing_segment_skips_the_ramp() -> TestResult {
    let map = FrequencyMap::flat();
    let one = compose_pwle(&map, NO_BRAKING, &[steady(0.5, 200.0, 10)])?;
    let two = compose_pwle(
        &map,
        NO_BRAKING,
        &[steady(0.5, 200.0, 10), steady(0.5, 200.0, 10)],
    )?;
    let jump = compose_pwle(
        &map,
        NO_BRAKING,
        &[steady(0.5, 200.0, 10), steady(0.2, 200.0, 10)],
    )?;
    // sections are 48 bits: two sections per pair of words
    assert!(two.bytes().len() < jump.bytes().len());
    assert!(one.bytes().len() < two.bytes().len());
    Ok(())
}

#[test]
fn braking_resets_the_end_point() -> TestResult {
    let composed = compose_pwle(
        &FrequencyMap::flat(),
        NO_BRAKING,
        &[steady(0.5, 200.0, 10), braking(Braking::None, 20), steady(0.5, 200.0, 10)],
    )?;
    assert_eq!(composed.duration_ms, 10 + 20 + 10 + 6);
    // 2 + 2 + 2 sections: nsections 6 split across header bytes 7 and 9
    assert_eq!(composed.bytes().get(7).map(|b| b & 0x0F), Some(0));
    assert_eq!(composed.bytes().get(9).map(|b| b >> 4), Some(6));
    Ok(())
}

#[test]
fn amplitude_one_is_capped_not_rejected() -> TestResult {
    let composed = compose_pwle(&FrequencyMap::flat(), NO_BRAKING, &[steady(1.0, 150.0, 5)])?;
    assert_eq!(composed.duration_ms, 11);
    Ok(())
}

#[test]
fn out_of_bounds_segments_are_illegal() {
    let map = FrequencyMap::flat();
    for segments in [
        vec![],
        vec![steady(0.5, 200.0, 16_384)],
        vec![steady(0.5, 200.0, -1)],
        vec![steady(1.1, 200.0, 10)],
        vec![steady(-0.1, 200.0, 10)],
        vec![steady(0.5, 0.5, 10)],
        vec![steady(0.5, 1000.5, 10)],
        vec![braking(Braking::Clab, 10)],
        vec![braking(Braking::None, 16_384)],
        vec![steady(0.5, 200.0, 1); COMPOSE_PWLE_SIZE_MAX + 1],
    ] {
        let result = compose_pwle(&map, NO_BRAKING, &segments);
        assert!(
            matches!(result, Err(HapticError::IllegalArgument(_))),
            "{segments:?} accepted"
        );
    }
}

#[test]
fn too_many_sections_is_illegal() {
    // alternating amplitudes force a ramp section before every segment
    let segments: Vec<PrimitivePwle> = (0..64)
        .map(|i| steady(if i % 2 == 0 { 0.2 } else { 0.4 }, 100.0, 1))
        .collect();
    let result = compose_pwle(&FrequencyMap::flat(), NO_BRAKING, &segments);
    assert!(matches!(result, Err(HapticError::IllegalArgument(_))));
}

#[test]
fn frequency_bounds_follow_the_map() -> TestResult {
    let narrow = FrequencyMap {
        minimum_hz: 100.0,
        resolution_hz: 1.0,
        bandwidth_amplitude: vec![1.0; 101],
    };
    assert!(compose_pwle(&narrow, NO_BRAKING, &[steady(0.5, 200.0, 10)]).is_ok());
    assert!(compose_pwle(&narrow, NO_BRAKING, &[steady(0.5, 201.0, 10)]).is_err());
    assert!(compose_pwle(&narrow, NO_BRAKING, &[steady(0.5, 99.0, 10)]).is_err());
    Ok(())
}
