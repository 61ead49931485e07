//! Fuzzes PWLE segment validation and packing.
//!
//! Run with:
//!   cargo +nightly fuzz run fuzz_pwle
#![no_main]
use libfuzzer_sys::fuzz_target;
use vibrator_calibration::FrequencyMap;
use vibrator_effects::Braking;
use vibrator_waveform::{
    ActivePwle, BrakingPwle, FF_CUSTOM_DATA_LEN_MAX_PWLE, PrimitivePwle, compose_pwle,
};

fn f32_at(raw: &[u8], at: usize) -> f32 {
    match raw.get(at..at + 4) {
        Some(&[a, b, c, d]) => f32::from_le_bytes([a, b, c, d]),
        _ => 0.0,
    }
}

fuzz_target!(|data: &[u8]| {
    // 19 bytes per segment: tag, four f32 values, i16 duration
    let segments: Vec<PrimitivePwle> = data
        .chunks_exact(19)
        .map(|raw| {
            let duration = i32::from(i16::from_le_bytes([raw[17], raw[18]]));
            if raw[0] & 1 == 0 {
                PrimitivePwle::Active(ActivePwle {
                    start_amplitude: f32_at(raw, 1),
                    start_frequency: f32_at(raw, 5),
                    end_amplitude: f32_at(raw, 9),
                    end_frequency: f32_at(raw, 13),
                    duration_ms: duration,
                })
            } else {
                let braking = if raw[0] & 2 == 0 { Braking::None } else { Braking::Clab };
                PrimitivePwle::Braking(BrakingPwle {
                    braking,
                    duration_ms: duration,
                })
            }
        })
        .collect();
    if let Ok(composed) = compose_pwle(&FrequencyMap::flat(), &[Braking::None], &segments) {
        assert!(composed.bytes().len() <= FF_CUSTOM_DATA_LEN_MAX_PWLE);
    }
});
