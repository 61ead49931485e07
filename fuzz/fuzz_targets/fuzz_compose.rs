//! Fuzzes composite primitive sequence validation and packing.
//!
//! Run with:
//!   cargo +nightly fuzz run fuzz_compose
#![no_main]
use libfuzzer_sys::fuzz_target;
use vibrator_calibration::{ActuatorRole, CalibrationProfile};
use vibrator_effects::{CompositePrimitive, EffectCatalog};
use vibrator_test_helpers::fakes::FakeHwCal;
use vibrator_waveform::{CompositeEffect, FF_CUSTOM_DATA_LEN_MAX_COMP, compose_primitives};

fuzz_target!(|data: &[u8]| {
    let Ok(profile) = CalibrationProfile::load(&FakeHwCal::calibrated(), ActuatorRole::Primary)
    else {
        return;
    };
    let catalog = EffectCatalog::new(&profile);
    // 7 bytes per entry: primitive, scale (f32 bits), delay (i16)
    let composite: Vec<CompositeEffect> = data
        .chunks_exact(7)
        .filter_map(|raw| {
            let primitive = CompositePrimitive::try_from(i32::from(raw[0] % 10)).ok()?;
            let scale = f32::from_le_bytes([raw[1], raw[2], raw[3], raw[4]]);
            let delay = i32::from(i16::from_le_bytes([raw[5], raw[6]]));
            Some(CompositeEffect::new(primitive, scale, delay))
        })
        .collect();
    if let Ok(composed) = compose_primitives(&catalog, &composite) {
        assert!(composed.bytes().len() <= FF_CUSTOM_DATA_LEN_MAX_COMP);
    }
});
