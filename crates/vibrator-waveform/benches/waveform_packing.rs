//! Benchmarks for waveform payload construction.
//!
//! Run with: cargo bench --bench waveform_packing

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use vibrator_calibration::{ActuatorRole, CalibrationProfile, FrequencyMap};
use vibrator_effects::{Braking, CompositePrimitive, EffectCatalog};
use vibrator_test_helpers::prelude::*;
use vibrator_waveform::{ActivePwle, CompositeEffect, PrimitivePwle, compose_primitives, compose_pwle};

fn bench_compose_max_size(c: &mut Criterion) {
    let profile = must(CalibrationProfile::load(
        &FakeHwCal::calibrated(),
        ActuatorRole::Primary,
    ));
    let catalog = EffectCatalog::new(&profile);
    let composite: Vec<CompositeEffect> = (0..254)
        .map(|i| CompositeEffect::new(CompositePrimitive::Click, (i % 10) as f32 / 10.0, i % 50))
        .collect();

    let mut group = c.benchmark_group("compose");
    group.throughput(Throughput::Elements(composite.len() as u64));
    group.bench_function("254_primitives", |b| {
        b.iter(|| std::hint::black_box(compose_primitives(&catalog, std::hint::black_box(&composite))));
    });
    group.finish();
}

fn bench_pwle_ramps(c: &mut Criterion) {
    let map = FrequencyMap::flat();
    let segments: Vec<PrimitivePwle> = (0..63)
        .map(|i| {
            PrimitivePwle::Active(ActivePwle {
                start_amplitude: 0.2,
                start_frequency: 100.0 + i as f32,
                end_amplitude: 0.8,
                end_frequency: 300.0 + i as f32,
                duration_ms: 20,
            })
        })
        .collect();

    let mut group = c.benchmark_group("pwle");
    group.throughput(Throughput::Elements(segments.len() as u64));
    group.bench_function("63_chirps", |b| {
        b.iter(|| std::hint::black_box(compose_pwle(&map, &[Braking::None], std::hint::black_box(&segments))));
    });
    group.finish();
}

criterion_group!(benches, bench_compose_max_size, bench_pwle_ramps);
criterion_main!(benches);
