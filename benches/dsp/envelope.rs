//! Benchmarks for the amplitude and modulation envelopes.

use std::hint::black_box;

use acid_dsp::dsp::{decay::ModulationEnvelope, envelope::AmplitudeEnvelope};
use criterion::{BenchmarkId, Criterion};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Attack into decay, retriggered every block
        let mut env = AmplitudeEnvelope::new();
        env.set_sample_rate(SAMPLE_RATE);
        group.bench_with_input(BenchmarkId::new("amp_attack", size), &size, |b, _| {
            b.iter(|| {
                env.note_on();
                env.render(black_box(&mut buffer));
            })
        });

        // Held decay stage
        let mut env = AmplitudeEnvelope::new();
        env.set_sample_rate(SAMPLE_RATE);
        env.note_on();
        group.bench_with_input(BenchmarkId::new("amp_decay", size), &size, |b, _| {
            b.iter(|| env.render(black_box(&mut buffer)))
        });

        // Filter sweep envelope
        let mut env = ModulationEnvelope::with_decay(200.0);
        env.set_sample_rate(SAMPLE_RATE);
        group.bench_with_input(BenchmarkId::new("modulation", size), &size, |b, _| {
            b.iter(|| {
                env.trigger();
                env.render(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
