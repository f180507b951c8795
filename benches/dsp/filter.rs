//! Benchmarks for the diode ladder.

use std::hint::black_box;

use acid_dsp::dsp::ladder::LadderFilter;
use criterion::{BenchmarkId, Criterion};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

fn ladder(resonance: f32) -> LadderFilter {
    let mut filter = LadderFilter::new();
    filter.set_sample_rate(SAMPLE_RATE);
    filter.set_cutoff(800.0);
    filter.set_resonance(resonance);
    filter.set_env_mod(2_000.0);
    filter
}

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/ladder");

    for &size in BLOCK_SIZES {
        // Test signal (sawtooth-like ramp)
        let input: Vec<f32> = (0..size)
            .map(|i| (i as f32 / size as f32) * 2.0 - 1.0)
            .collect();

        // Static modulation levels
        let mut filter = ladder(0.5);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("static", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                filter.render(black_box(&mut buffer), 0.3, 0.0);
            })
        });

        // Envelope sweep - cutoff coefficients derived every sample
        let mut filter = ladder(0.9);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("sweep", size), &size, |b, _| {
            b.iter(|| {
                let mut env = 1.0f32;
                for (out, &x) in buffer.iter_mut().zip(&input) {
                    env *= 0.999;
                    *out = filter.process(x, env, env, 0.0);
                }
                black_box(&buffer);
            })
        });

        // Audio-rate cutoff modulation
        let mut filter = ladder(0.7);
        filter.set_fm_amount(0.5);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("fm", size), &size, |b, _| {
            b.iter(|| {
                for (out, &x) in buffer.iter_mut().zip(&input) {
                    *out = filter.process(x, 0.0, 0.0, x);
                }
                black_box(&buffer);
            })
        });
    }

    group.finish();
}
