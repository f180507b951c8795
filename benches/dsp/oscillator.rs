//! Benchmarks for the PolyBLEP oscillator.

use std::hint::black_box;

use acid_dsp::dsp::oscillator::{Oscillator, Waveform};
use criterion::{BenchmarkId, Criterion};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

fn oscillator(waveform: Waveform, sub_blend: f32) -> Oscillator {
    let mut osc = Oscillator::new();
    osc.set_sample_rate(SAMPLE_RATE);
    osc.set_frequency(110.0);
    osc.set_waveform(waveform);
    osc.set_sub_blend(sub_blend);
    osc
}

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Saw - one blep per cycle
        let mut osc = oscillator(Waveform::Saw, 0.0);
        group.bench_with_input(BenchmarkId::new("saw", size), &size, |b, _| {
            b.iter(|| osc.render(black_box(&mut buffer)))
        });

        // Square - two bleps per cycle
        let mut osc = oscillator(Waveform::Square, 0.0);
        group.bench_with_input(BenchmarkId::new("square", size), &size, |b, _| {
            b.iter(|| osc.render(black_box(&mut buffer)))
        });

        // Square with the sub layer mixed in
        let mut osc = oscillator(Waveform::Square, 0.5);
        group.bench_with_input(BenchmarkId::new("square_sub", size), &size, |b, _| {
            b.iter(|| osc.render(black_box(&mut buffer)))
        });

        // Glide - multiplier applied every sample, restarted each block
        let mut osc = oscillator(Waveform::Saw, 0.0);
        group.bench_with_input(BenchmarkId::new("glide", size), &size, |b, _| {
            b.iter(|| {
                osc.set_frequency(110.0);
                osc.glide_to(220.0, 60.0);
                osc.render(black_box(&mut buffer))
            })
        });
    }

    group.finish();
}
