//! Benchmarks for the stages after the filter.

use std::hint::black_box;

use acid_dsp::dsp::{
    dc_blocker::DcBlocker,
    delay::StereoDelay,
    distortion::{Distortion, DistortionParams, DistortionType},
    processor::SampleProcessor,
};
use criterion::{BenchmarkId, Criterion};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_effects(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/effects");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size)
            .map(|i| (i as f32 * 0.05).sin() * 0.8)
            .collect();
        let mut buffer = input.clone();

        for kind in [DistortionType::SoftClip, DistortionType::Tube] {
            let mut distortion = Distortion::with_params(DistortionParams {
                kind,
                amount: 0.6,
                mix: 1.0,
                enabled: true,
            });
            let name = format!("distortion_{kind:?}").to_lowercase();
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    buffer.copy_from_slice(&input);
                    distortion.process_block(black_box(&mut buffer));
                })
            });
        }

        let mut dc = DcBlocker::default();
        dc.set_sample_rate(SAMPLE_RATE);
        group.bench_with_input(BenchmarkId::new("dc_blocker", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                dc.process_block(black_box(&mut buffer));
            })
        });

        let mut delay = StereoDelay::default();
        delay.set_sample_rate(SAMPLE_RATE);
        delay.begin().expect("delay allocation");
        delay.set_time_ms_l(250.0);
        delay.set_time_ms_r(375.0);
        delay.set_mix(0.3);
        let mut right = input.clone();
        group.bench_with_input(BenchmarkId::new("stereo_delay", size), &size, |b, _| {
            b.iter(|| {
                for (l, r) in buffer.iter_mut().zip(right.iter_mut()) {
                    (*l, *r) = delay.process_frame(*l, *r);
                }
                black_box((&buffer, &right));
            })
        });
    }

    group.finish();
}
