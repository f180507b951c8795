//! Benchmarks for the assembled acid voice.

use std::hint::black_box;

use acid_dsp::{
    dsp::distortion::{DistortionParams, DistortionType},
    synth::{AcidVoice, VoiceParams},
};
use criterion::{BenchmarkId, Criterion};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

fn voice(params: VoiceParams) -> AcidVoice {
    let mut voice = AcidVoice::new(params, SAMPLE_RATE);
    voice.begin().expect("delay allocation");
    voice
}

pub fn bench_voice(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voice");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // === HELD NOTE ===
        // baseline: one note, no effects
        let mut held = voice(VoiceParams::default());
        held.note_on(45, false, false);
        group.bench_with_input(BenchmarkId::new("held", size), &size, |b, _| {
            b.iter(|| held.render_block(black_box(&mut buffer)))
        });

        // === SIXTEENTH LINE ===
        // a new accented or slid note every block, the typical acid pattern
        let line = [(45u8, true, false), (57, false, true), (48, false, false), (45, true, true)];
        let mut step = 0;
        let mut pattern = voice(VoiceParams::default());
        group.bench_with_input(BenchmarkId::new("pattern", size), &size, |b, _| {
            b.iter(|| {
                let (note, accent, slide) = line[step % line.len()];
                pattern.note_on(note, accent, slide);
                pattern.render_block(black_box(&mut buffer));
                step += 1;
            })
        });

        // === FULL CHAIN ===
        // distortion and delay engaged, rendered in stereo
        let mut params = VoiceParams::default();
        params.distortion = DistortionParams {
            kind: DistortionType::DiodeClipper,
            amount: 0.5,
            mix: 1.0,
            enabled: true,
        };
        params.delay.mix = 0.3;
        params.filter.resonance = 0.95;
        let mut full = voice(params);
        full.note_on(45, true, false);
        let mut right = vec![0.0f32; size];
        group.bench_with_input(BenchmarkId::new("full_stereo", size), &size, |b, _| {
            b.iter(|| {
                full.set_cutoff(300.0 + (step % 8) as f32 * 200.0);
                full.render_stereo(black_box(&mut buffer), black_box(&mut right));
                step += 1;
            })
        });
    }

    group.finish();
}
