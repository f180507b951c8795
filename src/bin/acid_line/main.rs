//! acid_line - plays a looping sixteen-step bassline through the default
//! output device.
//!
//! Run with: cargo run --bin acid_line
//! Set RUST_LOG=acid_dsp=trace to watch note events.

use std::{thread, time::Duration};

use acid_dsp::{
    dsp::distortion::{DistortionParams, DistortionType},
    synth::{AcidVoice, VoiceHandle, VoiceMessage, VoiceParams},
    MAX_BLOCK_SIZE,
};
use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

/// One step of the line: `None` is a rest.
#[derive(Clone, Copy)]
struct Step {
    note: Option<u8>,
    accent: bool,
    slide: bool,
}

const fn note(note: u8, accent: bool, slide: bool) -> Step {
    Step {
        note: Some(note),
        accent,
        slide,
    }
}

const REST: Step = Step {
    note: None,
    accent: false,
    slide: false,
};

const LINE: [Step; 16] = [
    note(36, true, false),
    note(36, false, false),
    note(48, false, true),
    REST,
    note(36, false, false),
    note(39, true, false),
    note(41, false, true),
    note(43, false, false),
    note(36, false, false),
    REST,
    note(46, true, false),
    note(36, false, true),
    note(48, false, false),
    note(36, true, false),
    REST,
    note(39, false, true),
];

const BPM: f64 = 126.0;
const LOOPS: usize = 4;

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    env_logger::init();

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| eyre!("no default output device available"))?;
    let config = device
        .default_output_config()
        .wrap_err("failed to fetch default output config")?;

    if config.sample_format() != cpal::SampleFormat::F32 {
        return Err(eyre!(
            "unsupported sample format {:?}, need f32",
            config.sample_format()
        ));
    }

    let sample_rate = config.sample_rate().0 as f32;
    let channels = config.channels() as usize;
    log::info!("output: {sample_rate} Hz, {channels} channels");

    let mut params = VoiceParams::default();
    params.filter.cutoff_hz = 350.0;
    params.filter.resonance = 0.85;
    params.distortion = DistortionParams {
        kind: DistortionType::SoftClip,
        amount: 0.3,
        mix: 0.8,
        enabled: true,
    };
    params.delay.mix = 0.2;

    let (mut voice, mut handle) = AcidVoice::with_queue(params, sample_rate);
    voice
        .begin()
        .wrap_err("failed to allocate the delay line")?;

    let mut left = vec![0.0f32; MAX_BLOCK_SIZE];
    let mut right = vec![0.0f32; MAX_BLOCK_SIZE];

    let stream = device.build_output_stream(
        &config.into(),
        move |data: &mut [f32], _| {
            for chunk in data.chunks_mut(MAX_BLOCK_SIZE * channels) {
                let frames = chunk.len() / channels;
                let (block_l, block_r) = (&mut left[..frames], &mut right[..frames]);
                voice.render_stereo(block_l, block_r);

                let stereo = block_l.iter().zip(block_r.iter());
                for (frame, (&l, &r)) in chunk.chunks_mut(channels).zip(stereo) {
                    match frame {
                        [mono] => *mono = 0.5 * (l + r),
                        [first, second, rest @ ..] => {
                            *first = l;
                            *second = r;
                            rest.fill(0.0);
                        }
                        [] => {}
                    }
                }
            }
        },
        |err| log::error!("audio stream error: {err}"),
        None,
    )?;
    stream.play()?;

    play(&mut handle)?;
    thread::sleep(Duration::from_millis(500));
    Ok(())
}

/// Sequence the line from the control thread.
fn play(handle: &mut VoiceHandle) -> EyreResult<()> {
    let sixteenth = Duration::from_secs_f64(60.0 / BPM / 4.0);
    let gate = sixteenth.mul_f64(0.5);
    let mut held: Option<u8> = None;

    for (index, step) in LINE.iter().cycle().take(LINE.len() * LOOPS).enumerate() {
        // Sweep the cutoff across each loop
        let position = (index % LINE.len()) as f32 / LINE.len() as f32;
        send(handle, VoiceMessage::SetCutoff(250.0 + 1_200.0 * position))?;

        match step.note {
            Some(note) => {
                send(
                    handle,
                    VoiceMessage::NoteOn {
                        note,
                        accent: step.accent,
                        slide: step.slide && held.is_some(),
                    },
                )?;
                held = Some(note);
            }
            None => {
                if let Some(note) = held.take() {
                    send(handle, VoiceMessage::NoteOff { note })?;
                }
            }
        }

        // Release unless the next step slides into this one
        let next = LINE[(index + 1) % LINE.len()];
        thread::sleep(gate);
        if !next.slide {
            if let Some(note) = held.take() {
                send(handle, VoiceMessage::NoteOff { note })?;
            }
        }
        thread::sleep(sixteenth - gate);
    }

    send(handle, VoiceMessage::AllNotesOff)
}

fn send(handle: &mut VoiceHandle, message: VoiceMessage) -> EyreResult<()> {
    handle
        .send(message)
        .map_err(|message| eyre!("voice queue full, dropped {message:?}"))
}
