#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{valid_sample_rate, DEFAULT_SAMPLE_RATE};

/*
Band-Limited Bass Oscillator
============================

Vocabulary
----------

  phase       Position inside the current cycle, always in [0, 1). One full
              cycle advances phase by exactly 1.0.

  increment   How far phase moves per sample: frequency / sample_rate.
              Also the width (in phase units) of one sample period, which is
              how wide the anti-aliasing correction around an edge is.

  blend       Crossfade between the two main shapes.
                blend = 0.0  →  pure (pulse-width) square
                blend = 1.0  →  pure sawtooth

  sub         A square one octave down (half frequency) mixed on top by
              `sub_blend`. It runs on its own phase.

  glide       Portamento. Frequency slides from where it is now to a target
              over a fixed number of samples, multiplying by a constant ratio
              every sample so the slide is linear in pitch.


PolyBLEP
--------

Sampling a naive saw or square puts a hard step between two samples. The
step's spectrum extends forever and folds back below Nyquist as aliasing.
A polynomial band-limited step (PolyBLEP) subtracts a two-sample polynomial
residual centred on the edge:

    t in [0, dt):      t' = t/dt        r = 2t' - t'^2 - 1
    t in (1-dt, 1):    t' = (t-1)/dt    r = t'^2 + 2t' + 1
    otherwise:         r = 0

where dt is the phase increment. The saw gets one correction at its reset,
the square gets a positive one at its rising edge (phase 0) and a negative
one at its falling edge (phase = pulse width).


Pulse Width
-----------

A 50% square has only odd harmonics. The original hardware derives its square
by shaping a saw through a transistor, which leaves the duty cycle slightly
off centre. JC303 mode models that with a 53% pulse width.


Glide
-----

    steps      = ceil(time_ms * sample_rate / 1000), at least 1
    multiplier = (target / start) ^ (1 / steps)

Each sample: frequency *= multiplier, and on the final step frequency is set
to the target exactly so rounding never leaves the pitch a hair off.


Output Scaling
--------------

The blended value is in [-1, 1]; it is scaled by 0.707 so the voice has
headroom for the filter's resonant gain downstream.
*/

/// Fixed headroom applied after blending.
pub const HEADROOM: f32 = 0.707;
/// Pulse width of a symmetric square.
pub const SQUARE_PULSE_WIDTH: f32 = 0.5;
/// Pulse width approximating the original hardware's asymmetric square.
pub const JC303_PULSE_WIDTH: f32 = 0.53;
/// Lowest frequency the oscillator accepts; keeps `frequency` strictly positive.
pub const MIN_FREQUENCY_HZ: f32 = 0.01;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Saw,
    Square,
}

impl Waveform {
    /// The blend value that selects this waveform on its own.
    pub fn blend(self) -> f32 {
        match self {
            Waveform::Saw => 1.0,
            Waveform::Square => 0.0,
        }
    }
}

/// Per-sample phase increments derived from a frequency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OscillatorCoeffs {
    pub phase_increment: f32,
    pub sub_phase_increment: f32,
}

impl OscillatorCoeffs {
    pub fn configure(frequency: f32, sample_rate: f32) -> Self {
        Self {
            phase_increment: frequency / sample_rate,
            sub_phase_increment: (frequency * 0.5) / sample_rate,
        }
    }
}

/// An exponential frequency ramp, planned up front.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glide {
    pub steps: u32,
    pub multiplier: f64,
}

impl Glide {
    pub fn plan(from_hz: f32, to_hz: f32, time_ms: f32, sample_rate: f32) -> Self {
        let from = f64::from(from_hz.max(MIN_FREQUENCY_HZ));
        let to = f64::from(to_hz.max(MIN_FREQUENCY_HZ));
        let samples = f64::from(time_ms.max(0.0)) * f64::from(sample_rate) / 1000.0;
        let steps = samples.ceil().max(1.0);
        Self {
            steps: steps as u32,
            multiplier: (to / from).powf(1.0 / steps),
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OscillatorParams {
    /// 0.0 = square, 1.0 = saw.
    pub blend: f32,
    /// 0.0 = no sub, 1.0 = sub only.
    pub sub_blend: f32,
    /// Use the 53% pulse width.
    pub jc303: bool,
}

impl Default for OscillatorParams {
    fn default() -> Self {
        Self {
            blend: 0.0,
            sub_blend: 0.0,
            jc303: true,
        }
    }
}

/// Polynomial band-limited step residual for an edge at phase 0.
#[inline]
pub fn poly_blep(t: f32, dt: f32) -> f32 {
    if t < dt {
        let t = t / dt;
        t + t - t * t - 1.0
    } else if t > 1.0 - dt {
        let t = (t - 1.0) / dt;
        t * t + t + t + 1.0
    } else {
        0.0
    }
}

#[inline]
fn wrap(phase: f32) -> f32 {
    if phase >= 1.0 {
        phase - phase.floor()
    } else {
        phase
    }
}

pub struct Oscillator {
    sample_rate: f32,
    frequency: f32,
    coeffs: OscillatorCoeffs,
    phase: f32,
    sub_phase: f32,

    // Glide bookkeeping; f64 so thousands of multiplications stay monotonic
    target_frequency: f32,
    glide_frequency: f64,
    glide_multiplier: f64,
    glide_steps_remaining: u32,

    blend: f32,
    sub_blend: f32,
    pulse_width: f32,
}

impl Oscillator {
    pub fn new() -> Self {
        let frequency = 440.0;
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            frequency,
            coeffs: OscillatorCoeffs::configure(frequency, DEFAULT_SAMPLE_RATE),
            phase: 0.0,
            sub_phase: 0.0,
            target_frequency: frequency,
            glide_frequency: f64::from(frequency),
            glide_multiplier: 1.0,
            glide_steps_remaining: 0,
            blend: 0.0,
            sub_blend: 0.0,
            pulse_width: JC303_PULSE_WIDTH,
        }
    }

    pub fn with_params(params: OscillatorParams) -> Self {
        let mut osc = Self::new();
        osc.apply_params(&params);
        osc
    }

    pub fn apply_params(&mut self, params: &OscillatorParams) {
        self.set_blend(params.blend);
        self.set_sub_blend(params.sub_blend);
        self.set_mode(params.jc303);
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        if !valid_sample_rate(sample_rate) {
            log::warn!("oscillator: ignoring invalid sample rate {sample_rate}");
            return;
        }
        self.sample_rate = sample_rate;
        self.coeffs = OscillatorCoeffs::configure(self.frequency, sample_rate);
    }

    /// Jump to `frequency` immediately, cancelling any glide and restarting
    /// both phases at zero.
    pub fn set_frequency(&mut self, frequency: f32) {
        let frequency = frequency.max(MIN_FREQUENCY_HZ);
        self.frequency = frequency;
        self.target_frequency = frequency;
        self.glide_frequency = f64::from(frequency);
        self.glide_steps_remaining = 0;
        self.coeffs = OscillatorCoeffs::configure(frequency, self.sample_rate);
        self.reset_phase();
    }

    /// Start an exponential slide to `target_hz` without touching the phase.
    pub fn glide_to(&mut self, target_hz: f32, time_ms: f32) {
        let target = target_hz.max(MIN_FREQUENCY_HZ);
        let glide = Glide::plan(self.frequency, target, time_ms, self.sample_rate);
        self.target_frequency = target;
        self.glide_frequency = f64::from(self.frequency);
        self.glide_multiplier = glide.multiplier;
        self.glide_steps_remaining = glide.steps;
    }

    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.blend = waveform.blend();
    }

    pub fn set_blend(&mut self, blend: f32) {
        self.blend = blend.clamp(0.0, 1.0);
    }

    pub fn set_sub_blend(&mut self, sub_blend: f32) {
        self.sub_blend = sub_blend.clamp(0.0, 1.0);
    }

    pub fn set_mode(&mut self, jc303: bool) {
        self.pulse_width = if jc303 {
            JC303_PULSE_WIDTH
        } else {
            SQUARE_PULSE_WIDTH
        };
    }

    pub fn reset_phase(&mut self) {
        self.phase = 0.0;
        self.sub_phase = 0.0;
    }

    /// Advance the glide by one sample. `process` calls this itself.
    pub fn tick(&mut self) {
        if self.glide_steps_remaining == 0 {
            return;
        }

        self.glide_steps_remaining -= 1;
        if self.glide_steps_remaining == 0 {
            self.frequency = self.target_frequency;
            self.glide_frequency = f64::from(self.target_frequency);
        } else {
            self.glide_frequency *= self.glide_multiplier;
            self.frequency = self.glide_frequency as f32;
        }
        self.coeffs = OscillatorCoeffs::configure(self.frequency, self.sample_rate);
    }

    /// Produce the next sample in [-0.707, 0.707].
    pub fn process(&mut self) -> f32 {
        self.tick();

        let dt = self.coeffs.phase_increment;

        // Saw resets at phase 0.5 so it lines up with the square's edges
        let shifted = wrap(self.phase + 0.5);
        let saw = 2.0 * shifted - 1.0 - poly_blep(shifted, dt);

        let mut square = if self.phase < self.pulse_width { 1.0 } else { -1.0 };
        square += poly_blep(self.phase, dt);
        square -= poly_blep(wrap(self.phase + 1.0 - self.pulse_width), dt);

        let main = (1.0 - self.blend) * square + self.blend * saw;

        let sub = if self.sub_phase < 0.5 { 1.0 } else { -1.0 };
        let value = ((1.0 - self.sub_blend) * main + self.sub_blend * sub) * HEADROOM;

        self.sub_phase = wrap(self.sub_phase + self.coeffs.sub_phase_increment);
        self.phase = wrap(self.phase + dt);

        value
    }

    /// Fill `buffer` with consecutive samples.
    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process();
        }
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn target_frequency(&self) -> f32 {
        self.target_frequency
    }

    pub fn is_gliding(&self) -> bool {
        self.glide_steps_remaining > 0
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn sub_phase(&self) -> f32 {
        self.sub_phase
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }
}

impl Default for Oscillator {
    fn default() -> Self {
        Self::new()
    }
}
