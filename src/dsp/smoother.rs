//! Leaky integrator (one-pole lowpass) for de-zippering control signals.
//!
//!   y += c * (x - y),   c = 1 - exp(-1 / (0.001 * tau_ms * sample_rate))
//!
//! A time constant of zero or less disables smoothing (c = 1).

use crate::{dsp::processor::SampleProcessor, valid_sample_rate, DEFAULT_SAMPLE_RATE};

#[inline]
pub fn smoothing_coefficient(tau_ms: f32, sample_rate: f32) -> f32 {
    if tau_ms <= 0.0 {
        1.0
    } else {
        1.0 - (-1.0 / (0.001 * tau_ms * sample_rate)).exp()
    }
}

pub struct Smoother {
    sample_rate: f32,
    tau_ms: f32,
    c: f32,
    y: f32,
}

impl Smoother {
    pub fn new(tau_ms: f32) -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            tau_ms,
            c: smoothing_coefficient(tau_ms, DEFAULT_SAMPLE_RATE),
            y: 0.0,
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        if !valid_sample_rate(sample_rate) {
            log::warn!("smoother: ignoring invalid sample rate {sample_rate}");
            return;
        }
        self.sample_rate = sample_rate;
        self.c = smoothing_coefficient(self.tau_ms, sample_rate);
    }

    pub fn set_time_constant(&mut self, tau_ms: f32) {
        self.tau_ms = tau_ms;
        self.c = smoothing_coefficient(tau_ms, self.sample_rate);
    }

    /// Jump straight to `value` (e.g. before the first note).
    pub fn snap_to(&mut self, value: f32) {
        self.y = value;
    }

    pub fn value(&self) -> f32 {
        self.y
    }
}

impl Default for Smoother {
    fn default() -> Self {
        Self::new(15.0)
    }
}

impl SampleProcessor for Smoother {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        self.y += self.c * (input - self.y);
        self.y
    }

    fn reset(&mut self) {
        self.y = 0.0;
    }
}
