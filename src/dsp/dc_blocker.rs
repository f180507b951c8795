//! DC blocking / gentle highpass for the end of the voice chain.
//!
//! Two flavours share the same cutoff:
//!
//! Classic DC blocker:
//!   y[n] = x[n] - x[n-1] + R * y[n-1],   R = 1 - 2π fc / fs
//!
//! One-pole highpass (input minus a one-pole lowpass of itself):
//!   lp += α (x - lp);  y = x - lp,       α = 1 - exp(-2π fc / fs)

use std::f32::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{dsp::processor::SampleProcessor, valid_sample_rate, DEFAULT_SAMPLE_RATE};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DcBlockerMode {
    Classic,
    OnePole,
}

/// Coefficients for both flavours at one cutoff.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DcBlockerCoeffs {
    pub r: f32,
    pub alpha: f32,
}

impl DcBlockerCoeffs {
    pub fn configure(cutoff_hz: f32, sample_rate: f32) -> Self {
        let w = TAU * cutoff_hz.max(0.0) / sample_rate;
        Self {
            r: 1.0 - w,
            alpha: 1.0 - (-w).exp(),
        }
    }
}

pub struct DcBlocker {
    sample_rate: f32,
    cutoff_hz: f32,
    mode: DcBlockerMode,
    coeffs: DcBlockerCoeffs,
    last_input: f32,
    last_output: f32,
    lpf_state: f32,
}

impl DcBlocker {
    pub fn new(cutoff_hz: f32) -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            cutoff_hz,
            mode: DcBlockerMode::Classic,
            coeffs: DcBlockerCoeffs::configure(cutoff_hz, DEFAULT_SAMPLE_RATE),
            last_input: 0.0,
            last_output: 0.0,
            lpf_state: 0.0,
        }
    }

    pub fn with_mode(mut self, mode: DcBlockerMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        if !valid_sample_rate(sample_rate) {
            log::warn!("dc blocker: ignoring invalid sample rate {sample_rate}");
            return;
        }
        self.sample_rate = sample_rate;
        self.coeffs = DcBlockerCoeffs::configure(self.cutoff_hz, sample_rate);
    }

    pub fn set_cutoff(&mut self, cutoff_hz: f32) {
        self.cutoff_hz = cutoff_hz;
        self.coeffs = DcBlockerCoeffs::configure(cutoff_hz, self.sample_rate);
    }

    pub fn set_mode(&mut self, mode: DcBlockerMode) {
        self.mode = mode;
    }

    /// Classic recursive DC blocker.
    #[inline]
    pub fn process_classic(&mut self, input: f32) -> f32 {
        let output = input - self.last_input + self.coeffs.r * self.last_output;
        self.last_input = input;
        self.last_output = output;
        output
    }

    /// One-pole highpass.
    #[inline]
    pub fn process_highpass(&mut self, input: f32) -> f32 {
        self.lpf_state += (input - self.lpf_state) * self.coeffs.alpha;
        input - self.lpf_state
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff_hz
    }
}

impl Default for DcBlocker {
    fn default() -> Self {
        Self::new(25.0)
    }
}

impl SampleProcessor for DcBlocker {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        match self.mode {
            DcBlockerMode::Classic => self.process_classic(input),
            DcBlockerMode::OnePole => self.process_highpass(input),
        }
    }

    fn reset(&mut self) {
        self.last_input = 0.0;
        self.last_output = 0.0;
        self.lpf_state = 0.0;
    }
}
