use std::f32::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{valid_sample_rate, DEFAULT_SAMPLE_RATE};

/*
Diode Ladder Lowpass
====================

Four one-pole stages in series with the last stage's output fed back and
subtracted from the input. The feedback gain sets resonance; push it far
enough and the loop rings on its own (self-oscillation).

Vocabulary
----------

  cutoff      Base corner frequency in Hz, set by the host.

  env mod     Hz added to the cutoff at full filter-envelope level. This is
              the "sweep" of an acid line.

  accent mod  Hz added at full accent-envelope level.

  FM          Audio-rate cutoff modulation by an external signal, scaled by
              half the cutoff.

  b0          Per-stage integration gain, derived from the modulated cutoff.

  k           Feedback gain, derived from cutoff and resonance.

  g           Output makeup gain, derived from k and resonance.


Per-Sample Flow
---------------

    offset   = clamp(env_mod * env + accent_mod * accent, -0.95 fc, 4 fc)
             + fm_amount * fm * 0.5 fc                 (when fm_amount > 0.001)
    fc'      = clamp(fc + offset, 5 Hz, 0.45 fs)
    b0, k, g = coefficients(fc', resonance)

    y0 = input - highpass_150Hz(limit(k * y4))

    y1 += 2 b0 (y0 - y1 + y2)
    y2 +=   b0 (y1 - 2 y2 + y3)
    y3 +=   b0 (y2 - 2 y3 + y4)
    y4 +=   b0 (y3 - 2 y4)

    out = 2 g y4

Coefficients are recomputed every sample because the envelopes move the
cutoff every sample.


Coefficient Fit
---------------

With fx = (fc' / fs) * 0.7071:

    b0 = (0.00045522346 + 6.1922189 fx) / (1 + 12.358354 fx + 4.4156345 fx^2)
    k  = polynomial in fx (degree 6), 16.998792 at fx = 0
    g  = k / 17

These rational and polynomial fits match the measured response of the
hardware's diode ladder. Resonance enters through a skew factor

    r = (1 - exp(-3 resonance)) / 0.9502129316

which is exactly 1.0 at resonance = 1.0 and keeps growing past it:

    g = ((g - 1) r + 1) (1 + r)
    k = k r


Stability
---------

The ladder itself is linear, so above the self-oscillation threshold the
ring would grow without bound. Two things keep it finite:

  * the 150 Hz one-pole highpass in the feedback path stops DC from
    accumulating around the loop;
  * the whole feedback term k * y4 passes through a tanh limiter

        limit(x) = 16 tanh(x / 16)

    so the fed-back signal never exceeds 16 however large k gets.

Near the top of the cutoff range k approaches 100 and, past resonance 1.0,
the explicit stage update is unstable on its own. With the limiter a
unit-level input stays within a few units at the output over the whole
cutoff and resonance range.
*/

pub const STAGES: usize = 4;
/// Lowest modulated cutoff.
pub const MIN_CUTOFF_HZ: f32 = 5.0;
/// Highest modulated cutoff as a fraction of the sample rate.
pub const MAX_CUTOFF_RATIO: f32 = 0.45;
/// Corner of the highpass in the feedback path.
pub const FEEDBACK_HIGHPASS_HZ: f32 = 150.0;
/// FM depths at or below this are ignored.
const FM_THRESHOLD: f32 = 0.001;
/// Largest magnitude the fed-back signal can reach.
const FEEDBACK_LIMIT: f32 = 16.0;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterParams {
    pub cutoff_hz: f32,
    /// 0.0 and up; values above 1.0 self-oscillate.
    pub resonance: f32,
    pub env_mod_hz: f32,
    pub accent_mod_hz: f32,
    pub fm_amount: f32,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            cutoff_hz: 1000.0,
            resonance: 0.0,
            env_mod_hz: 0.0,
            accent_mod_hz: 0.0,
            fm_amount: 0.0,
        }
    }
}

/// Ladder coefficients for one modulated cutoff.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LadderCoeffs {
    pub b0: f32,
    pub k: f32,
    pub g: f32,
}

impl LadderCoeffs {
    pub fn configure(cutoff_hz: f32, resonance: f32, sample_rate: f32) -> Self {
        let wc = TAU * cutoff_hz / sample_rate;
        let fx = wc * std::f32::consts::FRAC_1_SQRT_2 / TAU;

        let b0 = (0.000_455_223_46 + 6.192_218_9 * fx)
            / (1.0 + 12.358_354 * fx + 4.415_634_5 * (fx * fx));
        let k = fx
            * (fx
                * (fx * (fx * (fx * (fx + 7_198.699_7) - 5_837.791_7) - 476.473_08)
                    + 614.956_11)
                + 213.871_26)
            + 16.998_792;
        let g = k / 17.0;

        let r_skew = resonance_skew(resonance);
        Self {
            b0,
            k: k * r_skew,
            g: ((g - 1.0) * r_skew + 1.0) * (1.0 + r_skew),
        }
    }
}

/// Maps resonance onto the feedback scale; 1.0 at resonance = 1.0.
#[inline]
pub fn resonance_skew(resonance: f32) -> f32 {
    (1.0 - (-3.0 * resonance).exp()) / 0.950_212_931_6
}

/// Cutoff after envelope, accent and FM modulation, clamped to the stable range.
#[inline]
pub fn modulated_cutoff(
    params: &FilterParams,
    sample_rate: f32,
    env: f32,
    accent: f32,
    fm_input: f32,
) -> f32 {
    let cutoff = params.cutoff_hz;
    let mut offset = (params.env_mod_hz * env + params.accent_mod_hz * accent)
        .clamp(-0.95 * cutoff, 4.0 * cutoff);

    if params.fm_amount > FM_THRESHOLD {
        offset += params.fm_amount * fm_input * 0.5 * cutoff;
    }

    (cutoff + offset).clamp(MIN_CUTOFF_HZ, MAX_CUTOFF_RATIO * sample_rate)
}

pub struct LadderFilter {
    params: FilterParams,
    sample_rate: f32,
    stages: [f32; STAGES],
    hp_state: f32,
    hp_coeff: f32,
    coeffs: LadderCoeffs,
}

impl LadderFilter {
    pub fn new() -> Self {
        Self::with_params(FilterParams::default())
    }

    pub fn with_params(params: FilterParams) -> Self {
        let mut filter = Self {
            params: FilterParams::default(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            stages: [0.0; STAGES],
            hp_state: 0.0,
            hp_coeff: highpass_coefficient(DEFAULT_SAMPLE_RATE),
            coeffs: LadderCoeffs::configure(1000.0, 0.0, DEFAULT_SAMPLE_RATE),
        };
        filter.set_params(params);
        filter
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        if !valid_sample_rate(sample_rate) {
            log::warn!("ladder filter: ignoring invalid sample rate {sample_rate}");
            return;
        }
        self.sample_rate = sample_rate;
        self.hp_coeff = highpass_coefficient(sample_rate);
        self.recompute();
    }

    pub fn set_params(&mut self, params: FilterParams) {
        self.params = params;
        self.params.cutoff_hz = params.cutoff_hz.max(MIN_CUTOFF_HZ);
        self.params.resonance = params.resonance.max(0.0);
        self.recompute();
    }

    pub fn set_cutoff(&mut self, cutoff_hz: f32) {
        self.params.cutoff_hz = cutoff_hz.max(MIN_CUTOFF_HZ);
        self.recompute();
    }

    /// Per-sample cutoff update. Leaves the cached resting coefficients
    /// alone; the next `process` call derives fresh ones.
    #[inline]
    pub fn track_cutoff(&mut self, cutoff_hz: f32) {
        self.params.cutoff_hz = cutoff_hz.max(MIN_CUTOFF_HZ);
    }

    /// Negative values are clamped to 0; values above 1 are allowed.
    pub fn set_resonance(&mut self, resonance: f32) {
        self.params.resonance = resonance.max(0.0);
        self.recompute();
    }

    pub fn set_env_mod(&mut self, depth_hz: f32) {
        self.params.env_mod_hz = depth_hz;
    }

    pub fn set_accent_mod(&mut self, depth_hz: f32) {
        self.params.accent_mod_hz = depth_hz;
    }

    pub fn set_fm_amount(&mut self, amount: f32) {
        self.params.fm_amount = amount;
    }

    // Unmodulated coefficients, kept for inspection between samples
    fn recompute(&mut self) {
        let cutoff = self
            .params
            .cutoff_hz
            .clamp(MIN_CUTOFF_HZ, MAX_CUTOFF_RATIO * self.sample_rate);
        self.coeffs = LadderCoeffs::configure(cutoff, self.params.resonance, self.sample_rate);
    }

    #[inline]
    fn feedback_highpass(&mut self, input: f32) -> f32 {
        self.hp_state += (1.0 - self.hp_coeff) * (input - self.hp_state);
        input - self.hp_state
    }

    /// Filter one sample. `env` and `accent` are the current levels of the
    /// filter and accent envelopes, `fm_input` an optional audio-rate
    /// modulator (pass 0.0 when unused).
    pub fn process(&mut self, input: f32, env: f32, accent: f32, fm_input: f32) -> f32 {
        let cutoff = modulated_cutoff(&self.params, self.sample_rate, env, accent, fm_input);
        let LadderCoeffs { b0, k, g } =
            LadderCoeffs::configure(cutoff, self.params.resonance, self.sample_rate);
        self.coeffs = LadderCoeffs { b0, k, g };

        let feedback = k * self.stages[STAGES - 1];
        let limited = FEEDBACK_LIMIT * (feedback / FEEDBACK_LIMIT).tanh();
        let y0 = input - self.feedback_highpass(limited);

        let y = &mut self.stages;
        y[0] += 2.0 * b0 * (y0 - y[0] + y[1]);
        for i in 1..STAGES {
            let above = if i + 1 < STAGES { y[i + 1] } else { 0.0 };
            y[i] += b0 * (y[i - 1] - 2.0 * y[i] + above);
        }

        2.0 * g * y[STAGES - 1]
    }

    /// Filter a block in place with fixed modulation levels.
    pub fn render(&mut self, buffer: &mut [f32], env: f32, accent: f32) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample, env, accent, 0.0);
        }
    }

    pub fn reset(&mut self) {
        self.stages = [0.0; STAGES];
        self.hp_state = 0.0;
    }

    pub fn params(&self) -> FilterParams {
        self.params
    }

    pub fn cutoff(&self) -> f32 {
        self.params.cutoff_hz
    }

    pub fn resonance(&self) -> f32 {
        self.params.resonance
    }

    pub fn env_mod(&self) -> f32 {
        self.params.env_mod_hz
    }

    /// Coefficients used by the most recent sample (or the unmodulated ones
    /// after a parameter change).
    pub fn coeffs(&self) -> LadderCoeffs {
        self.coeffs
    }

    pub fn stages(&self) -> &[f32; STAGES] {
        &self.stages
    }
}

impl Default for LadderFilter {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn highpass_coefficient(sample_rate: f32) -> f32 {
    (-TAU * FEEDBACK_HIGHPASS_HZ / sample_rate).exp()
}
