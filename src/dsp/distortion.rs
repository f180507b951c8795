//! Multi-mode waveshaping distortion.
//!
//! Each mode applies a transfer function to the driven input:
//!   wet = f(input * drive),   drive = 1 + 9 * amount
//!
//! and the result is crossfaded with the dry input by `mix`.
//!
//! # Modes
//!
//! Soft clip:
//!   f(x) = tanh(x)
//!   - Smooth saturation, the classic acid "drive"
//!
//! Hard clip:
//!   f(x) = clamp(x, -1, 1)
//!   - Buzzy, odd harmonics
//!
//! Wavefolder:
//!   Values past ±1 are reflected back once, then clamped
//!   - Metallic, folds the peaks of a resonant squelch
//!
//! Diode clipper:
//!   f(x) = tanh(x)             for x >= 0
//!   f(x) = 2 * tanh(x / 2)     for x < 0
//!   - Asymmetric, adds even harmonics
//!
//! Tube:
//!   v = clamp(x, -1, 1);  f(x) = 1.2 * tanh(v - 0.2 v²)
//!   - Polynomial asymmetry with makeup gain
//!
//! # Amount
//!
//!   <= 0.01  = bypass
//!   0.1-0.3  = warm
//!   0.5-1.0  = heavy

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::processor::SampleProcessor;

/// Amounts at or below this leave the signal untouched.
const BYPASS_AMOUNT: f32 = 0.01;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistortionType {
    SoftClip,
    HardClip,
    Wavefolder,
    DiodeClipper,
    Tube,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistortionParams {
    pub kind: DistortionType,
    /// 0.0 to 1.0, mapped to a drive of 1x to 10x.
    pub amount: f32,
    /// 0.0 = dry, 1.0 = wet.
    pub mix: f32,
    pub enabled: bool,
}

impl Default for DistortionParams {
    fn default() -> Self {
        Self {
            kind: DistortionType::SoftClip,
            amount: 0.0,
            mix: 1.0,
            enabled: false,
        }
    }
}

#[inline]
pub fn soft_clip(x: f32) -> f32 {
    x.tanh()
}

#[inline]
pub fn hard_clip(x: f32) -> f32 {
    x.clamp(-1.0, 1.0)
}

#[inline]
pub fn wavefold(x: f32) -> f32 {
    let folded = if x > 1.0 {
        2.0 - x
    } else if x < -1.0 {
        -2.0 - x
    } else {
        x
    };
    // One reflection only; anything further out is pinned
    folded.clamp(-1.0, 1.0)
}

#[inline]
pub fn diode_clip(x: f32) -> f32 {
    if x >= 0.0 {
        x.tanh()
    } else {
        (x * 0.5).tanh() * 2.0
    }
}

#[inline]
pub fn tube(x: f32) -> f32 {
    let v = x.clamp(-1.0, 1.0);
    (v - 0.2 * v * v).tanh() * 1.2
}

pub struct Distortion {
    params: DistortionParams,
}

impl Distortion {
    pub fn new() -> Self {
        Self::with_params(DistortionParams::default())
    }

    pub fn with_params(params: DistortionParams) -> Self {
        let mut distortion = Self {
            params: DistortionParams::default(),
        };
        distortion.set_params(params);
        distortion
    }

    pub fn set_params(&mut self, params: DistortionParams) {
        self.params.kind = params.kind;
        self.params.enabled = params.enabled;
        self.set_amount(params.amount);
        self.set_mix(params.mix);
    }

    pub fn set_type(&mut self, kind: DistortionType) {
        self.params.kind = kind;
    }

    pub fn set_amount(&mut self, amount: f32) {
        self.params.amount = amount.clamp(0.0, 1.0);
    }

    pub fn set_mix(&mut self, mix: f32) {
        self.params.mix = mix.clamp(0.0, 1.0);
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.params.enabled = enabled;
    }

    pub fn params(&self) -> DistortionParams {
        self.params
    }

    #[inline]
    fn shape(&self, x: f32) -> f32 {
        match self.params.kind {
            DistortionType::SoftClip => soft_clip(x),
            DistortionType::HardClip => hard_clip(x),
            DistortionType::Wavefolder => wavefold(x),
            DistortionType::DiodeClipper => diode_clip(x),
            DistortionType::Tube => tube(x),
        }
    }
}

impl Default for Distortion {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleProcessor for Distortion {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        if !self.params.enabled || self.params.amount <= BYPASS_AMOUNT {
            return input;
        }

        let drive = 1.0 + self.params.amount * 9.0;
        let wet = self.shape(input * drive);
        (1.0 - self.params.mix) * input + self.params.mix * wet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled(kind: DistortionType, amount: f32, mix: f32) -> Distortion {
        Distortion::with_params(DistortionParams {
            kind,
            amount,
            mix,
            enabled: true,
        })
    }

    #[test]
    fn bypassed_when_disabled_or_quiet() {
        let mut off = Distortion::new();
        off.set_amount(1.0);
        assert_eq!(off.process(0.8), 0.8);

        let mut quiet = enabled(DistortionType::HardClip, 0.005, 1.0);
        assert_eq!(quiet.process(0.8), 0.8);
    }

    #[test]
    fn soft_clip_saturates() {
        let mut d = enabled(DistortionType::SoftClip, 1.0, 1.0);
        let y = d.process(0.5);
        // tanh(5) ≈ 0.9999
        assert!(y > 0.99 && y < 1.0);
    }

    #[test]
    fn hard_clip_pins_at_unity() {
        let mut d = enabled(DistortionType::HardClip, 0.5, 1.0);
        assert_eq!(d.process(0.9), 1.0);
        assert_eq!(d.process(-0.9), -1.0);
    }

    #[test]
    fn wavefolder_reflects_once() {
        // 1.4 folds to 0.6
        assert!((wavefold(1.4) - 0.6).abs() < 1e-6);
        assert!((wavefold(-1.4) + 0.6).abs() < 1e-6);
        // Past the second boundary the fold is pinned
        assert_eq!(wavefold(5.0), -1.0);
    }

    #[test]
    fn diode_is_asymmetric() {
        let pos = diode_clip(2.0);
        let neg = diode_clip(-2.0);
        assert!(neg.abs() > pos.abs());
    }

    #[test]
    fn tube_adds_even_harmonics() {
        assert!(tube(0.5).abs() != tube(-0.5).abs());
        assert!(tube(10.0).abs() <= 1.2);
    }

    #[test]
    fn mix_crossfades() {
        let mut d = enabled(DistortionType::HardClip, 1.0, 0.5);
        // wet = clamp(0.5 * 10) = 1.0
        assert!((d.process(0.5) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn parameters_are_clamped() {
        let mut d = Distortion::new();
        d.set_mix(3.0);
        d.set_amount(-1.0);
        assert_eq!(d.params().mix, 1.0);
        assert_eq!(d.params().amount, 0.0);
    }
}
