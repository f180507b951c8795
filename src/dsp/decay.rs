//! One-shot exponential decay used for the filter sweep and the accent.
//!
//! `trigger` jumps the level to 1.0 (no attack, always retriggerable) and
//! every `process` call multiplies it by the same coefficient as the
//! amplitude envelope's decay:
//!
//!   level(n) = coeff^n,  coeff = exp(-1 / (0.001 * decay_ms * sample_rate))
//!
//! There is no snap to zero. The level approaches silence asymptotically and
//! callers treat negligible values as off.

use crate::{dsp::envelope::exp_coefficient, valid_sample_rate, DEFAULT_SAMPLE_RATE, MIN_TIME_MS};

/// Decay coefficient for the modulation envelope; `decay_ms` is floored to
/// 0.1 ms before use.
#[inline]
pub fn decay_coefficient(decay_ms: f32, sample_rate: f32) -> f32 {
    exp_coefficient(decay_ms.max(MIN_TIME_MS), sample_rate)
}

pub struct ModulationEnvelope {
    sample_rate: f32,
    decay_ms: f32,
    coeff: f32,
    level: f32,
}

impl ModulationEnvelope {
    pub fn new() -> Self {
        Self::with_decay(200.0)
    }

    pub fn with_decay(decay_ms: f32) -> Self {
        let decay_ms = decay_ms.max(MIN_TIME_MS);
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            decay_ms,
            coeff: decay_coefficient(decay_ms, DEFAULT_SAMPLE_RATE),
            level: 0.0,
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        if !valid_sample_rate(sample_rate) {
            log::warn!("modulation envelope: ignoring invalid sample rate {sample_rate}");
            return;
        }
        self.sample_rate = sample_rate;
        self.coeff = decay_coefficient(self.decay_ms, sample_rate);
    }

    pub fn set_decay_time(&mut self, decay_ms: f32) {
        self.decay_ms = decay_ms.max(MIN_TIME_MS);
        self.coeff = decay_coefficient(self.decay_ms, self.sample_rate);
    }

    pub fn trigger(&mut self) {
        self.level = 1.0;
    }

    pub fn process(&mut self) -> f32 {
        self.level *= self.coeff;
        self.level
    }

    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process();
        }
    }

    pub fn reset(&mut self) {
        self.level = 0.0;
    }

    /// Current level without advancing.
    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn decay_time(&self) -> f32 {
        self.decay_ms
    }

    pub fn coeff(&self) -> f32 {
        self.coeff
    }
}

impl Default for ModulationEnvelope {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_sets_exactly_one() {
        let mut env = ModulationEnvelope::new();
        env.set_sample_rate(44_100.0);
        for _ in 0..100 {
            env.process();
        }
        env.trigger();
        assert_eq!(env.level(), 1.0);
    }

    #[test]
    fn decay_is_strictly_decreasing_and_positive() {
        let mut env = ModulationEnvelope::with_decay(50.0);
        env.set_sample_rate(44_100.0);
        env.trigger();

        let mut previous = env.level();
        for _ in 0..20_000 {
            let level = env.process();
            assert!(level < previous, "level rose or stalled: {previous} -> {level}");
            assert!(level > 0.0);
            previous = level;
        }
        assert!(previous < 1e-3);
    }

    #[test]
    fn reaches_one_over_e_after_decay_time() {
        let mut env = ModulationEnvelope::with_decay(100.0);
        env.set_sample_rate(1_000.0);
        env.trigger();
        for _ in 0..100 {
            env.process();
        }
        assert!((env.level() - (-1.0f32).exp()).abs() < 1e-3);
    }

    #[test]
    fn tiny_decay_times_are_floored() {
        let mut env = ModulationEnvelope::new();
        env.set_decay_time(0.0);
        assert_eq!(env.decay_time(), 0.1);
        env.set_decay_time(-3.0);
        assert!(env.coeff().is_finite());
        env.trigger();
        assert!(env.process() >= 0.0);
    }
}
