#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{valid_sample_rate, DEFAULT_SAMPLE_RATE, MIN_TIME_MS};

/*
Attack / Decay / Release Envelope
=================================

The amplitude envelope of an acid bass voice has no sustain stage: once the
attack peaks, the level decays for as long as the key is held, and a key
release just switches to a (usually faster) release curve.

Vocabulary
----------

  level       Current output, 0.0 to 1.0. Multiplies the filtered signal.

  stage       Where the state machine is: Idle, Attack, Decay or Release.

  gate        Whether the key is logically held. Set by note_on, cleared by
              note_off. Independent of whether the level is still audible.

  increment   Per-sample step of the linear attack ramp.

  coefficient Per-sample multiplier of the exponential decay and release.


The Shape
---------

  Level
    1.0 ┐   ╱╲
        │  ╱  ╲
        │ ╱    ╲___          note_off
        │╱         ╲____   ↓
    0.0 └────────────────╲____→ Time
        Attack  Decay       Release

Attack is a straight line, decay and release are exponential:

    attack increment = 1 / max(1, attack_ms * sample_rate / 1000)
    coefficient      = exp(-1 / (0.001 * time_ms * sample_rate))

so after `time_ms` the level has fallen to 1/e of where it was.


The State Machine
-----------------

    ┌──────┐ note_on  ┌────────┐ level>=1 ┌───────┐ level<floor ┌──────┐
    │ Idle │ ───────→ │ Attack │ ───────→ │ Decay │ ──────────→ │ Idle │
    └──────┘          └────────┘          └───────┘             └──────┘
                          │ note_off          │ note_off
                          ↓                   ↓
                      ┌─────────────────────────┐  level<floor  ┌──────┐
                      │         Release         │ ────────────→ │ Idle │
                      └─────────────────────────┘               └──────┘

note_off enters Release from ANY stage, and release starts from the current
level. note_on always restarts from 0.0, which can click on fast retriggers;
the voice accepts that in exchange for every note having the same attack.

The transition logic lives in `EnvelopeState::advance`, a pure function of
the current state and the coefficients, so it can be tested without a
stateful envelope around it.
*/

/// Below this level decay and release snap to silence.
pub const LEVEL_FLOOR: f32 = 1e-4;

/// Slack that lets an attack land on 1.0 despite accumulated rounding.
const ATTACK_EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Idle,    // Silent, level = 0
    Attack,  // Ramping linearly up to 1.0
    Decay,   // Falling exponentially while the gate is held
    Release, // Falling exponentially after note_off
}

/// The part of the envelope that changes every sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeState {
    pub stage: EnvelopeStage,
    pub level: f32,
}

impl EnvelopeState {
    pub const IDLE: Self = Self {
        stage: EnvelopeStage::Idle,
        level: 0.0,
    };

    /// Advance one sample.
    pub fn advance(self, coeffs: &EnvelopeCoeffs) -> Self {
        match self.stage {
            EnvelopeStage::Idle => Self::IDLE,

            EnvelopeStage::Attack => {
                let level = self.level + coeffs.attack_increment;
                if level >= 1.0 - ATTACK_EPSILON {
                    Self {
                        stage: EnvelopeStage::Decay,
                        level: 1.0,
                    }
                } else {
                    Self {
                        stage: EnvelopeStage::Attack,
                        level,
                    }
                }
            }

            EnvelopeStage::Decay => Self::fall(self.stage, self.level * coeffs.decay_coeff),

            EnvelopeStage::Release => Self::fall(self.stage, self.level * coeffs.release_coeff),
        }
    }

    fn fall(stage: EnvelopeStage, level: f32) -> Self {
        if level < LEVEL_FLOOR {
            Self::IDLE
        } else {
            Self { stage, level }
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeParams {
    pub attack_ms: f32,
    pub decay_ms: f32,
    pub release_ms: f32,
}

impl Default for EnvelopeParams {
    fn default() -> Self {
        Self {
            attack_ms: 3.0,
            decay_ms: 1000.0,
            release_ms: 10.0,
        }
    }
}

/// Per-sample rates derived from `EnvelopeParams` at a given sample rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeCoeffs {
    pub attack_increment: f32,
    pub decay_coeff: f32,
    pub release_coeff: f32,
}

impl EnvelopeCoeffs {
    pub fn configure(params: &EnvelopeParams, sample_rate: f32) -> Self {
        let attack_samples = (0.001 * params.attack_ms.max(0.0) * sample_rate).max(1.0);
        Self {
            attack_increment: 1.0 / attack_samples,
            decay_coeff: exp_coefficient(params.decay_ms, sample_rate),
            release_coeff: exp_coefficient(params.release_ms, sample_rate),
        }
    }
}

/// Multiplier that shrinks a level by 1/e every `time_ms`.
#[inline]
pub fn exp_coefficient(time_ms: f32, sample_rate: f32) -> f32 {
    (-1.0 / (0.001 * time_ms.max(MIN_TIME_MS) * sample_rate)).exp()
}

pub struct AmplitudeEnvelope {
    params: EnvelopeParams,
    sample_rate: f32,
    coeffs: EnvelopeCoeffs,
    state: EnvelopeState,
    gate: bool,
}

impl AmplitudeEnvelope {
    pub fn new() -> Self {
        Self::with_params(EnvelopeParams::default())
    }

    pub fn with_params(params: EnvelopeParams) -> Self {
        Self {
            params,
            sample_rate: DEFAULT_SAMPLE_RATE,
            coeffs: EnvelopeCoeffs::configure(&params, DEFAULT_SAMPLE_RATE),
            state: EnvelopeState::IDLE,
            gate: false,
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        if !valid_sample_rate(sample_rate) {
            log::warn!("amplitude envelope: ignoring invalid sample rate {sample_rate}");
            return;
        }
        self.sample_rate = sample_rate;
        self.recompute();
    }

    pub fn set_attack(&mut self, ms: f32) {
        self.params.attack_ms = ms;
        self.recompute();
    }

    pub fn set_decay(&mut self, ms: f32) {
        self.params.decay_ms = ms;
        self.recompute();
    }

    pub fn set_release(&mut self, ms: f32) {
        self.params.release_ms = ms;
        self.recompute();
    }

    pub fn set_params(&mut self, params: EnvelopeParams) {
        self.params = params;
        self.recompute();
    }

    fn recompute(&mut self) {
        self.coeffs = EnvelopeCoeffs::configure(&self.params, self.sample_rate);
    }

    /// Gate high: restart the attack from zero.
    pub fn note_on(&mut self) {
        self.gate = true;
        self.state = EnvelopeState {
            stage: EnvelopeStage::Attack,
            level: 0.0,
        };
    }

    /// Gate low: release from the current level, whatever the stage.
    pub fn note_off(&mut self) {
        self.gate = false;
        self.state.stage = EnvelopeStage::Release;
    }

    /// Advance one sample and return the new level.
    pub fn process(&mut self) -> f32 {
        self.state = self.state.advance(&self.coeffs);
        debug_assert!((0.0..=1.0).contains(&self.state.level));
        self.state.level
    }

    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process();
        }
    }

    /// True between note_on and note_off, regardless of the audible level.
    pub fn is_active(&self) -> bool {
        self.gate
    }

    /// True while the level is non-zero or about to rise.
    pub fn is_sounding(&self) -> bool {
        !matches!(self.state.stage, EnvelopeStage::Idle)
    }

    pub fn reset(&mut self) {
        self.gate = false;
        self.state = EnvelopeState::IDLE;
    }

    pub fn level(&self) -> f32 {
        self.state.level
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.state.stage
    }

    pub fn coeffs(&self) -> EnvelopeCoeffs {
        self.coeffs
    }

    pub fn params(&self) -> EnvelopeParams {
        self.params
    }
}

impl Default for AmplitudeEnvelope {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 44_100.0;

    fn envelope(attack_ms: f32, decay_ms: f32, release_ms: f32) -> AmplitudeEnvelope {
        let mut env = AmplitudeEnvelope::with_params(EnvelopeParams {
            attack_ms,
            decay_ms,
            release_ms,
        });
        env.set_sample_rate(SAMPLE_RATE);
        env
    }

    fn render_samples(env: &mut AmplitudeEnvelope, samples: usize) {
        for _ in 0..samples {
            env.process();
        }
    }

    #[test]
    fn attack_reaches_full_level_in_time() {
        let mut env = envelope(3.0, 200.0, 10.0);
        env.note_on();

        let budget = (0.003_f64 * 44_100.0).ceil() as usize;
        let mut peaked = None;
        for i in 0..budget {
            if env.process() >= 1.0 {
                peaked = Some(i);
                break;
            }
        }

        assert!(peaked.is_some(), "attack did not peak within {budget} samples");
        assert_eq!(env.stage(), EnvelopeStage::Decay);

        let before = env.level();
        env.process();
        assert!(env.level() < before, "decay should start right after the peak");
    }

    #[test]
    fn decay_runs_to_idle_while_gate_held() {
        let mut env = envelope(0.0, 5.0, 10.0);
        env.note_on();
        render_samples(&mut env, 44_100);

        assert_eq!(env.stage(), EnvelopeStage::Idle);
        assert_eq!(env.level(), 0.0);
        assert!(env.is_active(), "gate stays high until note_off");
    }

    #[test]
    fn release_from_any_stage_is_non_increasing() {
        for &hold in &[0usize, 40, 400, 4_000] {
            let mut env = envelope(3.0, 300.0, 20.0);
            env.note_on();
            render_samples(&mut env, hold);

            env.note_off();
            assert_eq!(env.stage(), EnvelopeStage::Release);
            assert!(!env.is_active());

            let mut previous = env.level();
            for _ in 0..44_100 {
                let level = env.process();
                assert!(level <= previous, "release rose from {previous} to {level}");
                previous = level;
            }
            assert_eq!(env.stage(), EnvelopeStage::Idle);
            assert_eq!(env.level(), 0.0);
        }
    }

    #[test]
    fn note_on_restarts_from_zero() {
        let mut env = envelope(10.0, 300.0, 20.0);
        env.note_on();
        render_samples(&mut env, 1_000);
        assert!(env.level() > 0.5);

        env.note_on();
        assert_eq!(env.level(), 0.0);
        assert_eq!(env.stage(), EnvelopeStage::Attack);
    }

    #[test]
    fn changing_times_keeps_current_level() {
        let mut env = envelope(1.0, 500.0, 20.0);
        env.note_on();
        render_samples(&mut env, 2_000);
        let level = env.level();

        env.set_decay(50.0);
        assert_eq!(env.level(), level);
        env.process();
        assert!(env.level() < level);
    }

    #[test]
    fn advance_is_pure() {
        let coeffs = EnvelopeCoeffs::configure(&EnvelopeParams::default(), SAMPLE_RATE);
        let state = EnvelopeState {
            stage: EnvelopeStage::Decay,
            level: 0.5,
        };
        assert_eq!(state.advance(&coeffs), state.advance(&coeffs));
        assert_eq!(EnvelopeState::IDLE.advance(&coeffs), EnvelopeState::IDLE);

        let tail = EnvelopeState {
            stage: EnvelopeStage::Release,
            level: LEVEL_FLOOR * 1.000_01,
        };
        assert_eq!(tail.advance(&coeffs), EnvelopeState::IDLE);
    }

    #[test]
    fn coefficients_follow_time_constants() {
        let coeffs = EnvelopeCoeffs::configure(
            &EnvelopeParams {
                attack_ms: 0.0,
                decay_ms: 1_000.0,
                release_ms: -5.0,
            },
            1_000.0,
        );
        assert_eq!(coeffs.attack_increment, 1.0);
        assert!((coeffs.decay_coeff - (-1.0f32 / 1_000.0).exp()).abs() < 1e-7);
        assert!(coeffs.release_coeff > 0.0 && coeffs.release_coeff < 1.0);
    }
}
