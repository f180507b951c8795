//! Transient, host-supplied configuration for a whole voice.
//!
//! Nothing here is persisted by the crate; the `serde` feature only makes the
//! structs easy for a host to store presets with.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::{
    delay::DEFAULT_MAX_DELAY_SAMPLES, distortion::DistortionParams, envelope::EnvelopeParams,
    ladder::FilterParams, oscillator::OscillatorParams,
};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayParams {
    /// Buffer length per channel, fixed once `begin` has run.
    pub max_delay_samples: usize,
    pub time_ms_l: f32,
    pub time_ms_r: f32,
    pub feedback: f32,
    /// 0.0 keeps the delay silent.
    pub mix: f32,
}

impl Default for DelayParams {
    fn default() -> Self {
        Self {
            max_delay_samples: DEFAULT_MAX_DELAY_SAMPLES,
            time_ms_l: 250.0,
            time_ms_r: 375.0,
            feedback: 0.3,
            mix: 0.0,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceParams {
    pub osc: OscillatorParams,
    pub amp_env: EnvelopeParams,
    pub filter: FilterParams,
    /// Decay of the filter sweep envelope.
    pub filter_env_decay_ms: f32,
    /// Decay of the accent envelope.
    pub accent_decay_ms: f32,
    /// Portamento time for slid notes.
    pub glide_ms: f32,
    /// Extra amplitude at full accent (0.5 = +50%).
    pub accent_gain: f32,
    /// Smoothing applied to host cutoff changes.
    pub cutoff_smoothing_ms: f32,
    pub distortion: DistortionParams,
    pub dc_cutoff_hz: f32,
    pub delay: DelayParams,
}

impl Default for VoiceParams {
    fn default() -> Self {
        Self {
            osc: OscillatorParams::default(),
            amp_env: EnvelopeParams::default(),
            filter: FilterParams {
                cutoff_hz: 500.0,
                resonance: 0.6,
                env_mod_hz: 2_500.0,
                accent_mod_hz: 1_500.0,
                fm_amount: 0.0,
            },
            filter_env_decay_ms: 200.0,
            accent_decay_ms: 200.0,
            glide_ms: 60.0,
            accent_gain: 0.5,
            cutoff_smoothing_ms: 15.0,
            distortion: DistortionParams::default(),
            dc_cutoff_hz: 25.0,
            delay: DelayParams::default(),
        }
    }
}
