//! Realtime-safe synthesis core for a monophonic, analog-modeled acid bass
//! voice: a band-limited oscillator with glide and sub layer, a resonant
//! diode-ladder lowpass, an attack/decay/release amplitude envelope and a
//! trigger/decay modulation envelope, plus the small effect stages a voice
//! hands its output to.

pub mod dsp;
pub mod error;
pub mod synth; // Voice orchestration and control handoff

pub use error::{Error, Result};

/// Sample rate every unit assumes until `set_sample_rate` is called.
pub const DEFAULT_SAMPLE_RATE: f32 = 44_100.0;
/// Largest block `AcidVoice::render_block` is expected to see in one call.
pub const MAX_BLOCK_SIZE: usize = 2048;
/// Floor for every time constant, in milliseconds.
pub(crate) const MIN_TIME_MS: f32 = 0.1;

/// Returns true when `sample_rate` can drive coefficient derivation.
#[inline]
pub(crate) fn valid_sample_rate(sample_rate: f32) -> bool {
    sample_rate.is_finite() && sample_rate > 0.0
}
