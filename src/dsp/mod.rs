//! Low-level DSP primitives for the acid voice.
//!
//! Everything here is allocation-free in the per-sample path and safe to
//! embed directly inside a voice struct. The oscillator, the two envelopes
//! and the ladder filter form the voice's core loop; the remaining stages are
//! plain sample-in/sample-out effects that sit after it.

/// DC blocker and one-pole highpass.
pub mod dc_blocker;
/// One-shot exponential decay (filter sweep and accent).
pub mod decay;
/// Stereo feedback delay with a two-phase lifecycle.
pub mod delay;
/// Multi-mode waveshaping distortion.
pub mod distortion;
/// Attack/decay/release amplitude envelope.
pub mod envelope;
/// Four-stage diode ladder lowpass with resonance and cutoff modulation.
pub mod ladder;
/// PolyBLEP saw/square oscillator with sub layer and glide.
pub mod oscillator;
/// The shared sample-in/sample-out trait.
pub mod processor;
/// Leaky integrator for control smoothing.
pub mod smoother;

pub use decay::ModulationEnvelope;
pub use envelope::{AmplitudeEnvelope, EnvelopeStage};
pub use ladder::LadderFilter;
pub use oscillator::{Oscillator, Waveform};
pub use processor::SampleProcessor;
