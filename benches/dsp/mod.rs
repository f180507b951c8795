//! Benchmarks for individual units.

mod effects;
mod envelope;
mod filter;
mod oscillator;

pub use effects::bench_effects;
pub use envelope::bench_envelope;
pub use filter::bench_filter;
pub use oscillator::bench_oscillator;
