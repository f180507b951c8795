//! Real-world scenario benchmarks.
//!
//! These drive a complete voice the way a host would, with notes and
//! parameter changes arriving between blocks.

mod voice;

pub use voice::bench_voice;
