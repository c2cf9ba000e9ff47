//! Benchmarks for per-sample DSP primitives.

mod distortion;
mod envelope;
mod filter;
mod oscillator;
mod param;

pub use distortion::bench_distortion;
pub use envelope::bench_envelope;
pub use filter::bench_filter;
pub use oscillator::bench_oscillator;
pub use param::bench_param;
