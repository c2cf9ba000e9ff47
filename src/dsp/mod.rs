//! Low-level DSP primitives used by the drum models and the signal graph.
//!
//! Everything here is plain math over `f32` samples: no allocation in the
//! per-sample paths, no knowledge of voices or kits. The synthesis code in
//! `voices` and the render loop in `graph` layer their orchestration on top.

/// Tanh soft-clip curve and table waveshaper.
pub mod distortion;
/// Closed-form percussive envelopes.
pub mod envelope;
/// One-pole low-pass and DC blocker.
pub mod filter;
/// Phase-accumulating sine, square sign and seeded noise.
pub mod oscillator;
/// Automation timeline for gains scheduled on the audio clock.
pub mod param;

pub use param::AudioParam;
