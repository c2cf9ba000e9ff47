//! Scenario benchmarks.
//!
//! Offline synthesis of single voices and whole kits, and the render side
//! of the graph with many hits overlapping.

mod mix;
mod voices;

pub use mix::bench_mix;
pub use voices::bench_voices;
