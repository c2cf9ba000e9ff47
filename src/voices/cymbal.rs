//! Crash and ride cymbals.
//!
//! Five inharmonic sine partials averaged together, blended with white
//! noise, under one slow exponential decay. The ride decays slower than the
//! crash and has the longer buffer.

use crate::dsp::{
    envelope::exp_decay,
    oscillator::{sine_at, Noise},
};

use super::CymbalParams;

pub(super) fn render(
    params: &CymbalParams,
    decay: f32,
    noise: &mut Noise,
    out: &mut [f32],
    sample_rate: f32,
) {
    let tone_mix = params.tone_mix.clamp(0.0, 1.0);
    let noise_mix = 1.0 - tone_mix;
    let partial_count = params.partials.len() as f32;

    for (n, sample) in out.iter_mut().enumerate() {
        let t = n as f32 / sample_rate;
        let partials: f32 = params.partials.iter().map(|&f| sine_at(f, t)).sum();
        let shimmer = partials / partial_count * tone_mix + noise.next_sample() * noise_mix;
        *sample = shimmer * exp_decay(t, decay);
    }
}
