//! Snare drum voice.
//!
//! White noise for the wires, a short sine for the drum head. The noise
//! decays a little slower than the tone, so the tail is mostly rattle.

use crate::dsp::{
    envelope::exp_decay,
    oscillator::{sine_at, Noise},
};

use super::SnareParams;

pub(super) fn render(params: &SnareParams, noise: &mut Noise, out: &mut [f32], sample_rate: f32) {
    let noise_mix = params.noise_mix.clamp(0.0, 1.0);
    let tone_mix = 1.0 - noise_mix;

    for (n, sample) in out.iter_mut().enumerate() {
        let t = n as f32 / sample_rate;
        let wires = noise.next_sample() * exp_decay(t, params.noise_decay);
        let head = sine_at(params.tone_frequency, t) * exp_decay(t, params.tone_decay);
        *sample = wires * noise_mix + head * tone_mix;
    }
}
