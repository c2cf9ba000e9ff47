//! Kick drum voice.
//!
//! A sine whose pitch falls exponentially from a high "punch" frequency to a
//! low fundamental, plus a few milliseconds of noise for the beater click.
//!
//! # How It Works
//!
//! 1. Pitch envelope: `f(t) = end + (start - end) · exp(-sweep · t)`
//! 2. The phase is accumulated sample by sample, so the sweep stays continuous
//! 3. Body amplitude decays with `exp(-decay · t)`
//! 4. A linearly fading noise burst sits on top of the first 5ms
//!
//! # Variations
//!
//! - Lower decay rate = boomy 808-style kick
//! - Higher start pitch = more attack
//! - Louder click = more acoustic beater

use crate::dsp::{
    envelope::{exp_decay, linear_fade},
    oscillator::{Noise, PhaseOscillator},
};

use super::KickParams;

pub(super) fn render(params: &KickParams, noise: &mut Noise, out: &mut [f32], sample_rate: f32) {
    let click_level = params.click_level.clamp(0.0, 1.0);
    let body_level = 1.0 - click_level;
    let mut osc = PhaseOscillator::new();

    for (n, sample) in out.iter_mut().enumerate() {
        let t = n as f32 / sample_rate;

        let frequency = params.end_frequency
            + (params.start_frequency - params.end_frequency) * exp_decay(t, params.sweep_rate);
        let body = osc.next_sine(frequency, sample_rate) * exp_decay(t, params.decay);

        // Noise is drawn for every sample so the stream stays aligned
        let click = noise.next_sample() * linear_fade(t, params.click_length);

        *sample = body * body_level + click * click_level;
    }
}
