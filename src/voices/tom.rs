//! Tom voices.
//!
//! A sine that starts a little sharp and bends down to its nominal pitch
//! over the first 20ms, like a struck membrane settling. The three toms share
//! the model and differ only in pitch.

use crate::dsp::{
    envelope::{exp_decay, linear_fade},
    oscillator::PhaseOscillator,
};

use super::TomParams;

pub(super) fn render(params: &TomParams, frequency: f32, out: &mut [f32], sample_rate: f32) {
    let mut osc = PhaseOscillator::new();

    for (n, sample) in out.iter_mut().enumerate() {
        let t = n as f32 / sample_rate;
        let bent = frequency * (1.0 + params.bend * linear_fade(t, params.bend_time));
        *sample = osc.next_sine(bent, sample_rate) * exp_decay(t, params.decay);
    }
}
