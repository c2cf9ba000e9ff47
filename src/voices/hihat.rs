//! Hi-hat voice (closed, open and pedal).
//!
//! Metallic noise from three square waves at unrelated frequencies, combined
//! with XOR, then darkened by a one-pole low-pass. The three hats differ only
//! in decay rate.
//!
//! # How It Works
//!
//! ```text
//!   sq(215) ─┐
//!   sq(341) ─┼─ XOR ─→ ±1 ─→ low-pass ─→ × exp(-decay · t)
//!   sq(456) ─┘
//! ```
//!
//! XOR of the "high" halves gives a dense, clangy pulse train with far more
//! inharmonic content than the sum of the squares would.

use crate::dsp::{envelope::exp_decay, filter::OnePoleLowpass, oscillator::square_high};

use super::HatParams;

pub(super) fn render(params: &HatParams, decay: f32, out: &mut [f32], sample_rate: f32) {
    let level = params.level.clamp(0.0, 1.0);
    let [a, b, c] = params.frequencies;
    let mut lowpass = OnePoleLowpass::new(params.cutoff, sample_rate);

    for (n, sample) in out.iter_mut().enumerate() {
        let t = n as f32 / sample_rate;
        let high = square_high(a, t) ^ square_high(b, t) ^ square_high(c, t);
        let metal = if high { 1.0 } else { -1.0 };
        *sample = lowpass.next_sample(metal) * exp_decay(t, decay) * level;
    }
}
