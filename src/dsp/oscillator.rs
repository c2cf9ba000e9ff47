use std::f32::consts::TAU;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/*
Oscillators for offline synthesis
=================================

Drum buffers are rendered once, ahead of time, so the oscillators here are
plain sample generators rather than block-rendering graph nodes.

Phase accumulation
------------------

A sine with a *changing* frequency (kick sweep, tom bend) cannot be written
as sin(2π·f(t)·t): that formula jumps whenever f changes. Instead the phase
is integrated one sample at a time:

    phase += 2π · f(t) / sample_rate
    out    = sin(phase)

For constant frequencies the two are identical; for sweeps only the
accumulated form is continuous.

Square "sign" waves
-------------------

The hi-hat model only needs the sign of a square wave, as a boolean:

    high(t) = fract(f·t) < 0.5

Three of these XOR'd together at non-harmonic frequencies produce a dense,
clangy pseudo-noise - the classic analog drum machine cymbal trick.

Noise
-----

White noise comes from a seeded PCG generator, uniform in [-1, 1). A fixed
seed makes every kit render bit-identical from run to run.
*/

/// Sine oscillator with an integrated phase.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhaseOscillator {
    phase: f32,
}

impl PhaseOscillator {
    pub fn new() -> Self {
        Self { phase: 0.0 }
    }

    /// Produce the next sample at `frequency`, then advance the phase.
    #[inline]
    pub fn next_sine(&mut self, frequency: f32, sample_rate: f32) -> f32 {
        let out = self.phase.sin();
        self.phase += TAU * frequency / sample_rate;
        if self.phase >= TAU {
            self.phase -= TAU;
        }
        out
    }
}

/// Sine at a fixed frequency evaluated at absolute time `t`.
#[inline]
pub fn sine_at(frequency: f32, t: f32) -> f32 {
    (TAU * frequency * t).sin()
}

/// Whether a square wave at `frequency` is in its high half at time `t`.
#[inline]
pub fn square_high(frequency: f32, t: f32) -> bool {
    (frequency * t).fract() < 0.5
}

/// Seeded uniform white noise in [-1, 1).
#[derive(Debug, Clone)]
pub struct Noise {
    rng: Pcg32,
}

impl Noise {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        self.rng.random::<f32>() * 2.0 - 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_oscillator_matches_closed_form() {
        let sr = 48_000.0;
        let mut osc = PhaseOscillator::new();
        for n in 0..64 {
            let expected = sine_at(440.0, n as f32 / sr);
            let actual = osc.next_sine(440.0, sr);
            assert!((actual - expected).abs() < 1e-3, "sample {n}: {actual} vs {expected}");
        }
    }

    #[test]
    fn square_has_even_duty_cycle() {
        let sr = 48_000.0;
        let high = (0..48_000).filter(|&n| square_high(100.0, n as f32 / sr)).count();
        assert!((high as i64 - 24_000).abs() < 100);
    }

    #[test]
    fn noise_is_deterministic_and_bounded() {
        let mut a = Noise::seeded(7);
        let mut b = Noise::seeded(7);
        for _ in 0..1_000 {
            let x = a.next_sample();
            assert_eq!(x, b.next_sample());
            assert!((-1.0..1.0).contains(&x));
        }
    }
}
