/*
Percussive Envelopes
====================

Struck instruments have no sustain: energy enters once and bleeds away. The
drum models therefore use a single closed-form envelope instead of an ADSR
state machine:

    level(t) = exp(-t · decay_rate)

Vocabulary
----------

  decay_rate   Nepers per second. After 1/decay_rate seconds the level has
               fallen to 1/e (about -8.7 dB).

  t60          Time to fall 60 dB: t60 = ln(1000) / decay_rate ≈ 6.9 / rate.
               A kick at rate 5 rings for ~1.4s, a closed hat at rate 40 for
               ~0.17s.

Because the envelope is a pure function of time, a buffer can be rendered
sample-by-sample with no state at all, and two renders of the same voice are
bit-identical.

The Shape
---------

  Level
    1.0 ┐╲
        │ ╲
        │  ╲__
        │     ╲___
    0.0 └─────────╲____________→ Time

Attack is instantaneous; all the character lives in the decay rate and in
whatever the envelope multiplies.
*/

/// Exponential decay `exp(-t · rate)`.
#[inline]
pub fn exp_decay(t: f32, rate: f32) -> f32 {
    (-t * rate).exp()
}

/// Linear fade from 1 at `t = 0` to 0 at `t = length`, zero afterwards.
#[inline]
pub fn linear_fade(t: f32, length: f32) -> f32 {
    if length <= 0.0 || t >= length {
        0.0
    } else {
        1.0 - t / length
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decay_starts_at_unity_and_falls() {
        assert_eq!(exp_decay(0.0, 10.0), 1.0);
        assert!(exp_decay(0.1, 10.0) < exp_decay(0.05, 10.0));
        assert!((exp_decay(0.1, 10.0) - (-1.0f32).exp()).abs() < 1e-6);
    }

    #[test]
    fn linear_fade_reaches_zero() {
        assert_eq!(linear_fade(0.0, 0.005), 1.0);
        assert!((linear_fade(0.0025, 0.005) - 0.5).abs() < 1e-6);
        assert_eq!(linear_fade(0.005, 0.005), 0.0);
        assert_eq!(linear_fade(1.0, 0.0), 0.0);
    }
}
