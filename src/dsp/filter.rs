use std::f32::consts::TAU;

/*
One-Pole Filters
================

The drum models only need two very small filters, both first order:

| filter            | difference equation                 | used for            |
| ----------------- | ----------------------------------- | ------------------- |
| one-pole low-pass | y[n] = y[n-1] + a·(x[n] - y[n-1])   | hi-hat brightness   |
| DC blocker        | y[n] = x[n] - x[n-1] + R·y[n-1]     | every voice, last   |


Low-pass coefficient
--------------------

The smoothing coefficient comes from the cutoff frequency:

    a = 1 - exp(-2π · fc / sample_rate)

  a → 0   heavy smoothing (cutoff near 0 Hz)
  a → 1   no smoothing    (cutoff near Nyquist and beyond)

At 48kHz an 8kHz cutoff gives a ≈ 0.65: the XOR'd square waves of the hi-hat
keep their metallic edge but lose the harshest aliasing.


DC blocker
----------

A differentiator (x[n] - x[n-1]) followed by a leaky integrator (R = 0.995).
It removes any constant offset a model leaves behind - the kick's pitch sweep
and the noise click are not zero-mean - while passing everything above a few
tens of Hz almost untouched.

The impulse response is h[0] = 1, h[n] = -(1-R)·R^(n-1), whose absolute sum is
2. An input bounded by 1 therefore can never leave [-2, 2].
*/

/// Pole radius of the DC blocker.
pub const DC_BLOCK_POLE: f32 = 0.995;

/// Smoothing coefficient for a one-pole low-pass at `cutoff_hz`.
#[inline]
pub fn one_pole_coefficient(cutoff_hz: f32, sample_rate: f32) -> f32 {
    1.0 - (-TAU * cutoff_hz.max(0.0) / sample_rate).exp()
}

#[derive(Debug, Clone, Copy)]
pub struct OnePoleLowpass {
    coefficient: f32,
    state: f32,
}

impl OnePoleLowpass {
    pub fn new(cutoff_hz: f32, sample_rate: f32) -> Self {
        Self {
            coefficient: one_pole_coefficient(cutoff_hz, sample_rate),
            state: 0.0,
        }
    }

    #[inline]
    pub fn next_sample(&mut self, sample: f32) -> f32 {
        self.state += self.coefficient * (sample - self.state);
        self.state
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DcBlocker {
    pole: f32,
    last_input: f32,
    last_output: f32,
}

impl DcBlocker {
    pub fn new() -> Self {
        Self::with_pole(DC_BLOCK_POLE)
    }

    pub fn with_pole(pole: f32) -> Self {
        Self {
            pole,
            last_input: 0.0,
            last_output: 0.0,
        }
    }

    #[inline]
    pub fn next_sample(&mut self, sample: f32) -> f32 {
        let out = sample - self.last_input + self.pole * self.last_output;
        self.last_input = sample;
        self.last_output = out;
        out
    }

    /// Filter a whole buffer in place, starting from silence.
    pub fn process_buffer(buffer: &mut [f32]) {
        let mut blocker = Self::new();
        for sample in buffer.iter_mut() {
            *sample = blocker.next_sample(*sample);
        }
    }
}

impl Default for DcBlocker {
    fn default() -> Self {
        Self::new()
    }
}
