//! Soft clipping / waveshaping
//!
//! Several pads hit at once can sum well past full scale. Rather than letting
//! the output device hard-clip, the whole mix runs through a smooth transfer
//! curve that bends peaks back towards ±1.
//!
//! # The Curve
//!
//!   f(x) = tanh(2k·x) / tanh(2k)        k = drive (0.9)
//!
//! - Odd and monotonic, so f(0) = 0 and the signal never flips sign
//! - Normalised by tanh(2k), so f(±1) = ±1 exactly
//! - Near zero the slope is 2k / tanh(2k) ≈ 1.9, quiet hits get a little
//!   louder while loud sums are compressed
//!
//! # Lookup Table
//!
//! The curve is sampled once into a table covering [-1, 1] and applied with
//! linear interpolation between neighbouring points. Inputs outside [-1, 1]
//! clamp to the end points, which is how a waveshaper with a fixed curve
//! behaves:
//!
//!   index = (x + 1) / 2 · (N - 1)
//!
//! An odd point count puts a table entry exactly on x = 0.

/// Drive constant of the output limiter.
pub const DEFAULT_DRIVE: f32 = 0.9;

/// Number of points in the limiter table.
pub const DEFAULT_POINTS: usize = 2049;

/// Evaluate the normalised tanh soft-clip curve directly.
#[inline]
pub fn soft_clip(x: f32, drive: f32) -> f32 {
    let k = 2.0 * drive;
    (k * x).tanh() / k.tanh()
}

/// Build the curve table with `points` entries spanning [-1, 1].
pub fn soft_clip_curve(drive: f32, points: usize) -> Vec<f32> {
    let points = points.max(2);
    let last = (points - 1) as f32;
    (0..points)
        .map(|i| {
            let x = i as f32 * 2.0 / last - 1.0;
            soft_clip(x, drive)
        })
        .collect()
}

/// Table-driven waveshaper used as the graph's limiter.
#[derive(Debug, Clone)]
pub struct SoftClip {
    curve: Vec<f32>,
}

impl SoftClip {
    pub fn new(drive: f32, points: usize) -> Self {
        Self {
            curve: soft_clip_curve(drive, points),
        }
    }

    /// The sampled transfer curve.
    pub fn curve(&self) -> &[f32] {
        &self.curve
    }

    /// Shape one sample.
    #[inline]
    pub fn apply(&self, sample: f32) -> f32 {
        let last = self.curve.len() - 1;
        // NaN falls through to the low end rather than indexing garbage
        let x = if sample.is_nan() { 0.0 } else { sample.clamp(-1.0, 1.0) };
        let position = (x + 1.0) * 0.5 * last as f32;
        let index = (position as usize).min(last);
        if index == last {
            return self.curve[last];
        }
        let frac = position - index as f32;
        let a = self.curve[index];
        let b = self.curve[index + 1];
        a + (b - a) * frac
    }

    /// Shape a whole buffer in place.
    pub fn apply_buffer(&self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.apply(*sample);
        }
    }
}

impl Default for SoftClip {
    fn default() -> Self {
        Self::new(DEFAULT_DRIVE, DEFAULT_POINTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curve_is_monotonic() {
        let curve = soft_clip_curve(DEFAULT_DRIVE, DEFAULT_POINTS);
        assert!(curve.len() >= 1024);
        for pair in curve.windows(2) {
            assert!(pair[1] >= pair[0], "curve must not decrease: {pair:?}");
        }
    }

    #[test]
    fn curve_hits_unity_and_zero() {
        let shaper = SoftClip::default();
        assert!((shaper.apply(1.0) - 1.0).abs() < 1e-5);
        assert!((shaper.apply(-1.0) + 1.0).abs() < 1e-5);
        assert_eq!(shaper.apply(0.0), 0.0);
    }

    #[test]
    fn out_of_range_input_is_bounded() {
        let shaper = SoftClip::default();
        for &x in &[1.5, 4.0, -3.0, 100.0, f32::INFINITY, f32::NEG_INFINITY, f32::NAN] {
            let y = shaper.apply(x);
            assert!(y.is_finite());
            assert!(y.abs() <= 1.0 + 1e-6, "{x} shaped to {y}");
        }
    }

    #[test]
    fn interpolation_tracks_closed_form() {
        let shaper = SoftClip::default();
        for i in 0..200 {
            let x = -1.0 + i as f32 * 0.01;
            let expected = soft_clip(x, DEFAULT_DRIVE);
            assert!((shaper.apply(x) - expected).abs() < 1e-4);
        }
    }

    #[test]
    fn quiet_signals_gain_loud_signals_compress() {
        let shaper = SoftClip::default();
        assert!(shaper.apply(0.1) > 0.1);
        assert!(shaper.apply(0.9) < 1.0);
    }
}
