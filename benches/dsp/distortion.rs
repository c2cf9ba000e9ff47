//! Benchmarks for the output soft clipper.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use drumpad::dsp::distortion::{soft_clip, SoftClip, DEFAULT_DRIVE};

use crate::BLOCK_SIZES;

pub fn bench_distortion(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/distortion");
    let clipper = SoftClip::default();

    for &size in BLOCK_SIZES {
        // Ramp across [-1.5, 1.5] so every table segment and the clamp are hit
        let input: Vec<f32> = (0..size)
            .map(|i| i as f32 / size as f32 * 3.0 - 1.5)
            .collect();
        let mut buffer = input.clone();

        // Table lookup with interpolation
        group.bench_with_input(BenchmarkId::new("table", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                clipper.apply_buffer(black_box(&mut buffer));
            })
        });

        // Direct tanh per sample, for comparison
        group.bench_with_input(BenchmarkId::new("tanh", size), &size, |b, _| {
            b.iter(|| {
                for (out, &x) in buffer.iter_mut().zip(&input) {
                    *out = soft_clip(black_box(x), DEFAULT_DRIVE);
                }
            })
        });
    }

    group.finish();
}
