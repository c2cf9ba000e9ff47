//! Benchmarks for the one-pole filters.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use drumpad::dsp::filter::{DcBlocker, OnePoleLowpass};
use drumpad::dsp::oscillator::Noise;

use crate::BLOCK_SIZES;

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");

    for &size in BLOCK_SIZES {
        let mut noise = Noise::seeded(1);
        let input: Vec<f32> = (0..size).map(|_| noise.next_sample()).collect();
        let mut buffer = input.clone();

        let mut lowpass = OnePoleLowpass::new(8_000.0, 48_000.0);
        group.bench_with_input(BenchmarkId::new("lowpass", size), &size, |b, _| {
            b.iter(|| {
                for (out, &x) in buffer.iter_mut().zip(&input) {
                    *out = lowpass.next_sample(black_box(x));
                }
            })
        });

        let mut blocker = DcBlocker::new();
        group.bench_with_input(BenchmarkId::new("dc_blocker", size), &size, |b, _| {
            b.iter(|| {
                for (out, &x) in buffer.iter_mut().zip(&input) {
                    *out = blocker.next_sample(black_box(x));
                }
            })
        });
    }

    group.finish();
}
