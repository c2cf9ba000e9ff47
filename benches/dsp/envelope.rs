//! Benchmarks for the closed-form decay curves.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use drumpad::dsp::envelope::{exp_decay, linear_fade};

use crate::BLOCK_SIZES;

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");
    let step = 1.0 / 48_000.0;

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // One exp() per sample
        group.bench_with_input(BenchmarkId::new("exp_decay", size), &size, |b, _| {
            b.iter(|| {
                for (i, sample) in buffer.iter_mut().enumerate() {
                    *sample = exp_decay(i as f32 * step, black_box(5.0));
                }
            })
        });

        group.bench_with_input(BenchmarkId::new("linear_fade", size), &size, |b, _| {
            b.iter(|| {
                for (i, sample) in buffer.iter_mut().enumerate() {
                    *sample = linear_fade(i as f32 * step, black_box(0.005));
                }
            })
        });
    }

    group.finish();
}
