//! Benchmarks for automation lookups.
//!
//! The graph evaluates every voice gain once per sample, so `value_at` sits
//! on the hottest path of the mix.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use drumpad::dsp::AudioParam;

use crate::BLOCK_SIZES;

pub fn bench_param(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/param");
    let step = 1.0 / 48_000.0;

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        let flat = AudioParam::new(0.8);
        group.bench_with_input(BenchmarkId::new("constant", size), &size, |b, _| {
            b.iter(|| {
                for (i, sample) in buffer.iter_mut().enumerate() {
                    *sample = flat.value_at(black_box(i as f64 * step));
                }
            })
        });

        // A choke in progress: hold, linear fade, restore
        let mut choke = AudioParam::new(0.8);
        choke.set_value_at_time(0.8, 0.0);
        choke.linear_ramp_to_value_at_time(0.0001, 0.01);
        choke.set_value_at_time(0.8, 0.03);
        group.bench_with_input(BenchmarkId::new("choke", size), &size, |b, _| {
            b.iter(|| {
                for (i, sample) in buffer.iter_mut().enumerate() {
                    *sample = choke.value_at(black_box(i as f64 * step));
                }
            })
        });

        // Metronome click envelope
        let mut click = AudioParam::new(0.0);
        click.set_value_at_time(0.0, 0.0);
        click.linear_ramp_to_value_at_time(0.5, 0.001);
        click.exponential_ramp_to_value_at_time(0.001, 0.031);
        group.bench_with_input(BenchmarkId::new("click", size), &size, |b, _| {
            b.iter(|| {
                for (i, sample) in buffer.iter_mut().enumerate() {
                    *sample = click.value_at(black_box(i as f64 * step));
                }
            })
        });
    }

    group.finish();
}
