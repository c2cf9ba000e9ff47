//! Benchmarks for the sample generators used by the drum models.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use drumpad::dsp::oscillator::{square_high, Noise, PhaseOscillator};

use crate::BLOCK_SIZES;

const SR: f32 = 48_000.0;

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Accumulated phase, one sin() per sample
        let mut osc = PhaseOscillator::new();
        group.bench_with_input(BenchmarkId::new("sine", size), &size, |b, _| {
            b.iter(|| {
                for sample in buffer.iter_mut() {
                    *sample = osc.next_sine(black_box(440.0), SR);
                }
            })
        });

        // Three XOR'd squares, as in the hi-hat
        group.bench_with_input(BenchmarkId::new("square_xor", size), &size, |b, _| {
            b.iter(|| {
                for (i, sample) in buffer.iter_mut().enumerate() {
                    let t = i as f32 / SR;
                    let high = square_high(215.0, t) ^ square_high(341.0, t) ^ square_high(456.0, t);
                    *sample = if high { 1.0 } else { -1.0 };
                }
                black_box(&buffer);
            })
        });

        // Seeded PCG
        let mut noise = Noise::seeded(7);
        group.bench_with_input(BenchmarkId::new("noise", size), &size, |b, _| {
            b.iter(|| {
                for sample in buffer.iter_mut() {
                    *sample = noise.next_sample();
                }
                black_box(&buffer);
            })
        });
    }

    group.finish();
}
