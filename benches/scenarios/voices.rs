//! Benchmarks for offline drum synthesis.
//!
//! Buffer length depends on the voice, not the block size, so these run
//! once per voice instead of per block size.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use drumpad::{synthesize, synthesize_kit, KitFlavor, Voice};

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");
    group.sample_size(20);

    for voice in Voice::ALL {
        group.bench_with_input(BenchmarkId::new("voice", voice), &voice, |b, &voice| {
            b.iter(|| synthesize(black_box(voice), KitFlavor::Rock, 48_000))
        });
    }

    // Full flavor switch: all ten buffers
    for flavor in KitFlavor::ALL {
        group.bench_with_input(BenchmarkId::new("kit", flavor), &flavor, |b, &flavor| {
            b.iter(|| synthesize_kit(black_box(flavor), 48_000))
        });
    }

    group.finish();
}
