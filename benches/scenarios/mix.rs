//! Benchmarks for the render side of the graph.
//!
//! A busy performance: rolls on every pad plus the metronome, with the open
//! hat being choked and the recording tap connected.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use drumpad::{
    graph::{build_graph, AudioClock, MAX_SOURCES},
    EngineConfig, Kit, KitFlavor, Voice,
};

use crate::BLOCK_SIZES;

const SR: u32 = 48_000;

pub fn bench_mix(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/mix");
    let kit = Kit::synthesize(KitFlavor::Rock, SR);
    let config = EngineConfig::default();

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Idle graph: bus, master and limiter only
        let (_handle, mut graph) = build_graph(SR, &config);
        group.bench_with_input(BenchmarkId::new("idle", size), &size, |b, _| {
            b.iter(|| graph.render_block(black_box(&mut buffer)))
        });

        // Source pool kept full
        let (mut handle, mut graph) = build_graph(SR, &config);
        let mut tap = handle.connect_recording_tap(SR as usize).ok();
        let mut captured = Vec::with_capacity(SR as usize);
        let mut next = 0;
        group.bench_with_input(BenchmarkId::new("full_pool", size), &size, |b, _| {
            b.iter(|| {
                let now = handle.current_time();
                for _ in graph.active_sources()..MAX_SOURCES {
                    let voice = Voice::ALL[next % Voice::COUNT];
                    next += 1;
                    if voice.chokes_open_hat() {
                        handle.voice_gain(Voice::HatOpen).choke(now);
                    }
                    handle.play(voice, kit.buffer(voice).clone(), 0.9, now);
                }
                handle.click(now);

                graph.render_block(black_box(&mut buffer));
                handle.reclaim();

                if let Some(tap) = tap.as_mut() {
                    captured.clear();
                    tap.drain_into(&mut captured);
                }
            })
        });
    }

    group.finish();
}
