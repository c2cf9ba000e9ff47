//! Routing topology: per-voice gains, master gain, soft clip, recording tap.
//!
//! The graph is split in two halves that never share a lock:
//!
//! ```text
//!   control thread                         render context
//!   ──────────────                         ──────────────
//!   GraphHandle ── rtrb<GraphCommand> ──→ SignalGraph::render_block
//!        ↑  ↑                                    │
//!        │  └───── rtrb<Source> (retired) ←──────┤
//!        └──────── AtomicU64 frame clock ←───────┘
//! ```
//!
//! Finished and stolen sources travel back to the control side so the last
//! reference to a replaced kit's buffers is never released on the render
//! thread. `GraphHandle::reclaim` drops them.
//!
//! Inside `SignalGraph` every playing source is mixed into the bus of its
//! voice, each bus is scaled by that voice's persistent gain, the sum plus the
//! click bus goes through the master gain and the soft clipper, and the result
//! is written to the output and (if connected) the recording tap.
//!
//! # Example
//!
//! ```ignore
//! let (mut handle, mut graph) = graph::build_graph(48_000, &EngineConfig::default());
//! let kit = voices::synthesize_kit(KitFlavor::Rock, 48_000);
//!
//! let at = handle.current_time() + 0.01;
//! handle.play(Voice::Kick, kit.buffer(Voice::Kick).clone(), 0.9, at);
//!
//! let mut out = vec![0.0; 512];
//! graph.render_block(&mut out); // normally called by the audio callback
//! ```

mod message;
mod source;

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use rtrb::{Consumer, Producer, PushError, RingBuffer};

use crate::{
    config::{ChokeConfig, ClickConfig, EngineConfig},
    dsp::{distortion::SoftClip, AudioParam},
    error::EngineError,
    voices::{AudioBuffer, Voice},
    MAX_BLOCK_SIZE,
};

pub use message::GraphCommand;
pub use source::{BufferSource, ClickSource, Source};

/// Upper bound on simultaneously playing sources.
pub const MAX_SOURCES: usize = 64;

/// Voice buses plus one for the metronome click.
const LANES: usize = Voice::COUNT + 1;
const CLICK_LANE: usize = Voice::COUNT;

/// Monotonic time reference used for scheduling, in seconds.
pub trait AudioClock {
    fn current_time(&self) -> f64;
}

/// Read side of the frame counter published by `SignalGraph`.
#[derive(Debug)]
struct ClockHandle {
    frames: Arc<AtomicU64>,
    sample_rate: u32,
}

impl ClockHandle {
    fn frames(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }
}

impl AudioClock for ClockHandle {
    fn current_time(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }
}

/// Build both halves of the graph.
pub fn build_graph(sample_rate: u32, config: &EngineConfig) -> (GraphHandle, SignalGraph) {
    let (tx, rx) = RingBuffer::new(config.command_capacity.max(1));
    let (retired_tx, retired_rx) = RingBuffer::new(config.command_capacity.max(MAX_SOURCES));
    let frames = Arc::new(AtomicU64::new(0));
    let levels = Voice::ALL.map(Voice::default_level);

    let handle = GraphHandle {
        tx,
        retired: retired_rx,
        clock: ClockHandle {
            frames: Arc::clone(&frames),
            sample_rate,
        },
        click: config.scheduler.click.clone(),
        levels,
        master: 1.0,
    };

    let graph = SignalGraph {
        rx,
        retired: retired_tx,
        frames,
        position: 0,
        sample_rate,
        voice_gains: levels.map(AudioParam::new),
        voice_levels: levels,
        pending_chokes: [None; Voice::COUNT],
        master: AudioParam::new(1.0),
        shaper: SoftClip::default(),
        choke: config.choke.clone(),
        sources: Vec::with_capacity(MAX_SOURCES),
        buses: vec![0.0; LANES * MAX_BLOCK_SIZE],
        lane_active: [false; LANES],
        tap: None,
    };

    tracing::debug!(sample_rate, "signal graph built");
    (handle, graph)
}

/// Control side of the graph.
///
/// Every method is fire-and-forget: the command is queued for the render
/// side and takes effect on its next block.
pub struct GraphHandle {
    tx: Producer<GraphCommand>,
    retired: Consumer<Source>,
    clock: ClockHandle,
    click: ClickConfig,
    levels: [f32; Voice::COUNT],
    master: f32,
}

impl GraphHandle {
    /// Handle to the persistent gain stage of `voice`.
    pub fn voice_gain(&mut self, voice: Voice) -> VoiceGain<'_> {
        VoiceGain { graph: self, voice }
    }

    pub fn set_master_gain(&mut self, level: f32) {
        self.master = level;
        self.send(GraphCommand::SetMasterLevel { level });
    }

    /// Last master level sent to the render side.
    pub fn master_gain(&self) -> f32 {
        self.master
    }

    /// Start one playback of `buffer` through `voice`'s gain at audio-clock time `at`.
    pub fn play(&mut self, voice: Voice, buffer: Arc<AudioBuffer>, velocity: f32, at: f64) {
        self.send(GraphCommand::Play(BufferSource::new(voice, buffer, velocity, at)));
    }

    /// Schedule one metronome click at `at`.
    pub fn click(&mut self, at: f64) {
        let source = ClickSource::new(&self.click, at);
        self.send(GraphCommand::Click(source));
    }

    /// Route the soft-clipped output into a new ring of `capacity` samples.
    pub fn connect_recording_tap(&mut self, capacity: usize) -> Result<TapStream, EngineError> {
        let (producer, consumer) = RingBuffer::new(capacity.max(1));
        if !self.send(GraphCommand::ConnectTap(producer)) {
            return Err(EngineError::Host("graph command queue is full".into()));
        }
        Ok(TapStream::new(consumer, self.clock.sample_rate))
    }

    pub fn disconnect_recording_tap(&mut self) {
        self.send(GraphCommand::DisconnectTap);
    }

    pub fn sample_rate(&self) -> u32 {
        self.clock.sample_rate
    }

    /// Drop every source the render side has finished with. Returns how many.
    pub fn reclaim(&mut self) -> usize {
        let mut count = 0;
        while self.retired.pop().is_ok() {
            count += 1;
        }
        count
    }

    /// Queue a command. A full queue drops it; there is no retry.
    fn send(&mut self, command: GraphCommand) -> bool {
        match self.tx.push(command) {
            Ok(()) => true,
            Err(PushError::Full(command)) => {
                tracing::warn!(?command, "graph command queue full, dropping command");
                false
            }
        }
    }
}

impl AudioClock for GraphHandle {
    fn current_time(&self) -> f64 {
        self.clock.current_time()
    }
}

/// The persistent gain stage of one voice.
pub struct VoiceGain<'a> {
    graph: &'a mut GraphHandle,
    voice: Voice,
}

impl VoiceGain<'_> {
    pub fn voice(&self) -> Voice {
        self.voice
    }

    /// Mixer level last set for this voice.
    pub fn level(&self) -> f32 {
        self.graph.levels[self.voice.index()]
    }

    /// Replace the mixer level. A choke in progress keeps its fade and
    /// restores to the new level.
    pub fn set_level(&mut self, level: f32) {
        self.graph.levels[self.voice.index()] = level;
        self.graph.send(GraphCommand::SetVoiceLevel {
            voice: self.voice,
            level,
        });
    }

    /// Duck this gain to silence from `at` and bring it back to the mixer level.
    pub fn choke(&mut self, at: f64) {
        self.graph.send(GraphCommand::Choke {
            voice: self.voice,
            at,
        });
    }
}

/// Consumer end of the recording tap.
pub struct TapStream {
    rx: Consumer<f32>,
    sample_rate: u32,
}

impl TapStream {
    pub fn new(rx: Consumer<f32>, sample_rate: u32) -> Self {
        Self { rx, sample_rate }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Move every available sample into `out`. Returns how many were moved.
    pub fn drain_into(&mut self, out: &mut Vec<f32>) -> usize {
        let available = self.rx.slots();
        let Ok(chunk) = self.rx.read_chunk(available) else {
            return 0;
        };
        let (first, second) = chunk.as_slices();
        out.extend_from_slice(first);
        out.extend_from_slice(second);
        chunk.commit_all();
        available
    }
}

struct Playing {
    source: Source,
    start_frame: u64,
    lane: usize,
}

/// Render side of the graph. Owned by the audio host.
pub struct SignalGraph {
    rx: Consumer<GraphCommand>,
    retired: Producer<Source>,
    frames: Arc<AtomicU64>,
    position: u64,
    sample_rate: u32,
    voice_gains: [AudioParam; Voice::COUNT],
    voice_levels: [f32; Voice::COUNT],
    /// Start time of the most recent choke per voice
    pending_chokes: [Option<f64>; Voice::COUNT],
    master: AudioParam,
    shaper: SoftClip,
    choke: ChokeConfig,
    sources: Vec<Playing>,
    buses: Vec<f32>,
    lane_active: [bool; LANES],
    tap: Option<Producer<f32>>,
}

impl SignalGraph {
    /// Fill `out` with the next `out.len()` frames of the mix.
    pub fn render_block(&mut self, out: &mut [f32]) {
        self.drain_commands();
        for chunk in out.chunks_mut(MAX_BLOCK_SIZE) {
            self.render_chunk(chunk);
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Frames rendered so far.
    pub fn frame_position(&self) -> u64 {
        self.position
    }

    pub fn active_sources(&self) -> usize {
        self.sources.len()
    }

    pub fn has_tap(&self) -> bool {
        self.tap.is_some()
    }

    /// Value of `voice`'s gain at audio-clock time `t`.
    ///
    /// Automation before the last rendered block may already be folded away,
    /// so only times at or after `current_time()` are meaningful.
    pub fn voice_gain_at(&self, voice: Voice, t: f64) -> f32 {
        self.voice_gains[voice.index()].value_at(t)
    }

    pub fn master_gain_at(&self, t: f64) -> f32 {
        self.master.value_at(t)
    }

    fn drain_commands(&mut self) {
        while let Ok(command) = self.rx.pop() {
            match command {
                GraphCommand::Play(source) => {
                    let lane = source.voice().index();
                    self.start(Source::Buffer(source), lane);
                }
                GraphCommand::Click(source) => self.start(Source::Click(source), CLICK_LANE),
                GraphCommand::Choke { voice, at } => self.choke_voice(voice, at),
                GraphCommand::SetVoiceLevel { voice, level } => self.set_voice_level(voice, level),
                GraphCommand::SetMasterLevel { level } => self.master.set_value(level),
                GraphCommand::ConnectTap(producer) => self.tap = Some(producer),
                GraphCommand::DisconnectTap => self.tap = None,
            }
        }
    }

    fn start(&mut self, source: Source, lane: usize) {
        // Sources scheduled in the past start right away
        let requested = (source.at() * self.sample_rate as f64).round();
        let start_frame = if requested.is_finite() && requested > self.position as f64 {
            requested as u64
        } else {
            self.position
        };

        let playing = Playing {
            source,
            start_frame,
            lane,
        };

        if self.sources.len() < MAX_SOURCES {
            self.sources.push(playing);
            return;
        }

        // Pool is full: steal the oldest source
        if let Some(oldest) = self
            .sources
            .iter()
            .enumerate()
            .min_by_key(|(_, p)| p.start_frame)
            .map(|(index, _)| index)
        {
            let stolen = std::mem::replace(&mut self.sources[oldest], playing);
            self.retire(stolen.source);
        }
    }

    /// Hand a source back to the control side. If the return ring is full it
    /// is dropped here.
    fn retire(&mut self, source: Source) {
        let _ = self.retired.push(source);
    }

    fn set_voice_level(&mut self, voice: Voice, level: f32) {
        let index = voice.index();
        self.voice_levels[index] = level;

        let now = self.current_time();
        let pending = self.pending_chokes[index];
        match pending {
            // Not started yet: rebuild it on top of the new level
            Some(at) if now < at => {
                self.voice_gains[index].set_value(level);
                self.choke_voice(voice, at);
            }
            // Fading: only the restore point moves
            Some(at) if now < at + self.choke.restore => {
                let restore = at + self.choke.restore;
                let gain = &mut self.voice_gains[index];
                gain.cancel_scheduled_values(restore);
                gain.set_value_at_time(level, restore);
            }
            _ => {
                self.pending_chokes[index] = None;
                self.voice_gains[index].set_value(level);
            }
        }
    }

    fn choke_voice(&mut self, voice: Voice, at: f64) {
        let at = at.max(self.current_time());
        self.pending_chokes[voice.index()] = Some(at);
        let level = self.voice_levels[voice.index()];
        let gain = &mut self.voice_gains[voice.index()];

        let held = gain.value_at(at);
        gain.cancel_scheduled_values(at);
        gain.set_value_at_time(held, at);
        gain.linear_ramp_to_value_at_time(self.choke.floor, at + self.choke.fade);
        gain.set_value_at_time(level, at + self.choke.restore);
    }

    fn render_chunk(&mut self, out: &mut [f32]) {
        let frames = out.len();
        let chunk_start = self.position;
        let chunk_end = chunk_start + frames as u64;
        let sample_rate = self.sample_rate as f32;
        let step = if self.sample_rate == 0 {
            0.0
        } else {
            1.0 / self.sample_rate as f64
        };

        for lane in self.buses.chunks_mut(MAX_BLOCK_SIZE) {
            lane[..frames].fill(0.0);
        }
        self.lane_active = [false; LANES];

        // Sources → buses
        let mut index = 0;
        while index < self.sources.len() {
            let playing = &mut self.sources[index];
            if playing.start_frame >= chunk_end {
                index += 1;
                continue;
            }

            let offset = playing.start_frame.saturating_sub(chunk_start) as usize;
            let lane_start = playing.lane * MAX_BLOCK_SIZE;
            let lane = &mut self.buses[lane_start + offset..lane_start + frames];
            let start_time = (chunk_start + offset as u64) as f64 * step;

            self.lane_active[playing.lane] = true;
            if playing.source.mix_into(lane, start_time, sample_rate) {
                index += 1;
            } else {
                let finished = self.sources.swap_remove(index);
                self.retire(finished.source);
            }
        }

        // Buses → voice gains → master → soft clip
        for (n, sample) in out.iter_mut().enumerate() {
            let t = (chunk_start + n as u64) as f64 * step;
            let mut sum = 0.0;

            for (voice, gain) in self.voice_gains.iter().enumerate() {
                if self.lane_active[voice] {
                    sum += self.buses[voice * MAX_BLOCK_SIZE + n] * gain.value_at(t);
                }
            }
            if self.lane_active[CLICK_LANE] {
                sum += self.buses[CLICK_LANE * MAX_BLOCK_SIZE + n];
            }

            *sample = self.shaper.apply(sum * self.master.value_at(t));
        }

        if let Some(tap) = &mut self.tap {
            if tap.is_abandoned() {
                self.tap = None;
            } else {
                // Overflow drops the rest of the block
                for &sample in out.iter() {
                    if tap.push(sample).is_err() {
                        break;
                    }
                }
            }
        }

        let end_time = chunk_end as f64 * step;
        for gain in &mut self.voice_gains {
            gain.prune(end_time);
        }
        self.master.prune(end_time);

        self.position = chunk_end;
        self.frames.store(chunk_end, Ordering::Release);
    }
}

impl AudioClock for SignalGraph {
    fn current_time(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.position as f64 / self.sample_rate as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 48_000;

    fn graph() -> (GraphHandle, SignalGraph) {
        build_graph(SR, &EngineConfig::default())
    }

    fn ones(len: usize) -> Arc<AudioBuffer> {
        Arc::new(AudioBuffer::new(vec![1.0; len], SR))
    }

    #[test]
    fn play_starts_at_the_scheduled_frame() {
        let (mut handle, mut graph) = graph();
        handle.play(Voice::Kick, ones(100), 0.5, 0.01);

        let mut out = vec![0.0; 1_024];
        graph.render_block(&mut out);

        let expected = SoftClip::default().apply(0.5 * Voice::Kick.default_level());
        assert!(out[..480].iter().all(|&s| s == 0.0));
        assert!((out[480] - expected).abs() < 1e-6);
        assert!((out[579] - expected).abs() < 1e-6);
        assert!(out[580..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn past_start_plays_immediately() {
        let (mut handle, mut graph) = graph();
        let mut out = vec![0.0; 1_000];
        graph.render_block(&mut out);

        handle.play(Voice::Snare, ones(10), 1.0, 0.0);
        graph.render_block(&mut out);
        assert!(out[0] > 0.0);
        assert_eq!(graph.active_sources(), 0);
    }

    #[test]
    fn overlapping_triggers_sum() {
        let (mut handle, mut graph) = graph();
        handle.play(Voice::Tom1, ones(64), 0.1, 0.0);
        handle.play(Voice::Tom1, ones(64), 0.1, 0.0);

        let mut out = vec![0.0; 64];
        graph.render_block(&mut out);

        let expected = SoftClip::default().apply(0.2 * Voice::Tom1.default_level());
        assert!((out[10] - expected).abs() < 1e-6);
    }

    #[test]
    fn clock_advances_with_rendered_frames() {
        let (handle, mut graph) = graph();
        let mut out = vec![0.0; 4_800];
        graph.render_block(&mut out);
        assert!((handle.current_time() - 0.1).abs() < 1e-9);
        assert_eq!(graph.frame_position(), 4_800);
    }

    #[test]
    fn large_blocks_are_rendered_in_chunks() {
        let (mut handle, mut graph) = graph();
        handle.play(Voice::Crash, ones(5_000), 1.0, 0.0);

        let mut out = vec![0.0; 3 * MAX_BLOCK_SIZE];
        graph.render_block(&mut out);
        assert!(out[..5_000].iter().all(|&s| s > 0.0));
        assert!(out[5_000..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn choke_ducks_and_restores_open_hat() {
        let (mut handle, mut graph) = graph();
        let level = Voice::HatOpen.default_level();
        let at = 0.1;
        handle.voice_gain(Voice::HatOpen).choke(at);

        // One frame drains the command without passing the choke
        let mut out = [0.0; 1];
        graph.render_block(&mut out);

        assert_eq!(graph.voice_gain_at(Voice::HatOpen, at), level);
        assert!(graph.voice_gain_at(Voice::HatOpen, at + 0.010) < 0.001);
        assert!(graph.voice_gain_at(Voice::HatOpen, at + 0.020) < 0.001);
        assert_eq!(graph.voice_gain_at(Voice::HatOpen, at + 0.050), level);
        assert_eq!(graph.voice_gain_at(Voice::Kick, at + 0.010), Voice::Kick.default_level());
    }

    #[test]
    fn choke_restores_latest_mixer_level() {
        let (mut handle, mut graph) = graph();
        handle.voice_gain(Voice::HatOpen).set_level(0.3);
        handle.voice_gain(Voice::HatOpen).choke(0.05);

        let mut out = [0.0; 1];
        graph.render_block(&mut out);
        assert_eq!(graph.voice_gain_at(Voice::HatOpen, 0.1), 0.3);
        assert_eq!(handle.voice_gain(Voice::HatOpen).level(), 0.3);
    }

    #[test]
    fn full_pool_steals_oldest_source() {
        let (mut handle, mut graph) = graph();
        for _ in 0..MAX_SOURCES + 5 {
            handle.play(Voice::Ride, ones(10_000), 0.01, 0.0);
        }
        let mut out = [0.0; 16];
        graph.render_block(&mut out);
        assert_eq!(graph.active_sources(), MAX_SOURCES);
        assert_eq!(handle.reclaim(), 5);
    }

    #[test]
    fn finished_sources_are_released_on_the_control_side() {
        let (mut handle, mut graph) = graph();
        let buffer = ones(100);
        handle.play(Voice::Kick, Arc::clone(&buffer), 1.0, 0.0);

        let mut out = vec![0.0; 256];
        graph.render_block(&mut out);
        assert_eq!(graph.active_sources(), 0);

        // Still referenced from the return ring until the handle reclaims it
        assert_eq!(Arc::strong_count(&buffer), 2);
        assert_eq!(handle.reclaim(), 1);
        assert_eq!(Arc::strong_count(&buffer), 1);
        assert_eq!(handle.reclaim(), 0);
    }

    #[test]
    fn level_change_before_choke_starts_keeps_the_choke() {
        let (mut handle, mut graph) = graph();
        let at = 0.1;
        handle.voice_gain(Voice::HatOpen).choke(at);
        let mut out = [0.0; 1];
        graph.render_block(&mut out);

        handle.voice_gain(Voice::HatOpen).set_level(0.3);
        graph.render_block(&mut out);

        assert_eq!(graph.voice_gain_at(Voice::HatOpen, at - 0.01), 0.3);
        assert!(graph.voice_gain_at(Voice::HatOpen, at + 0.010) < 0.001);
        assert_eq!(graph.voice_gain_at(Voice::HatOpen, at + 0.050), 0.3);
    }

    #[test]
    fn level_change_during_choke_fade_keeps_the_fade() {
        let (mut handle, mut graph) = graph();
        let mut out = vec![0.0; 4_800];
        graph.render_block(&mut out);

        let at = handle.current_time();
        handle.voice_gain(Voice::HatOpen).choke(at);
        graph.render_block(&mut out[..240]);

        handle.voice_gain(Voice::HatOpen).set_level(0.3);
        graph.render_block(&mut out[..1]);

        assert!(graph.voice_gain_at(Voice::HatOpen, at + 0.010) < 0.001);
        assert!(graph.voice_gain_at(Voice::HatOpen, at + 0.020) < 0.001);
        assert_eq!(graph.voice_gain_at(Voice::HatOpen, at + 0.050), 0.3);
    }

    #[test]
    fn level_change_after_choke_applies_directly() {
        let (mut handle, mut graph) = graph();
        handle.voice_gain(Voice::HatOpen).choke(0.0);
        let mut out = vec![0.0; 4_800];
        graph.render_block(&mut out);

        handle.voice_gain(Voice::HatOpen).set_level(0.2);
        graph.render_block(&mut out[..1]);
        assert_eq!(graph.voice_gain_at(Voice::HatOpen, graph.current_time()), 0.2);
    }

    #[test]
    fn full_command_queue_drops() {
        let config = EngineConfig {
            command_capacity: 2,
            ..EngineConfig::default()
        };
        let (mut handle, _graph) = build_graph(SR, &config);
        assert!(handle.send(GraphCommand::SetMasterLevel { level: 1.0 }));
        assert!(handle.send(GraphCommand::SetMasterLevel { level: 1.0 }));
        assert!(!handle.send(GraphCommand::SetMasterLevel { level: 1.0 }));
        assert!(handle.connect_recording_tap(16).is_err());
    }

    #[test]
    fn tap_receives_the_clipped_output() {
        let (mut handle, mut graph) = graph();
        let mut tap = handle.connect_recording_tap(4_096).unwrap();
        handle.play(Voice::Kick, ones(256), 1.0, 0.0);

        let mut out = vec![0.0; 512];
        graph.render_block(&mut out);
        assert!(graph.has_tap());

        let mut recorded = Vec::new();
        assert_eq!(tap.drain_into(&mut recorded), 512);
        assert_eq!(recorded, out);

        handle.disconnect_recording_tap();
        graph.render_block(&mut out);
        assert!(!graph.has_tap());
        assert_eq!(tap.drain_into(&mut recorded), 0);
    }

    #[test]
    fn master_gain_scales_the_mix() {
        let (mut handle, mut graph) = graph();
        handle.set_master_gain(0.0);
        handle.play(Voice::Kick, ones(64), 1.0, 0.0);

        let mut out = vec![0.0; 64];
        graph.render_block(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(handle.master_gain(), 0.0);
        assert_eq!(graph.master_gain_at(1.0), 0.0);
    }

    #[test]
    fn click_mixes_outside_voice_gains() {
        let (mut handle, mut graph) = graph();
        handle.click(0.0);

        let mut out = vec![0.0; 2_400];
        graph.render_block(&mut out);
        assert!(out.iter().any(|s| s.abs() > 0.1));
        assert_eq!(graph.active_sources(), 0);
    }
}
