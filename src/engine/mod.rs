//! The session facade: input events in, scheduled audio out.
//!
//! `Engine` is the single context object the UI layer owns. It holds the
//! control side of the graph, the current kit, the metronome and the
//! recorder, and is driven from one thread by two calls:
//!
//! - `handle(event, now)` for every input event
//! - `tick(now)` from the host's loop, which runs the metronome look-ahead
//!   and drains the recorder
//!
//! Nothing here blocks or waits on the audio thread. Every sound is placed
//! on the audio clock and handed over through the graph's command queue.
//!
//! # Example
//!
//! ```ignore
//! let host = OfflineHost::new(48_000);
//! let mut engine = Engine::new(EngineConfig::default(), host.clone());
//!
//! let now = Instant::now();
//! engine.handle(ControlEvent::TriggerStart { voice: Voice::Kick, pressure: None }, now);
//! engine.handle(ControlEvent::MetronomeToggle, now);
//!
//! loop {
//!     engine.tick(Instant::now());
//!     // ...
//! }
//! ```

pub mod host;
pub mod scheduler;
pub mod trigger;

use std::{
    sync::Arc,
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

use crate::{
    config::EngineConfig,
    error::EngineError,
    graph::{build_graph, AudioClock, GraphHandle},
    recorder::{
        Download, EncoderBackend, Recorder, RecorderPoll, RecorderState, WavBackend,
    },
    settings::{load_latency_ms, save_latency_ms, MemoryStore, SettingsStore},
    voices::{Kit, KitFlavor, Voice},
};

pub use host::{AudioHost, OfflineHost};
pub use scheduler::{Metronome, Rearm, Tick};
pub use trigger::{velocity_from_pressure, MAX_VELOCITY, MIN_VELOCITY};

/// Highest mixer or master level.
pub const MAX_LEVEL: f32 = 1.5;

/// Input events from the UI layer.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlEvent {
    /// Pad pressed. `pressure` is `None` on devices that do not report it.
    TriggerStart { voice: Voice, pressure: Option<f32> },
    /// Pad held: accent hit.
    TriggerLongPress { voice: Voice },
    TempoChange { bpm: f64 },
    KitChange { flavor: KitFlavor },
    MixerChange { voice: Voice, level: f32 },
    MasterChange { level: f32 },
    MetronomeToggle,
    RecordToggle,
    LatencySave { ms: i32 },
    DownloadRecording,
    ClearRecording,
}

impl ControlEvent {
    /// Events that count as the first user interaction and start audio.
    fn unlocks_audio(&self) -> bool {
        !matches!(
            self,
            ControlEvent::LatencySave { .. }
                | ControlEvent::DownloadRecording
                | ControlEvent::ClearRecording
        )
    }
}

/// Best-effort side channels (haptics, visuals). Every method defaults to a no-op.
pub trait Feedback {
    fn vibrate(&mut self, _pulse: Duration) {}

    /// Flash `voice`'s pad after `delay`, when the sound is actually heard.
    fn pad_flash(&mut self, _voice: Voice, _delay: Duration) {}

    fn metronome_pulse(&mut self, _delay: Duration) {}

    fn recording_elapsed(&mut self, _elapsed: Duration) {}

    fn recorder_state(&mut self, _state: RecorderState) {}
}

/// Feedback sink that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFeedback;

impl Feedback for NoFeedback {}

pub struct Engine {
    config: EngineConfig,
    host: Box<dyn AudioHost>,
    graph: Option<GraphHandle>,
    kit: Option<Kit>,
    flavor: KitFlavor,
    levels: [f32; Voice::COUNT],
    master: f32,
    latency_ms: i32,
    metronome: Metronome,
    metronome_wake: Option<Instant>,
    ticks: Vec<Tick>,
    recorder: Recorder,
    encoders: Box<dyn EncoderBackend>,
    settings: Box<dyn SettingsStore>,
    feedback: Box<dyn Feedback>,
    download: Option<Download>,
}

impl Engine {
    pub fn new(config: EngineConfig, host: impl AudioHost + 'static) -> Self {
        let metronome = Metronome::new(config.scheduler.clone());
        let recorder = Recorder::new(config.recorder.clone());

        Self {
            config,
            host: Box::new(host),
            graph: None,
            kit: None,
            flavor: KitFlavor::default(),
            levels: Voice::ALL.map(Voice::default_level),
            master: 1.0,
            latency_ms: 0,
            metronome,
            metronome_wake: None,
            ticks: Vec::new(),
            recorder,
            encoders: Box::new(WavBackend),
            settings: Box::new(MemoryStore::new()),
            feedback: Box::new(NoFeedback),
            download: None,
        }
    }

    /// Use `store` for persisted settings and apply the stored latency.
    pub fn with_settings(mut self, store: impl SettingsStore + 'static) -> Self {
        self.latency_ms = self.clamp_latency(load_latency_ms(&store));
        self.settings = Box::new(store);
        self
    }

    pub fn with_feedback(mut self, feedback: impl Feedback + 'static) -> Self {
        self.feedback = Box::new(feedback);
        self
    }

    pub fn with_encoders(mut self, backend: impl EncoderBackend + 'static) -> Self {
        self.encoders = Box::new(backend);
        self
    }

    /// Starting flavor, used when the kit is first synthesized.
    pub fn with_flavor(mut self, flavor: KitFlavor) -> Self {
        self.flavor = flavor;
        self
    }

    /// Dispatch one input event. Faults are logged and swallowed so the
    /// pads keep working.
    pub fn handle(&mut self, event: ControlEvent, now: Instant) {
        if let Err(err) = self.try_handle(event, now) {
            tracing::warn!(%err, "input event failed");
        }
    }

    pub fn try_handle(&mut self, event: ControlEvent, now: Instant) -> Result<(), EngineError> {
        if event.unlocks_audio() {
            self.unlock()?;
        }

        match event {
            ControlEvent::TriggerStart { voice, pressure } => {
                let velocity = velocity_from_pressure(pressure, &self.config.trigger);
                self.trigger(voice, velocity);
            }
            ControlEvent::TriggerLongPress { voice } => {
                self.trigger(voice, self.config.trigger.accent_velocity);
            }
            ControlEvent::TempoChange { bpm } => self.metronome.set_bpm(bpm),
            ControlEvent::KitChange { flavor } => self.set_kit(flavor),
            ControlEvent::MixerChange { voice, level } => self.set_voice_level(voice, level),
            ControlEvent::MasterChange { level } => self.set_master_level(level),
            ControlEvent::MetronomeToggle => self.toggle_metronome(now),
            ControlEvent::RecordToggle => self.toggle_recording(now)?,
            ControlEvent::LatencySave { ms } => self.save_latency(ms)?,
            ControlEvent::DownloadRecording => {
                let epoch_ms = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_millis())
                    .unwrap_or_default();
                self.download = Some(self.recorder.download(&self.config.app_name, epoch_ms)?);
            }
            ControlEvent::ClearRecording => {
                self.recorder.clear()?;
                self.feedback.recorder_state(self.recorder.state());
            }
        }
        Ok(())
    }

    /// Drive the cooperative timers. Call often (every few milliseconds).
    pub fn tick(&mut self, now: Instant) {
        if let Some(graph) = self.graph.as_mut() {
            graph.reclaim();
        }

        if self.metronome_wake.is_some_and(|due| now >= due) {
            self.wake_metronome(now);
        }

        match self.recorder.poll(now) {
            Ok(RecorderPoll::Elapsed(elapsed)) => self.feedback.recording_elapsed(elapsed),
            Ok(RecorderPoll::AutoStopped(duration)) => {
                self.disconnect_tap();
                self.feedback.recording_elapsed(duration);
                self.feedback.recorder_state(RecorderState::Stopped);
            }
            Ok(RecorderPoll::Inactive | RecorderPoll::Pending) => {}
            Err(err) => tracing::warn!(%err, "recorder poll failed"),
        }
    }

    /// Build the graph, start the host and synthesize the kit. Only the
    /// first call does anything.
    pub fn unlock(&mut self) -> Result<(), EngineError> {
        if self.graph.is_some() {
            return Ok(());
        }

        let sample_rate = self.host.sample_rate();
        let (mut handle, graph) = build_graph(sample_rate, &self.config);

        // Mixer moves made before unlock
        for voice in Voice::ALL {
            let level = self.levels[voice.index()];
            if level != voice.default_level() {
                handle.voice_gain(voice).set_level(level);
            }
        }
        if self.master != 1.0 {
            handle.set_master_gain(self.master);
        }

        self.host.start(graph)?;
        self.kit = Some(Kit::synthesize(self.flavor, sample_rate));
        self.graph = Some(handle);

        tracing::debug!(sample_rate, flavor = %self.flavor, "audio unlocked");
        Ok(())
    }

    /// Play `voice` at `velocity`, offset by the latency setting.
    ///
    /// Velocity is clamped to [MIN_VELOCITY, MAX_VELOCITY]; a non-finite
    /// velocity is ignored. A silent no-op before unlock.
    pub fn trigger(&mut self, voice: Voice, velocity: f32) {
        if !velocity.is_finite() {
            return;
        }
        let velocity = velocity.clamp(MIN_VELOCITY, MAX_VELOCITY);
        let latency = self.latency_secs();
        let (Some(graph), Some(kit)) = (self.graph.as_mut(), self.kit.as_ref()) else {
            return;
        };

        let at = graph.current_time() + latency;
        if voice.chokes_open_hat() {
            graph.voice_gain(Voice::HatOpen).choke(at);
        }
        graph.play(voice, Arc::clone(kit.buffer(voice)), velocity, at);

        self.feedback.vibrate(self.config.trigger.haptic_pulse());
        self.feedback
            .pad_flash(voice, Duration::from_millis(self.latency_ms.max(0) as u64));
    }

    /// Switch flavor. The old kit keeps playing until the new one is complete.
    pub fn set_kit(&mut self, flavor: KitFlavor) {
        self.flavor = flavor;
        if let Some(graph) = &self.graph {
            let kit = Kit::synthesize(flavor, graph.sample_rate());
            self.kit = Some(kit);
        }
    }

    pub fn set_voice_level(&mut self, voice: Voice, level: f32) {
        let Some(level) = clamp_level(level) else {
            return;
        };
        self.levels[voice.index()] = level;
        if let Some(graph) = self.graph.as_mut() {
            graph.voice_gain(voice).set_level(level);
        }
    }

    pub fn set_master_level(&mut self, level: f32) {
        let Some(level) = clamp_level(level) else {
            return;
        };
        self.master = level;
        if let Some(graph) = self.graph.as_mut() {
            graph.set_master_gain(level);
        }
    }

    /// Persist `ms` and apply it clamped to the allowed range.
    pub fn save_latency(&mut self, ms: i32) -> Result<(), EngineError> {
        self.latency_ms = self.clamp_latency(ms);
        save_latency_ms(self.settings.as_mut(), ms)
    }

    pub fn toggle_metronome(&mut self, now: Instant) {
        let Some(graph) = self.graph.as_ref() else {
            return;
        };

        if self.metronome.toggle(graph.current_time()) {
            self.wake_metronome(now);
        } else {
            self.metronome_wake = None;
        }
    }

    /// Idle → recording; recording → stopped; stopped → fresh take.
    pub fn toggle_recording(&mut self, now: Instant) -> Result<(), EngineError> {
        match self.recorder.state() {
            RecorderState::Recording => {
                self.recorder.stop(now)?;
                self.disconnect_tap();
            }
            RecorderState::Stopped => {
                self.recorder.clear()?;
                self.start_recording(now)?;
            }
            RecorderState::Idle => self.start_recording(now)?,
        }
        self.feedback.recorder_state(self.recorder.state());
        Ok(())
    }

    fn start_recording(&mut self, now: Instant) -> Result<(), EngineError> {
        let Some(graph) = self.graph.as_mut() else {
            return Err(EngineError::InvalidState("audio is not unlocked"));
        };

        let capacity = self.config.recorder.tap_capacity(graph.sample_rate());
        let stream = graph.connect_recording_tap(capacity)?;
        if let Err(err) = self.recorder.start(stream, self.encoders.as_ref(), now) {
            graph.disconnect_recording_tap();
            return Err(err);
        }
        Ok(())
    }

    fn disconnect_tap(&mut self) {
        if let Some(graph) = self.graph.as_mut() {
            graph.disconnect_recording_tap();
        }
    }

    fn wake_metronome(&mut self, now: Instant) {
        let latency = self.latency_secs();
        let Some(graph) = self.graph.as_mut() else {
            self.metronome_wake = None;
            return;
        };

        self.ticks.clear();
        let rearm = self
            .metronome
            .wake(graph.current_time(), latency, &mut self.ticks);

        for tick in &self.ticks {
            graph.click(tick.at);
            self.feedback.metronome_pulse(tick.pulse_delay);
        }

        self.metronome_wake = match rearm {
            Rearm::After(interval) => Some(now + interval),
            Rearm::Stop => None,
        };
    }

    fn clamp_latency(&self, ms: i32) -> i32 {
        ms.clamp(0, self.config.trigger.max_latency_ms.max(0))
    }

    fn latency_secs(&self) -> f64 {
        self.latency_ms as f64 / 1000.0
    }

    pub fn is_unlocked(&self) -> bool {
        self.graph.is_some()
    }

    pub fn kit_flavor(&self) -> KitFlavor {
        self.flavor
    }

    pub fn kit(&self) -> Option<&Kit> {
        self.kit.as_ref()
    }

    pub fn bpm(&self) -> f64 {
        self.metronome.bpm()
    }

    pub fn metronome_running(&self) -> bool {
        self.metronome.is_running()
    }

    pub fn recorder_state(&self) -> RecorderState {
        self.recorder.state()
    }

    pub fn recording_elapsed(&self, now: Instant) -> Option<Duration> {
        self.recorder.elapsed(now)
    }

    /// Applied latency offset in milliseconds.
    pub fn latency_ms(&self) -> i32 {
        self.latency_ms
    }

    pub fn voice_level(&self, voice: Voice) -> f32 {
        self.levels[voice.index()]
    }

    pub fn master_level(&self) -> f32 {
        self.master
    }

    /// Audio-clock time, zero before unlock.
    pub fn current_time(&self) -> f64 {
        self.graph.as_ref().map_or(0.0, |g| g.current_time())
    }

    /// The last packaged download, if any. Taking it clears it.
    pub fn take_download(&mut self) -> Option<Download> {
        self.download.take()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

/// Levels are clamped to [0, MAX_LEVEL]; NaN is ignored.
fn clamp_level(level: f32) -> Option<f32> {
    if level.is_nan() {
        return None;
    }
    Some(level.clamp(0.0, MAX_LEVEL))
}
