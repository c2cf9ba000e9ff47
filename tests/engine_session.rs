use std::{
    cell::Cell,
    io::Cursor,
    rc::Rc,
    time::{Duration, Instant},
};

use drumpad::{
    config::RecorderConfig,
    engine::{Feedback, OfflineHost},
    recorder::RecorderState,
    settings::{load_latency_ms, JsonFileStore},
    ControlEvent, Engine, EngineConfig, KitFlavor, Voice,
};

const SR: u32 = 48_000;
/// 10ms of audio
const BLOCK: usize = 480;

fn session() -> (Engine, OfflineHost) {
    let host = OfflineHost::new(SR);
    (Engine::new(EngineConfig::default(), host.clone()), host)
}

fn hit(voice: Voice) -> ControlEvent {
    ControlEvent::TriggerStart {
        voice,
        pressure: None,
    }
}

/// Render `blocks` blocks, ticking the engine in step with the audio clock.
fn play(engine: &mut Engine, host: &OfflineHost, t0: Instant, blocks: usize) -> Vec<f32> {
    let mut out = Vec::with_capacity(blocks * BLOCK);
    for _ in 0..blocks {
        out.extend(host.render(BLOCK));
        let audio_now = Duration::from_secs_f64(engine.current_time());
        engine.tick(t0 + audio_now);
    }
    out
}

#[test]
fn hit_sounds_after_the_latency_offset() {
    let (mut engine, host) = session();
    let t0 = Instant::now();
    engine.handle(ControlEvent::LatencySave { ms: 10 }, t0);
    engine.handle(hit(Voice::Kick), t0);

    let out = host.render(2 * BLOCK);
    assert!(out[..BLOCK].iter().all(|&s| s == 0.0));
    assert!(out[BLOCK..].iter().any(|s| s.abs() > 0.01));
}

#[test]
fn output_stays_within_full_scale() {
    let (mut engine, host) = session();
    let t0 = Instant::now();
    engine.handle(ControlEvent::MasterChange { level: 1.5 }, t0);
    for voice in Voice::ALL {
        engine.handle(ControlEvent::MixerChange { voice, level: 1.5 }, t0);
    }
    for _ in 0..4 {
        for voice in Voice::ALL {
            engine.handle(ControlEvent::TriggerLongPress { voice }, t0);
        }
    }

    let out = host.render(SR as usize);
    assert!(out.iter().all(|s| s.is_finite() && s.abs() <= 1.0));
    assert!(out.iter().any(|s| s.abs() > 0.5));
}

#[test]
fn closed_hat_chokes_the_open_hat() {
    let (mut engine, host) = session();
    let t0 = Instant::now();
    let level = engine.voice_level(Voice::HatOpen);

    engine.handle(hit(Voice::HatOpen), t0);
    host.render(10 * BLOCK);

    let at = engine.current_time();
    engine.handle(hit(Voice::HatClosed), t0);
    host.render(1);

    let gain_at = |t: f64| {
        host.with_graph(|graph| graph.voice_gain_at(Voice::HatOpen, t))
            .unwrap()
    };
    assert!(gain_at(at + 0.010) < 0.001);
    assert_eq!(gain_at(at + 0.050), level);
}

#[derive(Clone, Default)]
struct Pulses(Rc<Cell<usize>>);

impl Feedback for Pulses {
    fn metronome_pulse(&mut self, _delay: Duration) {
        self.0.set(self.0.get() + 1);
    }
}

#[test]
fn metronome_clicks_twice_a_second_at_120_bpm() {
    let pulses = Pulses::default();
    let host = OfflineHost::new(SR);
    let mut engine = Engine::new(EngineConfig::default(), host.clone()).with_feedback(pulses.clone());
    let t0 = Instant::now();

    engine.handle(ControlEvent::MetronomeToggle, t0);
    let out = play(&mut engine, &host, t0, 1_000);

    // Onsets: loud samples after at least 100ms of quiet
    let mut onsets = Vec::new();
    let mut last_loud: Option<usize> = None;
    for (i, s) in out.iter().enumerate() {
        if s.abs() > 0.05 {
            if last_loud.map_or(true, |last| i - last > SR as usize / 10) {
                onsets.push(i);
            }
            last_loud = Some(i);
        }
    }

    assert!((19..=21).contains(&onsets.len()), "{} clicks", onsets.len());
    for pair in onsets.windows(2) {
        let spacing = (pair[1] - pair[0]) as f64 / SR as f64;
        assert!((spacing - 0.5).abs() < 0.002, "spacing {spacing}");
    }
    assert!(pulses.0.get() >= onsets.len());
}

#[test]
fn stopping_the_metronome_stops_the_clicks() {
    let (mut engine, host) = session();
    let t0 = Instant::now();
    engine.handle(ControlEvent::MetronomeToggle, t0);
    play(&mut engine, &host, t0, 100);

    let stop_at = t0 + Duration::from_secs_f64(engine.current_time());
    engine.handle(ControlEvent::MetronomeToggle, stop_at);
    assert!(!engine.metronome_running());

    // Anything already scheduled is at most one look-ahead window away
    play(&mut engine, &host, t0, 20);
    let tail = play(&mut engine, &host, t0, 200);
    assert!(tail.iter().all(|&s| s == 0.0));
}

#[test]
fn stopping_keeps_the_click_already_scheduled() {
    let (mut engine, host) = session();
    let t0 = Instant::now();
    engine.handle(ControlEvent::MetronomeToggle, t0);
    engine.handle(ControlEvent::MetronomeToggle, t0 + Duration::from_millis(1));
    assert!(!engine.metronome_running());

    // The lead-in click at 50ms was queued before the stop
    let lead_in = (0.05 * SR as f64) as usize;
    let out = play(&mut engine, &host, t0, 10);
    assert!(out[..lead_in].iter().all(|&s| s == 0.0));
    assert!(out[lead_in..lead_in + BLOCK].iter().any(|s| s.abs() > 0.05));

    // and nothing after it
    let tail = play(&mut engine, &host, t0, 200);
    assert!(tail.iter().all(|&s| s == 0.0));
}

#[test]
fn tempo_is_clamped_to_the_supported_range() {
    let (mut engine, _host) = session();
    let t0 = Instant::now();
    engine.handle(ControlEvent::TempoChange { bpm: 240.0 }, t0);
    assert_eq!(engine.bpm(), 240.0);
    engine.handle(ControlEvent::TempoChange { bpm: 10_000.0 }, t0);
    assert_eq!(engine.bpm(), 300.0);
}

#[test]
fn recording_captures_the_mix_as_wav() {
    let (mut engine, host) = session();
    let t0 = Instant::now();

    engine.handle(ControlEvent::RecordToggle, t0);
    engine.handle(hit(Voice::Snare), t0);
    play(&mut engine, &host, t0, 50);

    let stop_at = t0 + Duration::from_secs_f64(engine.current_time());
    engine.handle(ControlEvent::RecordToggle, stop_at);
    assert_eq!(engine.recorder_state(), RecorderState::Stopped);

    engine.handle(ControlEvent::DownloadRecording, stop_at);
    let download = engine.take_download().unwrap();
    assert_eq!(download.mime_type, "audio/wav");
    assert!(download.file_name.ends_with(".wav"));

    let reader = hound::WavReader::new(Cursor::new(download.bytes)).unwrap();
    assert_eq!(reader.spec().sample_rate, SR);
    let samples: Vec<i16> = reader.into_samples().map(|s| s.unwrap()).collect();
    assert_eq!(samples.len(), 50 * BLOCK);
    assert!(samples.iter().any(|&s| s.unsigned_abs() > 1_000));

    engine.handle(ControlEvent::ClearRecording, stop_at);
    assert_eq!(engine.recorder_state(), RecorderState::Idle);
}

#[test]
fn recording_stops_itself_at_the_cap() {
    let config = EngineConfig {
        recorder: RecorderConfig {
            max_duration_secs: 1,
            ..RecorderConfig::default()
        },
        ..EngineConfig::default()
    };
    let host = OfflineHost::new(SR);
    let mut engine = Engine::new(config, host.clone());
    let t0 = Instant::now();

    engine.handle(ControlEvent::RecordToggle, t0);
    engine.handle(hit(Voice::Crash), t0);
    play(&mut engine, &host, t0, 150);

    assert_eq!(engine.recorder_state(), RecorderState::Stopped);
    engine.handle(ControlEvent::DownloadRecording, t0);
    let download = engine.take_download().unwrap();
    assert!(download.bytes.len() > 44);
}

#[test]
fn latency_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");

    let host = OfflineHost::new(SR);
    let mut engine = Engine::new(EngineConfig::default(), host).with_settings(JsonFileStore::open(&path));
    engine.handle(ControlEvent::LatencySave { ms: 35 }, Instant::now());

    assert_eq!(load_latency_ms(&JsonFileStore::open(&path)), 35);
    let restarted = Engine::new(EngineConfig::default(), OfflineHost::new(SR))
        .with_settings(JsonFileStore::open(&path));
    assert_eq!(restarted.latency_ms(), 35);
}

#[test]
fn kit_change_before_unlock_is_used_on_unlock() {
    let (mut engine, _host) = session();
    engine.set_kit(KitFlavor::Pop);
    assert!(engine.kit().is_none());

    engine.handle(hit(Voice::Tom2), Instant::now());
    assert_eq!(engine.kit().map(|kit| kit.flavor()), Some(KitFlavor::Pop));
}
