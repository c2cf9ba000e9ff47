//! TUI for drumpad
//!
//! Pads, transport/mixer status and an oscilloscope of the live output.

mod keymap;
mod pads;
mod status;
mod waveform;

use std::{
    cell::RefCell,
    fs,
    path::PathBuf,
    rc::Rc,
    time::{Duration, Instant},
};

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};
use rtrb::Consumer;

use drumpad::{engine::Feedback, recorder::RecorderState, ControlEvent, Engine, Voice};

use keymap::{map_key, Action, KeyContext};
use pads::render_pads;
use status::render_status;
use waveform::render_waveform;

/// Oscilloscope window
const VIS_BUFFER_SIZE: usize = 1024;

/// How long a pad or the beat light stays lit
const FLASH_TIME: Duration = Duration::from_millis(120);

/// Keyboard and timer poll interval
const POLL_INTERVAL: Duration = Duration::from_millis(5);

#[derive(Default)]
struct FeedbackState {
    flashes: [Option<Instant>; Voice::COUNT],
    pulses: Vec<Instant>,
    elapsed: Option<Duration>,
    recorder: Option<RecorderState>,
}

/// Engine feedback collected for the next frame.
#[derive(Clone, Default)]
pub struct UiFeedback(Rc<RefCell<FeedbackState>>);

impl Feedback for UiFeedback {
    fn pad_flash(&mut self, voice: Voice, delay: Duration) {
        self.0.borrow_mut().flashes[voice.index()] = Some(Instant::now() + delay);
    }

    fn metronome_pulse(&mut self, delay: Duration) {
        self.0.borrow_mut().pulses.push(Instant::now() + delay);
    }

    fn recording_elapsed(&mut self, elapsed: Duration) {
        self.0.borrow_mut().elapsed = Some(elapsed);
    }

    fn recorder_state(&mut self, state: RecorderState) {
        let mut feedback = self.0.borrow_mut();
        feedback.recorder = Some(state);
        if state == RecorderState::Recording {
            feedback.elapsed = Some(Duration::ZERO);
        }
    }
}

impl UiFeedback {
    fn pad_lit(&self, voice: Voice, now: Instant) -> bool {
        self.0.borrow().flashes[voice.index()]
            .is_some_and(|at| now >= at && now < at + FLASH_TIME)
    }

    fn beat_lit(&self, now: Instant) -> bool {
        let mut feedback = self.0.borrow_mut();
        feedback.pulses.retain(|&at| now < at + FLASH_TIME);
        feedback.pulses.iter().any(|&at| now >= at)
    }

    fn elapsed(&self) -> Option<Duration> {
        self.0.borrow().elapsed
    }
}

/// Snapshot of everything the widgets draw.
pub struct View {
    pub lit: [bool; Voice::COUNT],
    pub beat: bool,
    pub selected: Voice,
    pub message: String,
}

pub struct PadApp {
    engine: Engine,
    feedback: UiFeedback,
    scope_rx: Consumer<f32>,
    scope: Vec<f32>,
    selected: usize,
    message: String,
    save_dir: PathBuf,
    should_quit: bool,
}

impl PadApp {
    pub fn new(engine: Engine, feedback: UiFeedback, scope_rx: Consumer<f32>, dir: PathBuf) -> Self {
        Self {
            engine,
            feedback,
            scope_rx,
            scope: vec![0.0; VIS_BUFFER_SIZE],
            selected: 0,
            message: String::from("press any pad to start audio"),
            save_dir: dirs::download_dir().unwrap_or(dir),
            should_quit: false,
        }
    }

    /// Run the UI event loop
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.engine.tick(Instant::now());
            self.poll_scope();

            terminal.draw(|frame| self.render(frame))?;

            if event::poll(POLL_INTERVAL)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key);
                    }
                }
            }
        }
        Ok(())
    }

    fn poll_scope(&mut self) {
        while let Ok(sample) = self.scope_rx.pop() {
            self.scope.push(sample);
        }
        if self.scope.len() > VIS_BUFFER_SIZE {
            let excess = self.scope.len() - VIS_BUFFER_SIZE;
            self.scope.drain(0..excess);
        }
    }

    fn handle_key(&mut self, key: crossterm::event::KeyEvent) {
        let selected = Voice::ALL[self.selected];
        let ctx = KeyContext {
            bpm: self.engine.bpm(),
            master: self.engine.master_level(),
            latency_ms: self.engine.latency_ms(),
            selected,
            selected_level: self.engine.voice_level(selected),
            flavor: self.engine.kit_flavor(),
        };

        let Some(action) = map_key(key, &ctx) else {
            return;
        };

        match action {
            Action::Quit => self.should_quit = true,
            Action::SelectVoice(step) => {
                self.selected = (self.selected as isize + step).rem_euclid(Voice::COUNT as isize) as usize;
            }
            Action::Save => self.save_recording(),
            Action::Engine(event) => {
                let now = Instant::now();
                if let Err(err) = self.engine.try_handle(event, now) {
                    tracing::warn!(%err, "input event failed");
                    self.message = err.to_string();
                } else if self.engine.is_unlocked() {
                    self.message.clear();
                }
            }
        }
    }

    fn save_recording(&mut self) {
        self.engine
            .handle(ControlEvent::DownloadRecording, Instant::now());
        let Some(download) = self.engine.take_download() else {
            self.message = String::from("nothing recorded yet");
            return;
        };

        let path = self.save_dir.join(&download.file_name);
        self.message = match fs::write(&path, &download.bytes) {
            Ok(()) => format!("saved {}", path.display()),
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "failed to save recording");
                format!("save failed: {err}")
            }
        };
    }

    fn render(&self, frame: &mut Frame) {
        let now = Instant::now();
        let view = View {
            lit: Voice::ALL.map(|voice| self.feedback.pad_lit(voice, now)),
            beat: self.feedback.beat_lit(now),
            selected: Voice::ALL[self.selected],
            message: self.message.clone(),
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Status bar
                Constraint::Min(7),    // Pads + mixer
                Constraint::Length(8), // Waveform
                Constraint::Length(1), // Help bar
            ])
            .split(frame.area());

        render_status(frame, chunks[0], &self.engine, &view, self.feedback.elapsed());
        render_pads(frame, chunks[1], &self.engine, &view);
        render_waveform(frame, chunks[2], &self.scope);

        let help = Paragraph::new(
            " [a-;] Pads (Shift = accent)  [Space] Metronome  [[ ]] Tempo  [z] Kit  [r] Rec  [w] Save  [x] Clear  [←→↑↓] Mixer  [, .] Master  [- =] Latency  [q] Quit",
        )
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[3]);
    }
}
