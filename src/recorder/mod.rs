//! Capture of the live mix into a downloadable file.
//!
//! ```text
//!   Idle ──start──→ Recording ──stop / cap──→ Stopped(has data)
//!    ↑                                              │
//!    └──────────────────── clear ───────────────────┘
//! ```
//!
//! While recording, `poll` moves whatever the graph's tap produced into the
//! encoder. The host calls it from its control loop; it reports elapsed time
//! on tick boundaries and stops the take on its own at the length cap.

pub mod encoder;
pub mod format;

use std::time::{Duration, Instant};

use crate::{config::RecorderConfig, error::EngineError, graph::TapStream};

pub use encoder::{ChunkEncoder, EncoderBackend, WavBackend, WavEncoder, WAV_MIME};
pub use format::{extension_for_mime, file_name, negotiate_format, PREFERRED_FORMATS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
    /// A finished take is waiting to be downloaded or cleared.
    Stopped,
}

/// What a call to `Recorder::poll` observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderPoll {
    /// Not recording.
    Inactive,
    /// Recording, no new tick boundary since the last poll.
    Pending,
    /// A new display tick; elapsed time rounded down to the tick resolution.
    Elapsed(Duration),
    /// The take hit the length cap and was finalized.
    AutoStopped(Duration),
}

/// A finalized take.
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    pub mime_type: String,
    pub bytes: Vec<u8>,
    pub duration: Duration,
}

/// A recording packaged for saving.
#[derive(Debug, Clone, PartialEq)]
pub struct Download {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

struct RecordingSession {
    stream: TapStream,
    encoder: Box<dyn ChunkEncoder>,
    started: Instant,
    ticks_reported: u128,
    scratch: Vec<f32>,
}

impl RecordingSession {
    fn drain(&mut self) -> Result<(), EngineError> {
        self.scratch.clear();
        if self.stream.drain_into(&mut self.scratch) > 0 {
            self.encoder.write(&self.scratch)?;
        }
        Ok(())
    }
}

pub struct Recorder {
    config: RecorderConfig,
    session: Option<RecordingSession>,
    recording: Option<Recording>,
}

impl Recorder {
    pub fn new(config: RecorderConfig) -> Self {
        Self {
            config,
            session: None,
            recording: None,
        }
    }

    pub fn state(&self) -> RecorderState {
        match (&self.session, &self.recording) {
            (Some(_), _) => RecorderState::Recording,
            (None, Some(_)) => RecorderState::Stopped,
            (None, None) => RecorderState::Idle,
        }
    }

    /// Time since the take started, while recording.
    pub fn elapsed(&self, now: Instant) -> Option<Duration> {
        self.session
            .as_ref()
            .map(|session| now.saturating_duration_since(session.started))
    }

    pub fn recording(&self) -> Option<&Recording> {
        self.recording.as_ref()
    }

    /// Begin a take from `stream`, in the first format `backend` supports.
    pub fn start(
        &mut self,
        stream: TapStream,
        backend: &dyn EncoderBackend,
        now: Instant,
    ) -> Result<(), EngineError> {
        if self.state() != RecorderState::Idle {
            return Err(EngineError::InvalidState("recorder is not idle"));
        }

        let mime_type = negotiate_format(|mime| backend.is_supported(mime));
        let encoder = backend.create(mime_type, stream.sample_rate())?;
        tracing::debug!(mime_type = encoder.mime_type(), "recording started");

        let capacity = self.config.tap_capacity(stream.sample_rate());
        self.session = Some(RecordingSession {
            stream,
            encoder,
            started: now,
            ticks_reported: 0,
            scratch: Vec::with_capacity(capacity),
        });
        Ok(())
    }

    /// Move captured audio into the encoder and report progress.
    pub fn poll(&mut self, now: Instant) -> Result<RecorderPoll, EngineError> {
        let tick = self.config.elapsed_tick();
        let max_duration = self.config.max_duration();

        let Some(session) = self.session.as_mut() else {
            return Ok(RecorderPoll::Inactive);
        };
        session.drain()?;

        let elapsed = now.saturating_duration_since(session.started);
        if elapsed >= max_duration {
            let duration = self.stop(now)?;
            tracing::debug!(?duration, "recording hit the length cap");
            return Ok(RecorderPoll::AutoStopped(duration));
        }

        if tick.is_zero() {
            return Ok(RecorderPoll::Pending);
        }
        let ticks = elapsed.as_nanos() / tick.as_nanos();
        if ticks > session.ticks_reported {
            session.ticks_reported = ticks;
            let rounded = tick.saturating_mul(u32::try_from(ticks).unwrap_or(u32::MAX));
            return Ok(RecorderPoll::Elapsed(rounded));
        }
        Ok(RecorderPoll::Pending)
    }

    /// Finalize the take. Returns its duration, capped at the maximum length.
    pub fn stop(&mut self, now: Instant) -> Result<Duration, EngineError> {
        let Some(mut session) = self.session.take() else {
            return Err(EngineError::InvalidState("recorder is not recording"));
        };
        session.drain()?;

        let duration = now
            .saturating_duration_since(session.started)
            .min(self.config.max_duration());
        let mime_type = session.encoder.mime_type().to_string();
        let bytes = session.encoder.finish()?;
        tracing::debug!(%mime_type, bytes = bytes.len(), ?duration, "recording stopped");

        self.recording = Some(Recording {
            mime_type,
            bytes,
            duration,
        });
        Ok(duration)
    }

    /// Discard the finished take.
    pub fn clear(&mut self) -> Result<(), EngineError> {
        if self.session.is_some() {
            return Err(EngineError::InvalidState("cannot clear while recording"));
        }
        self.recording = None;
        Ok(())
    }

    /// Package the finished take as `<app>-<epoch ms>.<ext>`.
    pub fn download(&self, app_name: &str, epoch_ms: u128) -> Result<Download, EngineError> {
        let recording = self
            .recording
            .as_ref()
            .ok_or(EngineError::InvalidState("nothing has been recorded"))?;

        Ok(Download {
            file_name: file_name(app_name, epoch_ms, &recording.mime_type),
            mime_type: recording.mime_type.clone(),
            bytes: recording.bytes.clone(),
        })
    }
}
