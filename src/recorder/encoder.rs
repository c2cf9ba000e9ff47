//! Encoding backends for captured audio.
//!
//! The platform decides which containers it can produce. `EncoderBackend`
//! answers "is this MIME type supported?" and creates a `ChunkEncoder` that
//! accepts the tap's samples in chunks and produces the final bytes.
//!
//! The native platform default is 16-bit mono PCM WAV via `hound`.

use std::io::Cursor;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::error::EngineError;

pub const WAV_MIME: &str = "audio/wav";

/// Encoding capabilities of the platform.
pub trait EncoderBackend {
    fn is_supported(&self, mime_type: &str) -> bool;

    /// Create an encoder. `None` asks for the platform default container.
    fn create(
        &self,
        mime_type: Option<&str>,
        sample_rate: u32,
    ) -> Result<Box<dyn ChunkEncoder>, EngineError>;
}

/// One capture in progress.
pub trait ChunkEncoder {
    /// Container actually produced (may differ from what was requested).
    fn mime_type(&self) -> &str;

    fn write(&mut self, samples: &[f32]) -> Result<(), EngineError>;

    fn finish(self: Box<Self>) -> Result<Vec<u8>, EngineError>;
}

/// Native backend: WAV only.
#[derive(Debug, Clone, Copy, Default)]
pub struct WavBackend;

impl EncoderBackend for WavBackend {
    fn is_supported(&self, mime_type: &str) -> bool {
        mime_type == WAV_MIME
    }

    fn create(
        &self,
        mime_type: Option<&str>,
        sample_rate: u32,
    ) -> Result<Box<dyn ChunkEncoder>, EngineError> {
        match mime_type {
            None => Ok(Box::new(WavEncoder::new(sample_rate))),
            Some(mime) if self.is_supported(mime) => Ok(Box::new(WavEncoder::new(sample_rate))),
            Some(_) => Err(EngineError::InvalidState("unsupported recording format")),
        }
    }
}

/// Buffers 16-bit PCM and writes the WAV container on `finish`.
#[derive(Debug)]
pub struct WavEncoder {
    sample_rate: u32,
    samples: Vec<i16>,
}

impl WavEncoder {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            samples: Vec::new(),
        }
    }
}

impl ChunkEncoder for WavEncoder {
    fn mime_type(&self) -> &str {
        WAV_MIME
    }

    fn write(&mut self, samples: &[f32]) -> Result<(), EngineError> {
        self.samples.extend(
            samples
                .iter()
                .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16),
        );
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Vec<u8>, EngineError> {
        let spec = WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec)?;
            for &sample in &self.samples {
                writer.write_sample(sample)?;
            }
            writer.finalize()?;
        }

        Ok(cursor.into_inner())
    }
}
