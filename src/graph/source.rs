//! Playback sources mixed by the render side.
//!
//! Sources are built on the control thread (so any allocation happens
//! there) and handed over whole inside a `GraphCommand`. The render side
//! only mixes them into a bus and drops them once they report they are done.

use std::sync::Arc;

use crate::{
    config::ClickConfig,
    dsp::{oscillator::PhaseOscillator, AudioParam},
    voices::{AudioBuffer, Voice},
};

/// One trigger of a voice: a shared buffer read once at a fixed velocity.
#[derive(Debug)]
pub struct BufferSource {
    voice: Voice,
    buffer: Arc<AudioBuffer>,
    velocity: f32,
    at: f64,
    position: usize,
}

impl BufferSource {
    pub fn new(voice: Voice, buffer: Arc<AudioBuffer>, velocity: f32, at: f64) -> Self {
        Self {
            voice,
            buffer,
            velocity,
            at,
            position: 0,
        }
    }

    pub fn voice(&self) -> Voice {
        self.voice
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    /// Add the next `out.len()` frames into `out`. Returns false once the
    /// buffer is exhausted.
    fn mix_into(&mut self, out: &mut [f32]) -> bool {
        let remaining = &self.buffer.samples()[self.position.min(self.buffer.len())..];
        let frames = remaining.len().min(out.len());

        for (o, &s) in out[..frames].iter_mut().zip(remaining) {
            *o += s * self.velocity;
        }

        self.position += frames;
        self.position < self.buffer.len()
    }
}

/// A metronome click: a sine under a short attack/decay envelope.
#[derive(Debug)]
pub struct ClickSource {
    frequency: f32,
    envelope: AudioParam,
    oscillator: PhaseOscillator,
    at: f64,
    end: f64,
}

impl ClickSource {
    pub fn new(config: &ClickConfig, at: f64) -> Self {
        let peak_at = at + config.attack;
        let end = peak_at + config.decay;

        let mut envelope = AudioParam::new(0.0);
        envelope.set_value_at_time(0.0, at);
        envelope.linear_ramp_to_value_at_time(config.level, peak_at);
        envelope.exponential_ramp_to_value_at_time(config.floor, end);

        Self {
            frequency: config.frequency,
            envelope,
            oscillator: PhaseOscillator::new(),
            at,
            end,
        }
    }

    /// Mix frames starting at audio-clock time `start`. Returns false once
    /// the envelope has finished.
    fn mix_into(&mut self, out: &mut [f32], start: f64, sample_rate: f32) -> bool {
        let step = 1.0 / sample_rate as f64;
        for (i, o) in out.iter_mut().enumerate() {
            let t = start + i as f64 * step;
            if t >= self.end {
                return false;
            }
            *o += self.oscillator.next_sine(self.frequency, sample_rate) * self.envelope.value_at(t);
        }
        start + out.len() as f64 * step < self.end
    }
}

/// Anything the render side can mix.
#[derive(Debug)]
pub enum Source {
    Buffer(BufferSource),
    Click(ClickSource),
}

impl Source {
    /// Scheduled start on the audio clock, in seconds.
    pub fn at(&self) -> f64 {
        match self {
            Source::Buffer(source) => source.at,
            Source::Click(source) => source.at,
        }
    }

    pub(super) fn mix_into(&mut self, out: &mut [f32], start: f64, sample_rate: f32) -> bool {
        match self {
            Source::Buffer(source) => source.mix_into(out),
            Source::Click(source) => source.mix_into(out, start, sample_rate),
        }
    }
}
