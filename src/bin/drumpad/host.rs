//! cpal output stream hosting the render side of the graph.

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    SampleFormat,
};
use rtrb::{Consumer, Producer, RingBuffer};

use drumpad::{engine::AudioHost, graph::SignalGraph, EngineError, MAX_BLOCK_SIZE};

/// Samples kept for the oscilloscope.
const SCOPE_CAPACITY: usize = 8 * MAX_BLOCK_SIZE;

pub struct CpalHost {
    device: cpal::Device,
    config: cpal::StreamConfig,
    stream: Option<cpal::Stream>,
    scope_tx: Option<Producer<f32>>,
}

impl CpalHost {
    /// Open the default output device. The stream is only built once the
    /// engine hands over its graph.
    pub fn default_output() -> EyreResult<(Self, Consumer<f32>)> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let supported = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        if supported.sample_format() != SampleFormat::F32 {
            return Err(eyre!(
                "unsupported sample format {:?}, only f32 output is supported",
                supported.sample_format()
            ));
        }

        let (scope_tx, scope_rx) = RingBuffer::new(SCOPE_CAPACITY);
        let host = Self {
            device,
            config: supported.into(),
            stream: None,
            scope_tx: Some(scope_tx),
        };
        Ok((host, scope_rx))
    }
}

impl AudioHost for CpalHost {
    fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    fn start(&mut self, mut graph: SignalGraph) -> Result<(), EngineError> {
        if self.stream.is_some() {
            return Err(EngineError::InvalidState("audio stream already running"));
        }

        let channels = self.config.channels as usize;
        let mut scope_tx = self.scope_tx.take();
        let mut block = vec![0.0f32; MAX_BLOCK_SIZE];

        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _| {
                    for frame_chunk in data.chunks_mut(MAX_BLOCK_SIZE * channels) {
                        let frames = frame_chunk.len() / channels;
                        let block = &mut block[..frames];
                        graph.render_block(block);

                        // Mono to all channels
                        for (frame, &sample) in frame_chunk.chunks_mut(channels).zip(block.iter()) {
                            frame.fill(sample);
                        }

                        if let Some(tx) = scope_tx.as_mut() {
                            for &sample in block.iter() {
                                if tx.push(sample).is_err() {
                                    break;
                                }
                            }
                        }
                    }
                },
                |err| tracing::warn!(%err, "audio stream error"),
                None,
            )
            .map_err(|err| EngineError::Host(err.to_string()))?;

        stream
            .play()
            .map_err(|err| EngineError::Host(err.to_string()))?;
        tracing::debug!(sample_rate = self.sample_rate(), channels, "output stream started");

        self.stream = Some(stream);
        Ok(())
    }
}
