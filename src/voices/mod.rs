//! Procedurally synthesized drum voices.
//!
//! Every pad plays a pre-rendered, immutable buffer. Buffers are produced
//! once per kit from closed-form models (an exponential envelope multiplied
//! by an oscillator or noise term), then run through the same DC-blocking
//! pass so no voice drifts off zero.
//!
//! # Example
//!
//! ```ignore
//! use drumpad::voices::{self, KitFlavor, Voice};
//!
//! // One voice
//! let snare = voices::synthesize(Voice::Snare, KitFlavor::Jazz, 48_000);
//!
//! // A whole kit, all ten buffers rendered before it is returned
//! let kit = voices::synthesize_kit(KitFlavor::Rock, 48_000);
//! let kick = kit.buffer(Voice::Kick);
//! ```

mod buffer;
mod cymbal;
mod hihat;
mod kick;
mod kit;
mod snare;
mod tom;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dsp::{filter::DcBlocker, oscillator::Noise};

pub use buffer::AudioBuffer;
pub use kit::{
    CymbalParams, HatParams, KickParams, Kit, KitFlavor, KitParams, SnareParams, TomParams,
};

/// One synthesizable percussion instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Voice {
    Kick,
    Snare,
    HatClosed,
    HatOpen,
    HatPedal,
    Tom1,
    Tom2,
    Tom3,
    Crash,
    Ride,
}

impl Voice {
    pub const COUNT: usize = 10;

    pub const ALL: [Voice; Voice::COUNT] = [
        Voice::Kick,
        Voice::Snare,
        Voice::HatClosed,
        Voice::HatOpen,
        Voice::HatPedal,
        Voice::Tom1,
        Voice::Tom2,
        Voice::Tom3,
        Voice::Crash,
        Voice::Ride,
    ];

    /// Stable position of the voice in `Voice::ALL`.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Voice::Kick => "kick",
            Voice::Snare => "snare",
            Voice::HatClosed => "hat-closed",
            Voice::HatOpen => "hat-open",
            Voice::HatPedal => "hat-pedal",
            Voice::Tom1 => "tom1",
            Voice::Tom2 => "tom2",
            Voice::Tom3 => "tom3",
            Voice::Crash => "crash",
            Voice::Ride => "ride",
        }
    }

    /// Mixer level a fresh session starts with.
    pub fn default_level(self) -> f32 {
        match self {
            Voice::Kick => 0.9,
            Voice::Snare => 0.8,
            Voice::HatClosed => 0.55,
            Voice::HatOpen | Voice::HatPedal => 0.5,
            Voice::Tom1 | Voice::Tom2 | Voice::Tom3 => 0.75,
            Voice::Crash => 0.6,
            Voice::Ride => 0.55,
        }
    }

    /// Fixed buffer length in seconds. Independent of kit and sample rate.
    pub fn duration(self) -> f32 {
        match self {
            Voice::Kick => 1.0,
            Voice::Snare => 0.5,
            Voice::HatClosed => 0.15,
            Voice::HatPedal => 0.25,
            Voice::HatOpen => 1.6,
            Voice::Tom1 | Voice::Tom2 | Voice::Tom3 => 1.2,
            Voice::Crash => 2.8,
            Voice::Ride => 3.5,
        }
    }

    /// Number of frames in this voice's buffer at `sample_rate`.
    pub fn frame_count(self, sample_rate: u32) -> usize {
        (self.duration() as f64 * sample_rate as f64).round() as usize
    }

    /// Closed and pedal hats share a mechanism with the open hat and cut it off.
    pub fn chokes_open_hat(self) -> bool {
        matches!(self, Voice::HatClosed | Voice::HatPedal)
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Voice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Voice::ALL
            .into_iter()
            .find(|v| v.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown voice '{s}'"))
    }
}

/// Synthesize one voice with the tuning table of `flavor`.
pub fn synthesize(voice: Voice, flavor: KitFlavor, sample_rate: u32) -> AudioBuffer {
    synthesize_with(voice, &KitParams::for_flavor(flavor), sample_rate)
}

/// Synthesize one voice from an explicit tuning table.
pub fn synthesize_with(voice: Voice, params: &KitParams, sample_rate: u32) -> AudioBuffer {
    let sr = sample_rate as f32;
    let mut samples = vec![0.0f32; voice.frame_count(sample_rate)];
    let mut noise = Noise::seeded(
        params.noise_seed ^ (voice.index() as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15),
    );

    match voice {
        Voice::Kick => kick::render(&params.kick, &mut noise, &mut samples, sr),
        Voice::Snare => snare::render(&params.snare, &mut noise, &mut samples, sr),
        Voice::HatClosed => hihat::render(&params.hat, params.hat.closed_decay, &mut samples, sr),
        Voice::HatOpen => hihat::render(&params.hat, params.hat.open_decay, &mut samples, sr),
        Voice::HatPedal => hihat::render(&params.hat, params.hat.pedal_decay, &mut samples, sr),
        Voice::Tom1 => tom::render(&params.tom, params.tom.frequencies[0], &mut samples, sr),
        Voice::Tom2 => tom::render(&params.tom, params.tom.frequencies[1], &mut samples, sr),
        Voice::Tom3 => tom::render(&params.tom, params.tom.frequencies[2], &mut samples, sr),
        Voice::Crash => cymbal::render(
            &params.cymbal,
            params.cymbal.crash_decay,
            &mut noise,
            &mut samples,
            sr,
        ),
        Voice::Ride => cymbal::render(
            &params.cymbal,
            params.cymbal.ride_decay,
            &mut noise,
            &mut samples,
            sr,
        ),
    }

    // Same smoothing pass for every voice, after the model
    DcBlocker::process_buffer(&mut samples);

    AudioBuffer::new(samples, sample_rate)
}

/// Render all ten voices of a kit. The kit only exists once every buffer is done.
pub fn synthesize_kit(flavor: KitFlavor, sample_rate: u32) -> Kit {
    Kit::synthesize(flavor, sample_rate)
}
