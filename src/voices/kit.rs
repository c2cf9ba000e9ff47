//! Kit flavors and the synthesis tuning table.
//!
//! The decay rates, pitches and cutoffs below were tuned by ear. They are
//! plain data with documented defaults, and a host may deserialize its own
//! table and build a kit from it with `Kit::from_params`.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{synthesize_with, AudioBuffer, Voice};

/// A named parameter set producing a consistent timbre across all voices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KitFlavor {
    #[default]
    Rock,
    Jazz,
    Pop,
}

impl KitFlavor {
    pub const ALL: [KitFlavor; 3] = [KitFlavor::Rock, KitFlavor::Jazz, KitFlavor::Pop];

    pub fn name(self) -> &'static str {
        match self {
            KitFlavor::Rock => "rock",
            KitFlavor::Jazz => "jazz",
            KitFlavor::Pop => "pop",
        }
    }

    /// The flavor after this one, wrapping around.
    pub fn next(self) -> Self {
        let index = Self::ALL.iter().position(|&f| f == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for KitFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KitFlavor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KitFlavor::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown kit flavor '{s}'"))
    }
}

/// Pitch-swept sine with a noise click.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KickParams {
    /// Frequency at the moment of the hit (160 Hz)
    pub start_frequency: f32,
    /// Frequency the sweep settles on (30 Hz)
    pub end_frequency: f32,
    /// Exponential sweep rate, 1/s (60)
    pub sweep_rate: f32,
    /// Amplitude decay rate, 1/s (5)
    pub decay: f32,
    /// Length of the noise click in seconds (0.005)
    pub click_length: f32,
    /// Share of the click in the mix (0.15)
    pub click_level: f32,
}

impl Default for KickParams {
    fn default() -> Self {
        Self {
            start_frequency: 160.0,
            end_frequency: 30.0,
            sweep_rate: 60.0,
            decay: 5.0,
            click_length: 0.005,
            click_level: 0.15,
        }
    }
}

/// Noise blended with a short tone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnareParams {
    /// Body tone (200 Hz)
    pub tone_frequency: f32,
    /// 1/s (25)
    pub tone_decay: f32,
    /// 1/s (18)
    pub noise_decay: f32,
    /// Share of noise in the mix (0.6)
    pub noise_mix: f32,
}

impl Default for SnareParams {
    fn default() -> Self {
        Self {
            tone_frequency: 200.0,
            tone_decay: 25.0,
            noise_decay: 18.0,
            noise_mix: 0.6,
        }
    }
}

/// Three XOR'd squares through a one-pole low-pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HatParams {
    /// Square wave frequencies (215, 341, 456 Hz)
    pub frequencies: [f32; 3],
    /// Low-pass cutoff (8 kHz)
    pub cutoff: f32,
    /// 1/s (40)
    pub closed_decay: f32,
    /// 1/s (25)
    pub pedal_decay: f32,
    /// 1/s (4)
    pub open_decay: f32,
    /// Output level (0.8)
    pub level: f32,
}

impl Default for HatParams {
    fn default() -> Self {
        Self {
            frequencies: [215.0, 341.0, 456.0],
            cutoff: 8_000.0,
            closed_decay: 40.0,
            pedal_decay: 25.0,
            open_decay: 4.0,
            level: 0.8,
        }
    }
}

/// Sine with a short downward pitch bend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomParams {
    /// Nominal pitch of tom1, tom2, tom3 (170, 130, 100 Hz)
    pub frequencies: [f32; 3],
    /// Pitch offset at the hit, as a fraction of nominal (0.15)
    pub bend: f32,
    /// Seconds for the bend to reach nominal (0.02)
    pub bend_time: f32,
    /// 1/s (4.5)
    pub decay: f32,
}

impl Default for TomParams {
    fn default() -> Self {
        Self {
            frequencies: [170.0, 130.0, 100.0],
            bend: 0.15,
            bend_time: 0.02,
            decay: 4.5,
        }
    }
}

/// Inharmonic partials blended with noise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CymbalParams {
    /// Partial frequencies (211, 318, 477, 587, 751 Hz)
    pub partials: [f32; 5],
    /// Share of the partials in the mix (0.7)
    pub tone_mix: f32,
    /// 1/s (1.8)
    pub crash_decay: f32,
    /// 1/s (1.4)
    pub ride_decay: f32,
}

impl Default for CymbalParams {
    fn default() -> Self {
        Self {
            partials: [211.0, 318.0, 477.0, 587.0, 751.0],
            tone_mix: 0.7,
            crash_decay: 1.8,
            ride_decay: 1.4,
        }
    }
}

/// Full synthesis table for one kit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KitParams {
    pub kick: KickParams,
    pub snare: SnareParams,
    pub hat: HatParams,
    pub tom: TomParams,
    pub cymbal: CymbalParams,
    /// Seed for every noise component of the kit
    pub noise_seed: u64,
}

impl Default for KitParams {
    fn default() -> Self {
        Self {
            kick: KickParams::default(),
            snare: SnareParams::default(),
            hat: HatParams::default(),
            tom: TomParams::default(),
            cymbal: CymbalParams::default(),
            noise_seed: 0x5EED_D12A,
        }
    }
}

impl KitParams {
    /// Table for one of the built-in flavors.
    ///
    /// | flavor | hat cutoff | snare pitch | decay rates |
    /// | ------ | ---------- | ----------- | ----------- |
    /// | rock   | 8 kHz      | 200 Hz      | × 1.0       |
    /// | jazz   | 7 kHz      | 180 Hz      | × 0.8       |
    /// | pop    | 9 kHz      | 210 Hz      | × 1.25      |
    pub fn for_flavor(flavor: KitFlavor) -> Self {
        let (cutoff, snare_pitch, decay_scale) = match flavor {
            KitFlavor::Rock => (8_000.0, 200.0, 1.0),
            KitFlavor::Jazz => (7_000.0, 180.0, 0.8),
            KitFlavor::Pop => (9_000.0, 210.0, 1.25),
        };

        let mut params = Self::default();
        params.hat.cutoff = cutoff;
        params.snare.tone_frequency = snare_pitch;
        params.scale_decays(decay_scale);
        params
    }

    /// Multiply every amplitude decay rate by `scale` (>1 = tighter).
    pub fn scale_decays(&mut self, scale: f32) {
        self.kick.decay *= scale;
        self.snare.tone_decay *= scale;
        self.snare.noise_decay *= scale;
        self.hat.closed_decay *= scale;
        self.hat.pedal_decay *= scale;
        self.hat.open_decay *= scale;
        self.tom.decay *= scale;
        self.cymbal.crash_decay *= scale;
        self.cymbal.ride_decay *= scale;
    }
}

/// One fully rendered buffer per voice.
///
/// Buffers are indexed by `Voice::index`, so a kit cannot be partial.
#[derive(Debug, Clone)]
pub struct Kit {
    flavor: KitFlavor,
    sample_rate: u32,
    buffers: [Arc<AudioBuffer>; Voice::COUNT],
}

impl Kit {
    pub fn synthesize(flavor: KitFlavor, sample_rate: u32) -> Self {
        Self::from_params(flavor, &KitParams::for_flavor(flavor), sample_rate)
    }

    /// Render a kit from a custom table, labelled with `flavor`.
    pub fn from_params(flavor: KitFlavor, params: &KitParams, sample_rate: u32) -> Self {
        let buffers = Voice::ALL.map(|voice| Arc::new(synthesize_with(voice, params, sample_rate)));
        tracing::debug!(%flavor, sample_rate, "kit synthesized");

        Self {
            flavor,
            sample_rate,
            buffers,
        }
    }

    pub fn buffer(&self, voice: Voice) -> &Arc<AudioBuffer> {
        &self.buffers[voice.index()]
    }

    pub fn flavor(&self) -> KitFlavor {
        self.flavor
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn iter(&self) -> impl Iterator<Item = (Voice, &Arc<AudioBuffer>)> {
        Voice::ALL.into_iter().zip(self.buffers.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flavor_tables_stay_in_documented_ranges() {
        for flavor in KitFlavor::ALL {
            let params = KitParams::for_flavor(flavor);
            assert!((7_000.0..=9_000.0).contains(&params.hat.cutoff));
            assert!((180.0..=210.0).contains(&params.snare.tone_frequency));
            assert!(params.cymbal.ride_decay < params.cymbal.crash_decay);
            assert!(params.hat.open_decay < params.hat.closed_decay);
        }
    }

    #[test]
    fn kit_is_complete() {
        let kit = Kit::synthesize(KitFlavor::Pop, 8_000);
        assert_eq!(kit.iter().count(), Voice::COUNT);
        for (voice, buffer) in kit.iter() {
            assert_eq!(buffer.len(), voice.frame_count(8_000));
            assert_eq!(buffer.sample_rate(), 8_000);
        }
        assert_eq!(kit.flavor(), KitFlavor::Pop);
    }

    #[test]
    fn flavor_names_parse_and_cycle() {
        assert_eq!("Jazz".parse::<KitFlavor>(), Ok(KitFlavor::Jazz));
        assert!("polka".parse::<KitFlavor>().is_err());
        assert_eq!(KitFlavor::Pop.next(), KitFlavor::Rock);
    }

    #[test]
    fn params_deserialize_partially() {
        let params: KitParams = serde_json::from_str(r#"{ "hat": { "cutoff": 7500.0 } }"#).unwrap();
        assert_eq!(params.hat.cutoff, 7_500.0);
        assert_eq!(params.hat.frequencies, [215.0, 341.0, 456.0]);
        assert_eq!(params.kick, KickParams::default());
    }
}
