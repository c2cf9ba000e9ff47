//! Engine configuration.
//!
//! Every timing constant the engine relies on lives here with its default.
//! All structs deserialize with `#[serde(default)]`, so a host can override a
//! single field from JSON and keep the rest.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Prefix for downloaded recordings (`<app_name>-<epoch-ms>.<ext>`).
    pub app_name: String,
    /// Capacity of the control → render command ring.
    pub command_capacity: usize,
    pub trigger: TriggerConfig,
    pub scheduler: SchedulerConfig,
    pub choke: ChokeConfig,
    pub recorder: RecorderConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            app_name: crate::APP_NAME.to_string(),
            command_capacity: 1024,
            trigger: TriggerConfig::default(),
            scheduler: SchedulerConfig::default(),
            choke: ChokeConfig::default(),
            recorder: RecorderConfig::default(),
        }
    }
}

/// Pad trigger behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Velocity used when the input carries no pressure (0.9)
    pub default_velocity: f32,
    /// Velocity for the long-press/accent path (1.2)
    pub accent_velocity: f32,
    /// Haptic pulse length in milliseconds (10)
    pub haptic_ms: u64,
    /// Upper bound applied to the latency offset, in milliseconds (1000)
    pub max_latency_ms: i32,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            default_velocity: 0.9,
            accent_velocity: 1.2,
            haptic_ms: 10,
            max_latency_ms: 1000,
        }
    }
}

impl TriggerConfig {
    pub fn haptic_pulse(&self) -> Duration {
        Duration::from_millis(self.haptic_ms)
    }
}

/// Lookahead metronome timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Wall-clock re-arm interval of the scheduling loop, in milliseconds (25)
    pub poll_interval_ms: u64,
    /// How far ahead of the audio clock ticks are scheduled, in seconds (0.12)
    pub schedule_ahead: f64,
    /// Delay between start and the first tick, in seconds (0.05)
    pub lead_in: f64,
    /// Tempo used until the first tempo change (120)
    pub default_bpm: f64,
    pub min_bpm: f64,
    pub max_bpm: f64,
    pub click: ClickConfig,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 25,
            schedule_ahead: 0.12,
            lead_in: 0.05,
            default_bpm: 120.0,
            min_bpm: 30.0,
            max_bpm: 300.0,
            click: ClickConfig::default(),
        }
    }
}

impl SchedulerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Usable tempo bounds as `(low, high)`, with `0 < low <= high`.
    ///
    /// A bound that is non-finite or not positive falls back to its default;
    /// bounds given in the wrong order are swapped.
    pub fn bpm_range(&self) -> (f64, f64) {
        let defaults = Self::default();
        let usable = |bpm: f64, fallback: f64| if bpm.is_finite() && bpm > 0.0 { bpm } else { fallback };
        let min = usable(self.min_bpm, defaults.min_bpm);
        let max = usable(self.max_bpm, defaults.max_bpm);
        (min.min(max), min.max(max))
    }
}

/// Metronome click voice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClickConfig {
    pub frequency: f32,
    /// Linear attack time in seconds
    pub attack: f64,
    /// Exponential decay time in seconds (to `floor`)
    pub decay: f64,
    pub level: f32,
    pub floor: f32,
}

impl Default for ClickConfig {
    fn default() -> Self {
        Self {
            frequency: 880.0,
            attack: 0.001,
            decay: 0.03,
            level: 0.5,
            floor: 0.001,
        }
    }
}

/// Hi-hat choke envelope applied to the open hat gain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChokeConfig {
    /// Time to ramp the open hat down, in seconds (0.01)
    pub fade: f64,
    /// Time after the trigger at which the level is restored, in seconds (0.03)
    pub restore: f64,
    /// Level the fade ramps to (0.0001)
    pub floor: f32,
}

impl Default for ChokeConfig {
    fn default() -> Self {
        Self {
            fade: 0.01,
            restore: 0.03,
            floor: 0.0001,
        }
    }
}

/// Recorder limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Hard cap on a take, in seconds (60)
    pub max_duration_secs: u64,
    /// Resolution of the elapsed-time display, in milliseconds (250)
    pub elapsed_tick_ms: u64,
    /// Seconds of audio the recording tap can buffer between polls (2.0)
    pub tap_capacity_secs: f32,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            max_duration_secs: 60,
            elapsed_tick_ms: 250,
            tap_capacity_secs: 2.0,
        }
    }
}

impl RecorderConfig {
    pub fn max_duration(&self) -> Duration {
        Duration::from_secs(self.max_duration_secs)
    }

    pub fn elapsed_tick(&self) -> Duration {
        Duration::from_millis(self.elapsed_tick_ms)
    }

    pub fn tap_capacity(&self, sample_rate: u32) -> usize {
        ((sample_rate as f32 * self.tap_capacity_secs) as usize).max(crate::MAX_BLOCK_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{ "scheduler": { "default_bpm": 90.0 } }"#).unwrap();

        assert_eq!(config.scheduler.default_bpm, 90.0);
        assert_eq!(config.scheduler.poll_interval_ms, 25);
        assert_eq!(config.recorder.max_duration_secs, 60);
        assert_eq!(config.app_name, "drumpad");
    }

    #[test]
    fn bpm_range_is_always_ordered_and_positive() {
        let swapped = SchedulerConfig {
            min_bpm: 400.0,
            ..SchedulerConfig::default()
        };
        assert_eq!(swapped.bpm_range(), (300.0, 400.0));

        let broken = SchedulerConfig {
            min_bpm: f64::NAN,
            max_bpm: -10.0,
            ..SchedulerConfig::default()
        };
        assert_eq!(broken.bpm_range(), (30.0, 300.0));
        assert_eq!(SchedulerConfig::default().bpm_range(), (30.0, 300.0));
    }

    #[test]
    fn tap_capacity_never_below_one_block() {
        let config = RecorderConfig {
            tap_capacity_secs: 0.0,
            ..RecorderConfig::default()
        };
        assert_eq!(config.tap_capacity(48_000), crate::MAX_BLOCK_SIZE);
    }
}
