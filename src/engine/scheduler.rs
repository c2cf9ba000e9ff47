/*
Metronome Scheduling
====================

Timers on the control side are late and jittery; the audio clock is not.
The metronome therefore never plays a click "now". Each time it wakes up it
looks a fixed window ahead on the audio clock and schedules every beat that
falls inside it:

    audio clock ──────────────────────────────────────────────→
                 now          now + ahead
                  │◀──────────────▶│
    beats:    ·   ·   x       x    │   ·       ·
                      ↑       ↑
                      scheduled this wake

As long as the wake-up interval (25ms) plus its jitter stays shorter than the
look-ahead (120ms), every beat is scheduled before it is due, exactly once,
at its exact time.

Tempo changes only affect the spacing *after* the already-computed next
beat, so a change mid-bar never produces a double or a missing click.
*/

use std::time::Duration;

use crate::config::SchedulerConfig;

/// One scheduled beat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    /// Audio-clock time of the click
    pub at: f64,
    /// Wall-clock delay until the visual pulse should fire
    pub pulse_delay: Duration,
}

/// What the caller should do after a wake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rearm {
    After(Duration),
    Stop,
}

#[derive(Debug, Clone)]
pub struct Metronome {
    config: SchedulerConfig,
    running: bool,
    next_tick: f64,
    bpm: f64,
}

impl Metronome {
    pub fn new(config: SchedulerConfig) -> Self {
        let (min, max) = config.bpm_range();
        if (min, max) != (config.min_bpm, config.max_bpm) {
            tracing::warn!(
                min_bpm = config.min_bpm,
                max_bpm = config.max_bpm,
                "invalid tempo range in config, using {min}..={max}"
            );
        }
        let default_bpm = if config.default_bpm.is_finite() {
            config.default_bpm
        } else {
            SchedulerConfig::default().default_bpm
        };
        let bpm = default_bpm.clamp(min, max);
        Self {
            config,
            running: false,
            next_tick: 0.0,
            bpm,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Audio-clock time of the next beat to schedule.
    pub fn next_tick(&self) -> f64 {
        self.next_tick
    }

    pub fn start(&mut self, now: f64) {
        self.running = true;
        self.next_tick = now + self.config.lead_in;
        tracing::debug!(bpm = self.bpm, "metronome started");
    }

    pub fn stop(&mut self) {
        self.running = false;
        tracing::debug!("metronome stopped");
    }

    /// Start if stopped, stop if running. Returns the new running state.
    pub fn toggle(&mut self, now: f64) -> bool {
        if self.running {
            self.stop();
        } else {
            self.start(now);
        }
        self.running
    }

    /// Takes effect from the beat after the next one. Non-finite values are ignored.
    pub fn set_bpm(&mut self, bpm: f64) {
        if !bpm.is_finite() {
            return;
        }
        let (min, max) = self.config.bpm_range();
        self.bpm = bpm.clamp(min, max);
    }

    fn seconds_per_beat(&self) -> f64 {
        60.0 / self.bpm
    }

    /// Schedule every beat inside the look-ahead window.
    ///
    /// `now` is the audio clock, `latency` the offset added to the visual
    /// pulse. Beats are appended to `ticks`.
    pub fn wake(&mut self, now: f64, latency: f64, ticks: &mut Vec<Tick>) -> Rearm {
        if !self.running {
            return Rearm::Stop;
        }

        let horizon = now + self.config.schedule_ahead;
        while self.next_tick < horizon {
            let delay = (self.next_tick - now + latency).max(0.0);
            ticks.push(Tick {
                at: self.next_tick,
                pulse_delay: Duration::from_secs_f64(delay),
            });
            self.next_tick += self.seconds_per_beat();
        }

        Rearm::After(self.config.poll_interval())
    }
}
