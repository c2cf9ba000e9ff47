/*
Parameter Automation
====================

An `AudioParam` is a value (a gain, usually) whose changes are *scheduled*
against the audio clock instead of being applied when the control code runs.
The control side says "be at 0.0001 by t = 12.010s"; the render side asks
"what is the value at the sample I'm rendering right now?".

Events
------

  SetValue(v, t)          jump to v at t
  LinearRamp(v, t)        move in a straight line from the previous event
                          to v, arriving at t
  ExponentialRamp(v, t)   same, along an exponential curve (never crosses 0)

Ramps start at the *previous* event's time and value, so a ramp is normally
preceded by a SetValue that pins its starting point:

    gain.cancel_scheduled_values(t);
    gain.set_value_at_time(current, t);
    gain.linear_ramp_to_value_at_time(0.0001, t + 0.010);
    gain.set_value_at_time(level, t + 0.030);

Evaluating at time `now`
------------------------

Walk the (time-sorted) events, folding every event at or before `now` into an
"anchor" - the last settled time and value. Then look at the first event
*after* `now`: if it is a ramp we are somewhere on it; otherwise the anchor
holds.

Events that are entirely in the past can be folded into a single anchor with
`prune`, which keeps the list short on the render thread.
*/

#[derive(Debug, Clone, Copy, PartialEq)]
enum Automation {
    SetValue { time: f64, value: f32 },
    LinearRamp { time: f64, value: f32 },
    ExponentialRamp { time: f64, value: f32 },
}

impl Automation {
    fn time(&self) -> f64 {
        match *self {
            Automation::SetValue { time, .. }
            | Automation::LinearRamp { time, .. }
            | Automation::ExponentialRamp { time, .. } => time,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Anchor {
    time: f64,
    value: f32,
}

/// Typical number of pending events; the list is pre-sized so scheduling on
/// the render thread does not allocate.
const EVENT_CAPACITY: usize = 16;

/// A value with a sample-accurate automation timeline.
#[derive(Debug, Clone)]
pub struct AudioParam {
    default_value: f32,
    events: Vec<Automation>,
}

impl AudioParam {
    pub fn new(value: f32) -> Self {
        Self {
            default_value: value,
            events: Vec::with_capacity(EVENT_CAPACITY),
        }
    }

    /// Replace the value outright, discarding all automation.
    pub fn set_value(&mut self, value: f32) {
        self.events.clear();
        self.default_value = value;
    }

    pub fn set_value_at_time(&mut self, value: f32, time: f64) {
        self.insert(Automation::SetValue { time, value });
    }

    pub fn linear_ramp_to_value_at_time(&mut self, value: f32, time: f64) {
        self.insert(Automation::LinearRamp { time, value });
    }

    /// Exponential ramps cannot reach zero; a zero target becomes the smallest
    /// positive value.
    pub fn exponential_ramp_to_value_at_time(&mut self, value: f32, time: f64) {
        let value = if value == 0.0 { f32::MIN_POSITIVE } else { value };
        self.insert(Automation::ExponentialRamp { time, value });
    }

    /// Drop every event scheduled at or after `time`.
    pub fn cancel_scheduled_values(&mut self, time: f64) {
        self.events.retain(|e| e.time() < time);
    }

    /// Number of pending events (past events stay until `prune`).
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// Value of the parameter at audio-clock time `t`.
    pub fn value_at(&self, t: f64) -> f32 {
        let (anchor, next) = self.anchor_before(t);
        let start = anchor.value;

        match self.events.get(next) {
            Some(&Automation::LinearRamp { time, value }) => {
                let Some(progress) = ramp_progress(anchor.time, time, t) else {
                    return start;
                };
                start + (value - start) * progress
            }
            Some(&Automation::ExponentialRamp { time, value }) => {
                let Some(progress) = ramp_progress(anchor.time, time, t) else {
                    return start;
                };
                if start == 0.0 || start.signum() != value.signum() {
                    return start;
                }
                start * (value / start).powf(progress)
            }
            _ => start,
        }
    }

    /// Fold events that finished before `t` into a single anchor.
    ///
    /// `value_at(x)` is unchanged for every `x >= t`.
    pub fn prune(&mut self, t: f64) {
        let (anchor, next) = self.anchor_before(t);
        if next <= 1 {
            return;
        }

        self.events.drain(..next);
        self.default_value = anchor.value;
        self.events.insert(
            0,
            Automation::SetValue {
                time: anchor.time,
                value: anchor.value,
            },
        );
    }

    fn insert(&mut self, event: Automation) {
        // Events at the same time keep their insertion order
        let index = self.events.partition_point(|e| e.time() <= event.time());
        self.events.insert(index, event);
    }

    /// Settled state from every event at or before `t`, plus the index of the
    /// first event after `t`.
    fn anchor_before(&self, t: f64) -> (Anchor, usize) {
        let mut anchor = Anchor {
            time: f64::NEG_INFINITY,
            value: self.default_value,
        };

        for (index, event) in self.events.iter().enumerate() {
            if event.time() > t {
                return (anchor, index);
            }
            anchor = match *event {
                Automation::SetValue { time, value }
                | Automation::LinearRamp { time, value }
                | Automation::ExponentialRamp { time, value } => Anchor { time, value },
            };
        }

        (anchor, self.events.len())
    }
}

fn ramp_progress(start: f64, end: f64, t: f64) -> Option<f32> {
    let span = end - start;
    if !span.is_finite() || span <= 0.0 {
        return None;
    }
    Some(((t - start) / span).clamp(0.0, 1.0) as f32)
}
