//! Pressure → velocity mapping for pad hits.

use crate::config::TriggerConfig;

/// Lowest velocity a pressure reading can produce.
pub const MIN_VELOCITY: f32 = 0.5;

/// Highest velocity a pressure reading can produce.
pub const MAX_VELOCITY: f32 = 1.2;

/// Map a pressure reading in (0, 1] to `0.5 + 0.7·p`, clamped to [0.5, 1.2].
///
/// Devices without pressure report `None` or zero; those (and garbage
/// readings) get the configured default velocity.
pub fn velocity_from_pressure(pressure: Option<f32>, config: &TriggerConfig) -> f32 {
    match pressure {
        Some(p) if p.is_finite() && p > 0.0 => (0.5 + 0.7 * p).clamp(MIN_VELOCITY, MAX_VELOCITY),
        _ => config.default_velocity,
    }
}
