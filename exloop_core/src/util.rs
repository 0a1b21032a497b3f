//! Rounding and time helpers shared across the pipeline.

use std::time::Duration;

/// Number of seconds in one hour.
pub const SECS_PER_HOUR: f64 = 3_600.0;

/// Round half away from zero to `places` decimal places.
#[inline]
pub fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

/// Convert fractional hours into a `Duration`.
/// - Negative or non-finite input clamps to zero.
#[inline]
pub fn hours(h: f64) -> Duration {
    if !h.is_finite() || h <= 0.0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(h * SECS_PER_HOUR)
}
