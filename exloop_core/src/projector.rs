//! Forward blood-glucose projection from exercise load and active insulin.

/// mg/dL drop per kcal burned, per unit of IOB effect.
pub const EXERCISE_SENSITIVITY: f64 = 0.125;

/// Growth of the IOB effect per unit of insulin on board.
pub const IOB_EFFECT_PER_UNIT: f64 = 0.5;

/// Result of one projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlucoseProjection {
    /// Rounded current reading (mg/dL).
    pub current_bg: f64,
    /// Rounded projected reading (mg/dL).
    pub projected_bg: f64,
    /// Full-precision change (mg/dL); negative means glucose is expected to drop.
    pub total_change: f64,
}

#[inline]
pub fn iob_effect(iob: f64) -> f64 {
    1.0 + IOB_EFFECT_PER_UNIT * iob
}

/// Project glucose from the current reading, IOB and cumulative kcal.
///
/// `current_bg` is expected to be rounded already; it is rounded again so the
/// projection holds for raw callers too.
pub fn project(current_bg: f64, iob: f64, energy_kcal: f64) -> GlucoseProjection {
    let current_bg = current_bg.round();
    let total_change = -EXERCISE_SENSITIVITY * iob_effect(iob) * energy_kcal;
    GlucoseProjection {
        current_bg,
        projected_bg: (current_bg + total_change).round(),
        total_change,
    }
}
