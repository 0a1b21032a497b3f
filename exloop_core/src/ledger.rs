//! Session-scoped ledger of simulated insulin.
//!
//! The ledger tracks how much insulin this session has already recorded and
//! records only the increment still missing towards the amount implied by the
//! latest projection. Increments below `MIN_DOSE_U` are dropped entirely.
//!
//! The persisted dose is rounded to two decimals while the ledger keeps the
//! unrounded increment, so the ledger and the sum of persisted records drift
//! apart by up to half a hundredth of a unit per dose.

use exloop_traits::{Clock, DoseRecorder};

use crate::util::round_to;

/// Smallest increment (U) worth recording.
pub const MIN_DOSE_U: f64 = 0.05;

/// What a settle would do for a given required total.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DosePlan {
    /// Record `units` (rounded) and accumulate `increment` (unrounded).
    Record { units: f64, increment: f64 },
    /// Increment below threshold (or negative); nothing happens.
    Suppress { increment: f64 },
}

/// What a settle actually did.
#[derive(Debug, Clone, PartialEq)]
pub enum DoseOutcome {
    Recorded { units: f64, increment: f64 },
    /// The recorder failed; the ledger still accumulated `increment`.
    RecordFailed {
        units: f64,
        increment: f64,
        error: String,
    },
    Suppressed { increment: f64 },
}

impl DoseOutcome {
    /// Units handed to the recorder, if any.
    pub fn recorded_units(&self) -> Option<f64> {
        match self {
            Self::Recorded { units, .. } | Self::RecordFailed { units, .. } => Some(*units),
            Self::Suppressed { .. } => None,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct DoseLedger {
    total_delivered: f64,
}

impl DoseLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger that starts from a known total (used to resume or in tests).
    pub fn with_total(total_delivered: f64) -> Self {
        Self {
            total_delivered: total_delivered.max(0.0),
        }
    }

    pub fn total_delivered(&self) -> f64 {
        self.total_delivered
    }

    /// Cumulative insulin implied by a projected glucose change.
    #[inline]
    pub fn required_total(total_change: f64, isf: f64) -> f64 {
        -total_change / isf
    }

    pub fn plan(&self, required_total: f64) -> DosePlan {
        let increment = required_total - self.total_delivered;
        if increment >= MIN_DOSE_U {
            DosePlan::Record {
                units: round_to(increment, 2),
                increment,
            }
        } else {
            DosePlan::Suppress { increment }
        }
    }

    /// Record the missing increment towards `required_total`, at most once.
    pub fn settle(
        &mut self,
        required_total: f64,
        recorder: &dyn DoseRecorder,
        clock: &dyn Clock,
    ) -> DoseOutcome {
        match self.plan(required_total) {
            DosePlan::Suppress { increment } => {
                tracing::debug!(increment, "dose below threshold; suppressed");
                DoseOutcome::Suppressed { increment }
            }
            DosePlan::Record { units, increment } => {
                let outcome = match recorder.record_dose(units, clock.now()) {
                    Ok(()) => {
                        tracing::info!(units, "bolused");
                        DoseOutcome::Recorded { units, increment }
                    }
                    Err(e) => {
                        tracing::warn!(units, error = %e, "saving insulin sample failed");
                        DoseOutcome::RecordFailed {
                            units,
                            increment,
                            error: e.to_string(),
                        }
                    }
                };
                self.total_delivered += increment;
                outcome
            }
        }
    }
}
