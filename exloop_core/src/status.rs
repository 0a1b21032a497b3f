//! Status returned for each statistic handed to the orchestrator.

use crate::error::PipelineError;
use crate::ledger::DoseOutcome;
use crate::projector::GlucoseProjection;

/// Everything one completed projection cycle produced.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// Rounded cumulative kcal the cycle projected from.
    pub energy_kcal: f64,
    pub iob: f64,
    pub projection: GlucoseProjection,
    pub dose: DoseOutcome,
    /// Ledger total after this cycle settled.
    pub total_delivered: f64,
    pub display: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Session paused; sample not processed.
    NotRunning,
    /// Session ended before or during the cycle; nothing recorded.
    SessionEnded,
    /// A cycle for the same sample is still fetching.
    DuplicateInFlight,
    /// Statistic type that does not drive a projection.
    Ignored,
    /// Energy value is NaN or infinite; nothing fetched or recorded.
    InvalidEnergy,
}

/// Public status of a single statistic delivery.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleStatus {
    /// Projection cycle completed.
    Completed(Box<CycleReport>),
    /// Display-only update (heart rate).
    Displayed(String),
    Skipped(SkipReason),
    /// Cycle aborted with a typed error; nothing recorded or displayed.
    Failed(PipelineError),
}
