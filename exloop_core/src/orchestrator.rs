//! The projection cycle (`Orchestrator`).
//!
//! For each active-energy statistic: fetch glucose and the six insulin sums
//! concurrently, estimate IOB, project glucose, settle the dose ledger under
//! the session lock, then hand the formatted block to the display sink.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;

use exloop_traits::{Clock, DisplaySink, DoseRecorder, SampleStore};

use crate::config::CyclePolicy;
use crate::display::{energy_block, heart_rate_line};
use crate::error::PipelineError;
use crate::fanout;
use crate::iob::estimate_iob;
use crate::isf::ResolvedIsf;
use crate::ledger::DoseLedger;
use crate::projector::project;
use crate::session::{SessionState, WorkoutSession};
use crate::status::{CycleReport, CycleStatus, SkipReason};
use crate::types::{EnergySample, Statistic};
use crate::util::round_to;

pub struct Orchestrator {
    pub(crate) store: Arc<dyn SampleStore>,
    pub(crate) recorder: Arc<dyn DoseRecorder>,
    pub(crate) sink: Option<Arc<dyn DisplaySink>>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) isf: ResolvedIsf,
    pub(crate) policy: CyclePolicy,
    pub(crate) session: Arc<WorkoutSession>,
    pub(crate) cycle_gate: Mutex<()>,
    pub(crate) in_flight: Mutex<HashSet<SystemTime>>,
}

impl core::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("isf", &self.isf)
            .field("policy", &self.policy)
            .field("session", &self.session.state())
            .field("total_delivered", &self.session.total_delivered())
            .finish()
    }
}

/// Marks a sample key as in flight until dropped.
struct InFlight<'a> {
    set: &'a Mutex<HashSet<SystemTime>>,
    key: SystemTime,
}

impl<'a> InFlight<'a> {
    fn claim(set: &'a Mutex<HashSet<SystemTime>>, key: SystemTime) -> Option<Self> {
        let inserted = set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key);
        inserted.then_some(Self { set, key })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

impl Orchestrator {
    pub fn session(&self) -> &Arc<WorkoutSession> {
        &self.session
    }

    pub fn isf(&self) -> ResolvedIsf {
        self.isf
    }

    pub fn policy(&self) -> CyclePolicy {
        self.policy
    }

    /// Handle one statistic from the workout data source.
    pub fn on_statistic(&self, stat: Statistic) -> CycleStatus {
        match stat {
            Statistic::ActiveEnergy(sample) => self.run_cycle(sample),
            Statistic::HeartRate { bpm, .. } => {
                if self.session.state() == SessionState::Ended {
                    return CycleStatus::Skipped(SkipReason::SessionEnded);
                }
                let line = heart_rate_line(bpm);
                if let Some(sink) = &self.sink {
                    sink.show(&line);
                }
                CycleStatus::Displayed(line)
            }
            Statistic::Distance { .. } => CycleStatus::Skipped(SkipReason::Ignored),
        }
    }

    fn run_cycle(&self, sample: EnergySample) -> CycleStatus {
        if let Some(reason) = self.gate_reason() {
            return CycleStatus::Skipped(reason);
        }
        if !sample.kcal.is_finite() {
            tracing::warn!(kcal = sample.kcal, "non-finite energy sample dropped");
            return CycleStatus::Skipped(SkipReason::InvalidEnergy);
        }
        let Some(_claim) = InFlight::claim(&self.in_flight, sample.at) else {
            tracing::debug!("cycle for this sample already in flight");
            return CycleStatus::Skipped(SkipReason::DuplicateInFlight);
        };
        let _gate = match self.policy {
            CyclePolicy::Serialized => Some(
                self.cycle_gate
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner),
            ),
            CyclePolicy::Overlapping => None,
        };
        // The session may have ended while this cycle waited on the gate.
        if self.session.state() == SessionState::Ended {
            return CycleStatus::Skipped(SkipReason::SessionEnded);
        }

        let kcal = sample.kcal.round();
        let inputs = fanout::gather(self.store.as_ref());
        let glucose = match inputs.glucose {
            Ok(g) => g,
            Err(e) => {
                tracing::error!(error = %e, kcal, "glucose fetch failed; cycle dropped");
                return CycleStatus::Failed(PipelineError::GlucoseUnavailable(e));
            }
        };

        let iob = estimate_iob(&inputs.insulin);
        let projection = project(glucose.mg_dl, iob, kcal);
        let required = DoseLedger::required_total(projection.total_change, self.isf.value);

        let (dose, total_delivered) = {
            let mut inner = self.session.lock();
            if inner.state == SessionState::Ended {
                tracing::info!(kcal, "session ended mid-cycle; result discarded");
                return CycleStatus::Skipped(SkipReason::SessionEnded);
            }
            let dose = inner
                .ledger
                .settle(required, self.recorder.as_ref(), self.clock.as_ref());
            (dose, inner.ledger.total_delivered())
        };

        let display = energy_block(kcal, projection.current_bg, projection.projected_bg);
        if let Some(sink) = &self.sink {
            sink.show(&display);
        }
        tracing::info!(
            kcal,
            current_bg = projection.current_bg,
            projected_bg = projection.projected_bg,
            iob = round_to(iob, 2),
            total_delivered = round_to(total_delivered, 2),
            "projection cycle"
        );

        CycleStatus::Completed(Box::new(CycleReport {
            energy_kcal: kcal,
            iob,
            projection,
            dose,
            total_delivered,
            display,
        }))
    }

    fn gate_reason(&self) -> Option<SkipReason> {
        match self.session.state() {
            SessionState::Running => None,
            SessionState::Paused => Some(SkipReason::NotRunning),
            SessionState::Ended => Some(SkipReason::SessionEnded),
        }
    }
}
