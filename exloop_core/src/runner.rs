//! Drive an orchestrator from a feed of workout events.
//!
//! Lifecycle events are applied in arrival order. Statistics run inline under
//! `CyclePolicy::Serialized`; under `CyclePolicy::Overlapping` each one gets a
//! scoped worker thread, so a slow fetch does not hold back the next sample.
use crossbeam_channel as xch;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::config::CyclePolicy;
use crate::orchestrator::Orchestrator;
use crate::status::{CycleReport, CycleStatus};
use crate::types::Statistic;

/// Poll interval for the shutdown flag while the feed is idle.
const IDLE_POLL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorkoutEvent {
    Statistic(Statistic),
    Pause,
    Resume,
    End,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunSummary {
    pub completed: usize,
    pub displayed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub total_delivered: f64,
    /// Completed cycle reports in completion order.
    pub reports: Vec<CycleReport>,
}

impl RunSummary {
    fn absorb(&mut self, status: CycleStatus) {
        match status {
            CycleStatus::Completed(report) => {
                self.completed += 1;
                self.reports.push(*report);
            }
            CycleStatus::Displayed(_) => self.displayed += 1,
            CycleStatus::Skipped(_) => self.skipped += 1,
            CycleStatus::Failed(_) => self.failed += 1,
        }
    }
}

/// Drain `rx` until it disconnects, an `End` event arrives, or `shutdown` is
/// raised. Shutdown and `End` both end the session; cycles still in flight
/// finish but record nothing.
pub fn run_feed(
    orch: &Orchestrator,
    rx: &xch::Receiver<WorkoutEvent>,
    shutdown: &Arc<AtomicBool>,
) -> RunSummary {
    let (done_tx, done_rx) = xch::unbounded::<CycleStatus>();
    let mut summary = RunSummary::default();

    std::thread::scope(|scope| {
        loop {
            if shutdown.load(Ordering::Relaxed) {
                tracing::info!("shutdown requested; ending session");
                orch.session().end();
                break;
            }
            let ev = match rx.recv_timeout(IDLE_POLL) {
                Ok(ev) => ev,
                Err(xch::RecvTimeoutError::Timeout) => continue,
                Err(xch::RecvTimeoutError::Disconnected) => break,
            };
            match ev {
                WorkoutEvent::Statistic(stat) => match orch.policy() {
                    CyclePolicy::Serialized => summary.absorb(orch.on_statistic(stat)),
                    CyclePolicy::Overlapping => {
                        let done_tx = done_tx.clone();
                        scope.spawn(move || {
                            let _ = done_tx.send(orch.on_statistic(stat));
                        });
                    }
                },
                WorkoutEvent::Pause => {
                    if let Err(e) = orch.session().pause() {
                        tracing::warn!(error = %e, "pause ignored");
                    }
                }
                WorkoutEvent::Resume => {
                    if let Err(e) = orch.session().resume() {
                        tracing::warn!(error = %e, "resume ignored");
                    }
                }
                WorkoutEvent::End => {
                    orch.session().end();
                    break;
                }
            }
        }
    });
    drop(done_tx);

    for status in done_rx.try_iter() {
        summary.absorb(status);
    }
    summary.total_delivered = orch.session().total_delivered();
    summary
}
