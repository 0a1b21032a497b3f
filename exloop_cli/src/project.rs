//! Workout replay: seed an in-memory health store, feed energy samples
//! through the event runner and report each cycle.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use crossbeam_channel as xch;
use exloop_config::InsulinRow;
use exloop_core::error::Result;
use exloop_core::mocks::InMemorySampleStore;
use exloop_core::prefs::FilePreferenceStore;
use exloop_core::util::round_to;
use exloop_core::{
    CycleReport, CyclePolicy, DoseOutcome, DosingCfg, EnergySample, Orchestrator, PipelineError,
    RunSummary, Statistic, WorkoutEvent, run_feed,
};
use exloop_traits::{Clock, DisplaySink, ManualClock};
use serde_json::json;

/// Prints each display block to stdout.
struct StdoutSink;

impl DisplaySink for StdoutSink {
    fn show(&self, text: &str) {
        println!("{text}\n");
    }
}

pub struct ReplayPlan<'a> {
    pub glucose: f64,
    pub history: &'a [InsulinRow],
    pub kcal: &'a [f64],
    pub pause_after: Option<usize>,
    pub end_after: Option<usize>,
}

/// Build the event sequence for a replay.
///
/// Every sample gets its own key one second after the previous one; the store
/// itself stays at a fixed instant so the look-back windows do not move.
pub fn build_events(clock: &ManualClock, plan: &ReplayPlan<'_>) -> Vec<WorkoutEvent> {
    let origin = clock.now();
    let mut events = Vec::with_capacity(plan.kcal.len() + 2);
    for (i, &kcal) in plan.kcal.iter().enumerate() {
        let at = origin + Duration::from_secs(i as u64 + 1);
        events.push(WorkoutEvent::Statistic(Statistic::ActiveEnergy(
            EnergySample { kcal, at },
        )));
        let n = i + 1;
        if plan.pause_after == Some(n) {
            events.push(WorkoutEvent::Pause);
        }
        if plan.end_after == Some(n) {
            events.push(WorkoutEvent::End);
        }
    }
    events
}

pub fn run_project(
    cfg: &exloop_config::Config,
    plan: &ReplayPlan<'_>,
    json_out: bool,
    shutdown: Arc<AtomicBool>,
) -> Result<RunSummary> {
    if !plan.glucose.is_finite() || plan.glucose <= 0.0 {
        return Err(PipelineError::Config(format!(
            "glucose must be a positive number, got {}",
            plan.glucose
        ))
        .into());
    }
    if let Some(bad) = plan.kcal.iter().find(|k| !k.is_finite()) {
        return Err(
            PipelineError::Config(format!("kcal must be a finite number, got {bad}")).into(),
        );
    }

    let clock = ManualClock::new();
    let store = Arc::new(InMemorySampleStore::new(clock.clone()));
    store.set_glucose(plan.glucose);
    for row in plan.history {
        let ago = Duration::try_from_secs_f64(row.minutes_ago * 60.0).map_err(|e| {
            PipelineError::Config(format!(
                "insulin history minutes_ago {} is out of range: {e}",
                row.minutes_ago
            ))
        })?;
        store.add_delivery(ago, row.units);
    }
    tracing::debug!(deliveries = plan.history.len(), "seeded insulin history");

    let prefs = Arc::new(FilePreferenceStore::open(&cfg.preferences.file)?);
    let dosing: DosingCfg = (&cfg.dosing).into();
    let policy: CyclePolicy = (&cfg.runner).into();

    let mut builder = Orchestrator::builder()
        .with_store(store.clone())
        .with_recorder(store.clone())
        .with_preferences(prefs)
        .with_dosing(dosing)
        .with_policy(policy)
        .with_clock(clock.clone());
    if !json_out {
        builder = builder.with_display(Arc::new(StdoutSink));
    }
    let orch = builder.build()?;

    let (tx, rx) = xch::unbounded();
    for ev in build_events(&clock, plan) {
        // Receiver is alive in this scope.
        let _ = tx.send(ev);
    }
    drop(tx);

    let summary = run_feed(&orch, &rx, &shutdown);

    if json_out {
        for report in &summary.reports {
            println!("{}", report_json(report));
        }
        println!(
            "{}",
            json!({
                "completed": summary.completed,
                "skipped": summary.skipped,
                "failed": summary.failed,
                "isf": orch.isf().value,
                "total_delivered_u": round_to(summary.total_delivered, 2),
            })
        );
    } else {
        println!(
            "Cycles: {} completed, {} skipped, {} failed",
            summary.completed, summary.skipped, summary.failed
        );
        println!(
            "Total simulated insulin: {:.2} U",
            round_to(summary.total_delivered, 2)
        );
    }
    Ok(summary)
}

fn report_json(report: &CycleReport) -> serde_json::Value {
    let (dose, units) = match &report.dose {
        DoseOutcome::Recorded { units, .. } => ("recorded", Some(*units)),
        DoseOutcome::RecordFailed { units, .. } => ("record_failed", Some(*units)),
        DoseOutcome::Suppressed { .. } => ("suppressed", None),
    };
    json!({
        "kcal": report.energy_kcal,
        "current_bg": report.projection.current_bg,
        "projected_bg": report.projection.projected_bg,
        "total_change": report.projection.total_change,
        "iob": round_to(report.iob, 2),
        "dose": dose,
        "dose_units": units,
        "total_delivered_u": round_to(report.total_delivered, 2),
    })
}

pub fn load_history(path: Option<&Path>) -> Result<Vec<InsulinRow>> {
    match path {
        Some(p) => exloop_config::load_insulin_history_csv(p),
        None => Ok(Vec::new()),
    }
}
