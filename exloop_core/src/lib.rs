#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Glucose projection and insulin-on-board pipeline.
//!
//! This crate holds the platform-independent part of the watch app. All
//! health-store access goes through the `exloop_traits` seams
//! (`SampleStore`, `DoseRecorder`, `PreferenceStore`, `DisplaySink`, `Clock`).
//!
//! ## Architecture
//!
//! - **IOB**: weighted decay over six cumulative look-back sums (`iob`)
//! - **Projection**: exercise and IOB driven glucose change (`projector`)
//! - **Ledger**: incremental simulated dosing with a 0.05 U floor (`ledger`)
//! - **Fan-out**: concurrent fetch of one cycle's inputs (`fanout`)
//! - **Session**: Running / Paused / Ended gate owning the ledger (`session`)
//! - **Orchestrator**: one projection cycle per energy statistic (`orchestrator`)
//! - **Runner**: event feed driver used by the CLI (`runner`)

pub mod atomic;
pub mod builder;
pub mod config;
pub mod conversions;
pub mod display;
pub mod error;
pub mod fanout;
pub mod iob;
pub mod isf;
pub mod ledger;
pub mod mocks;
pub mod orchestrator;
pub mod prefs;
pub mod projector;
pub mod runner;
pub mod session;
pub mod status;
pub mod types;
pub mod util;

pub use builder::OrchestratorBuilder;
pub use config::{CyclePolicy, DosingCfg};
pub use error::{BuildError, PipelineError};
pub use iob::{InsulinSums, estimate_iob};
pub use isf::{IsfSource, ResolvedIsf};
pub use ledger::{DoseLedger, DoseOutcome, DosePlan, MIN_DOSE_U};
pub use orchestrator::Orchestrator;
pub use projector::{GlucoseProjection, project};
pub use runner::{RunSummary, WorkoutEvent, run_feed};
pub use session::{SessionState, WorkoutSession};
pub use status::{CycleReport, CycleStatus, SkipReason};
pub use types::{EnergySample, Statistic};
