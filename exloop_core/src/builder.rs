//! Type-state builder for `Orchestrator`.
//!
//! The builder enforces at compile time that a sample store and a dose
//! recorder are provided before `build()` is available. `try_build()` is
//! always available for dynamic checks.

use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex};

use exloop_traits::{Clock, DisplaySink, DoseRecorder, PreferenceStore, SampleStore, SystemClock};

use crate::config::{CyclePolicy, DosingCfg};
use crate::error::{BuildError, Result};
use crate::isf::{IsfSource, ResolvedIsf, resolve_isf};
use crate::orchestrator::Orchestrator;
use crate::session::WorkoutSession;

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

impl Orchestrator {
    /// Start building an Orchestrator.
    pub fn builder() -> OrchestratorBuilder<Missing, Missing> {
        OrchestratorBuilder::default()
    }
}

/// Builder for `Orchestrator`. All fields are validated on `build()`.
pub struct OrchestratorBuilder<S, R> {
    store: Option<Arc<dyn SampleStore>>,
    recorder: Option<Arc<dyn DoseRecorder>>,
    sink: Option<Arc<dyn DisplaySink>>,
    clock: Option<Arc<dyn Clock>>,
    preferences: Option<Arc<dyn PreferenceStore>>,
    dosing: Option<DosingCfg>,
    policy: Option<CyclePolicy>,
    session: Option<Arc<WorkoutSession>>,
    _s: PhantomData<S>,
    _r: PhantomData<R>,
}

impl Default for OrchestratorBuilder<Missing, Missing> {
    fn default() -> Self {
        Self {
            store: None,
            recorder: None,
            sink: None,
            clock: None,
            preferences: None,
            dosing: None,
            policy: None,
            session: None,
            _s: PhantomData,
            _r: PhantomData,
        }
    }
}

impl<S, R> OrchestratorBuilder<S, R> {
    /// Fallible build available in any type-state; returns detailed error for missing pieces.
    pub fn try_build(self) -> Result<Orchestrator> {
        let store = self
            .store
            .ok_or_else(|| eyre::Report::new(BuildError::MissingSampleStore))?;
        let recorder = self
            .recorder
            .ok_or_else(|| eyre::Report::new(BuildError::MissingDoseRecorder))?;
        let dosing = self.dosing.unwrap_or_default();

        // ── Validation ───────────────────────────────────────────────────────
        if !dosing.default_isf.is_finite() || dosing.default_isf <= 0.0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "default_isf must be > 0",
            )));
        }
        if dosing.default_isf > exloop_config::MAX_ISF {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "default_isf out of range",
            )));
        }

        // ISF is read once per configuration load.
        let isf = match &self.preferences {
            Some(prefs) => resolve_isf(prefs.as_ref(), dosing.default_isf),
            None => ResolvedIsf {
                value: dosing.default_isf,
                source: IsfSource::DefaultMissing,
            },
        };
        tracing::info!(isf = isf.value, source = ?isf.source, "insulin sensitivity factor");

        Ok(Orchestrator {
            store,
            recorder,
            sink: self.sink,
            clock: self
                .clock
                .unwrap_or_else(|| Arc::new(SystemClock::new()) as Arc<dyn Clock>),
            isf,
            policy: self.policy.unwrap_or_default(),
            session: self.session.unwrap_or_default(),
            cycle_gate: Mutex::new(()),
            in_flight: Mutex::new(HashSet::new()),
        })
    }
}

/// Chainable setters that do not affect type-state.
impl<S, R> OrchestratorBuilder<S, R> {
    pub fn with_display<D: DisplaySink + 'static>(mut self, sink: Arc<D>) -> Self {
        let sink: Arc<dyn DisplaySink> = sink;
        self.sink = Some(sink);
        self
    }
    /// Provide a custom clock implementation; defaults to `SystemClock` when not provided.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(clock);
        self.clock = Some(clock);
        self
    }
    /// Preference store the ISF is read from at build time.
    pub fn with_preferences<P: PreferenceStore + 'static>(mut self, prefs: Arc<P>) -> Self {
        let prefs: Arc<dyn PreferenceStore> = prefs;
        self.preferences = Some(prefs);
        self
    }
    pub fn with_dosing(mut self, dosing: DosingCfg) -> Self {
        self.dosing = Some(dosing);
        self
    }
    pub fn with_policy(mut self, policy: CyclePolicy) -> Self {
        self.policy = Some(policy);
        self
    }
    /// Share an existing session (and its ledger) instead of starting a new one.
    pub fn with_session(mut self, session: Arc<WorkoutSession>) -> Self {
        self.session = Some(session);
        self
    }
}

// Setters that advance type-state
impl<R> OrchestratorBuilder<Missing, R> {
    pub fn with_store<T: SampleStore + 'static>(self, store: Arc<T>) -> OrchestratorBuilder<Set, R> {
        let store: Arc<dyn SampleStore> = store;
        OrchestratorBuilder {
            store: Some(store),
            recorder: self.recorder,
            sink: self.sink,
            clock: self.clock,
            preferences: self.preferences,
            dosing: self.dosing,
            policy: self.policy,
            session: self.session,
            _s: PhantomData,
            _r: PhantomData,
        }
    }
}

impl<S> OrchestratorBuilder<S, Missing> {
    pub fn with_recorder<T: DoseRecorder + 'static>(
        self,
        recorder: Arc<T>,
    ) -> OrchestratorBuilder<S, Set> {
        let recorder: Arc<dyn DoseRecorder> = recorder;
        OrchestratorBuilder {
            store: self.store,
            recorder: Some(recorder),
            sink: self.sink,
            clock: self.clock,
            preferences: self.preferences,
            dosing: self.dosing,
            policy: self.policy,
            session: self.session,
            _s: PhantomData,
            _r: PhantomData,
        }
    }
}

impl OrchestratorBuilder<Set, Set> {
    /// Validate and build the Orchestrator. Only available when store and recorder are set.
    pub fn build(self) -> Result<Orchestrator> {
        self.try_build()
    }
}
