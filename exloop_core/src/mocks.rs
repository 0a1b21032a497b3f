//! In-memory stand-ins for the health store, display and preferences.
//!
//! Used by the CLI simulation and by tests.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime};

use exloop_traits::{
    BoxError, Clock, DisplaySink, DoseRecorder, GlucoseReading, PreferenceStore, SampleStore,
};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
struct StoreState {
    glucose: Option<GlucoseReading>,
    deliveries: Vec<(SystemTime, f64)>,
    recorded: Vec<(SystemTime, f64)>,
    failing_lookbacks: HashSet<Duration>,
    fail_glucose: bool,
    fail_records: bool,
}

/// Health store backed by vectors, anchored to an injected clock.
///
/// Doses recorded through `DoseRecorder` become deliveries, so later
/// cumulative queries see them.
pub struct InMemorySampleStore {
    clock: Arc<dyn Clock>,
    state: Mutex<StoreState>,
}

impl InMemorySampleStore {
    pub fn new(clock: impl Clock + 'static) -> Self {
        Self {
            clock: Arc::new(clock),
            state: Mutex::new(StoreState::default()),
        }
    }

    /// Set the most recent glucose reading, stamped now.
    pub fn set_glucose(&self, mg_dl: f64) {
        let at = self.clock.now();
        lock(&self.state).glucose = Some(GlucoseReading { mg_dl, at });
    }

    /// Add a delivery that happened `ago` before now.
    pub fn add_delivery(&self, ago: Duration, units: f64) {
        let at = self.clock.before(ago);
        lock(&self.state).deliveries.push((at, units));
    }

    /// Make the cumulative query for exactly this look-back fail.
    pub fn fail_lookback(&self, lookback: Duration) {
        lock(&self.state).failing_lookbacks.insert(lookback);
    }

    pub fn fail_glucose(&self, fail: bool) {
        lock(&self.state).fail_glucose = fail;
    }

    pub fn fail_records(&self, fail: bool) {
        lock(&self.state).fail_records = fail;
    }

    /// Doses written through `DoseRecorder`, oldest first.
    pub fn recorded(&self) -> Vec<(SystemTime, f64)> {
        lock(&self.state).recorded.clone()
    }

    pub fn recorded_units(&self) -> Vec<f64> {
        lock(&self.state).recorded.iter().map(|(_, u)| *u).collect()
    }
}

impl SampleStore for InMemorySampleStore {
    fn most_recent_glucose(&self) -> Result<GlucoseReading, BoxError> {
        let st = lock(&self.state);
        if st.fail_glucose {
            return Err(Box::new(std::io::Error::other("glucose query failed")));
        }
        st.glucose
            .ok_or_else(|| Box::new(std::io::Error::other("no glucose samples")) as BoxError)
    }

    fn cumulative_insulin(&self, lookback: Duration) -> Result<f64, BoxError> {
        let now = self.clock.now();
        let start = self.clock.before(lookback);
        let st = lock(&self.state);
        if st.failing_lookbacks.contains(&lookback) {
            return Err(Box::new(std::io::Error::other(format!(
                "insulin query for {lookback:?} failed"
            ))));
        }
        Ok(st
            .deliveries
            .iter()
            .filter(|(at, _)| *at >= start && *at <= now)
            .map(|(_, u)| u)
            .sum())
    }
}

impl DoseRecorder for InMemorySampleStore {
    fn record_dose(&self, units: f64, at: SystemTime) -> Result<(), BoxError> {
        let mut st = lock(&self.state);
        if st.fail_records {
            return Err(Box::new(std::io::Error::other("health store rejected sample")));
        }
        st.deliveries.push((at, units));
        st.recorded.push((at, units));
        Ok(())
    }
}

/// Display sink that keeps every block shown.
#[derive(Debug, Default)]
pub struct RecordingSink {
    shown: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shown(&self) -> Vec<String> {
        lock(&self.shown).clone()
    }

    pub fn last(&self) -> Option<String> {
        lock(&self.shown).last().cloned()
    }
}

impl DisplaySink for RecordingSink {
    fn show(&self, text: &str) {
        lock(&self.shown).push(text.to_string());
    }
}

#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(key: &str, value: &str) -> Self {
        let prefs = Self::default();
        lock(&prefs.values).insert(key.to_string(), value.to_string());
        prefs
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get_string(&self, key: &str) -> Option<String> {
        lock(&self.values).get(key).cloned()
    }

    fn set_string(&self, key: &str, value: &str) -> Result<(), BoxError> {
        lock(&self.values).insert(key.to_string(), value.to_string());
        Ok(())
    }
}
