pub mod clock;

pub use clock::{Clock, ManualClock, SystemClock};

use std::time::{Duration, SystemTime};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A single blood-glucose sample as reported by the health store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlucoseReading {
    pub mg_dl: f64,
    pub at: SystemTime,
}

/// Read side of the health store. Calls may block; the core runs them on
/// worker threads, so implementations must be shareable across threads.
pub trait SampleStore: Send + Sync {
    fn most_recent_glucose(&self) -> Result<GlucoseReading, BoxError>;

    /// Total insulin units delivered in `[now - lookback, now]`.
    fn cumulative_insulin(&self, lookback: Duration) -> Result<f64, BoxError>;
}

/// Write side of the health store for simulated bolus records.
pub trait DoseRecorder: Send + Sync {
    fn record_dose(&self, units: f64, at: SystemTime) -> Result<(), BoxError>;
}

pub trait PreferenceStore: Send + Sync {
    fn get_string(&self, key: &str) -> Option<String>;
    fn set_string(&self, key: &str, value: &str) -> Result<(), BoxError>;
}

/// Receives the formatted text the watch face would show.
pub trait DisplaySink: Send + Sync {
    fn show(&self, text: &str);
}
