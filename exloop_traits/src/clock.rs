use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

/// Wall-clock abstraction used to timestamp doses and anchor look-back windows.
///
/// - now(): returns the current wall-clock time
/// - before(): helper to compute `now() - d`, saturating at the Unix epoch
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;

    /// Instant `d` before `now()`, saturating at `UNIX_EPOCH` on underflow.
    fn before(&self, d: Duration) -> SystemTime {
        self.now()
            .checked_sub(d)
            .unwrap_or(SystemTime::UNIX_EPOCH)
    }
}

/// Default clock backed by `std::time::SystemTime`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl SystemClock {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Deterministic clock whose time only moves when told to.
///
/// now() = origin + offset
///
/// Clones share the same offset, so a store and an orchestrator holding
/// clones observe the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: SystemTime,
    offset: Arc<Mutex<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self::starting_at(SystemTime::now())
    }

    pub fn starting_at(origin: SystemTime) -> Self {
        Self {
            origin,
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Advance the clock by the given duration.
    pub fn advance(&self, d: Duration) {
        if let Ok(mut off) = self.offset.lock() {
            *off = off.saturating_add(d);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        let off = self.offset.lock().map(|g| *g).unwrap_or(Duration::ZERO);
        self.origin + off
    }
}
