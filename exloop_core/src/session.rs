//! Workout session gate and its dose ledger.
//!
//! The ledger lives behind the same lock as the session state, so a cycle
//! that settles a dose either sees the session still open and records, or
//! sees it ended and records nothing.

use std::sync::{Mutex, MutexGuard};

use crate::error::{PipelineError, Result};
use crate::ledger::DoseLedger;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Running,
    Paused,
    Ended,
}

#[derive(Debug)]
pub(crate) struct SessionInner {
    pub(crate) state: SessionState,
    pub(crate) ledger: DoseLedger,
}

#[derive(Debug)]
pub struct WorkoutSession {
    inner: Mutex<SessionInner>,
}

impl Default for WorkoutSession {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkoutSession {
    /// New session, already running, with an empty ledger.
    pub fn new() -> Self {
        Self::with_ledger(DoseLedger::new())
    }

    pub fn with_ledger(ledger: DoseLedger) -> Self {
        Self {
            inner: Mutex::new(SessionInner {
                state: SessionState::Running,
                ledger,
            }),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, SessionInner> {
        // A panic while holding the lock cannot leave the ledger half-updated
        // (single f64 store), so recover the guard.
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    pub fn total_delivered(&self) -> f64 {
        self.lock().ledger.total_delivered()
    }

    pub fn pause(&self) -> Result<()> {
        self.transition(SessionState::Paused)
    }

    pub fn resume(&self) -> Result<()> {
        self.transition(SessionState::Running)
    }

    /// End the session. Later or in-flight cycles record nothing.
    pub fn end(&self) {
        let mut inner = self.lock();
        if inner.state != SessionState::Ended {
            tracing::info!(
                total_delivered = inner.ledger.total_delivered(),
                "workout session ended"
            );
            inner.state = SessionState::Ended;
        }
    }

    fn transition(&self, to: SessionState) -> Result<()> {
        let mut inner = self.lock();
        match (inner.state, to) {
            (SessionState::Ended, _) => Err(PipelineError::State(format!(
                "cannot move an ended session to {to:?}"
            ))
            .into()),
            (from, to) if from == to => Ok(()),
            (from, to) => {
                tracing::info!(?from, ?to, "workout session state changed");
                inner.state = to;
                Ok(())
            }
        }
    }
}
