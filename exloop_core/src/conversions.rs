//! `From` implementations bridging `exloop_config` types to `exloop_core` types.

use crate::config::{CyclePolicy, DosingCfg};

// ── DosingCfg ────────────────────────────────────────────────────────────────

impl From<&exloop_config::Dosing> for DosingCfg {
    fn from(c: &exloop_config::Dosing) -> Self {
        Self {
            default_isf: c.default_isf,
        }
    }
}

// ── CyclePolicy ──────────────────────────────────────────────────────────────

impl From<exloop_config::CycleMode> for CyclePolicy {
    fn from(m: exloop_config::CycleMode) -> Self {
        match m {
            exloop_config::CycleMode::Serialized => Self::Serialized,
            exloop_config::CycleMode::Overlapping => Self::Overlapping,
        }
    }
}

impl From<&exloop_config::RunnerCfg> for CyclePolicy {
    fn from(c: &exloop_config::RunnerCfg) -> Self {
        c.cycles.into()
    }
}
