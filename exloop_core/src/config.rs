//! Runtime configuration types for the projection pipeline.
//!
//! These are the structs used by `Orchestrator`. They are separate from the
//! TOML-deserialized config in `exloop_config`.

/// Dosing configuration.
#[derive(Debug, Clone)]
pub struct DosingCfg {
    /// ISF (mg/dL per U) used when the ISF preference is unusable. Default: 75.
    pub default_isf: f64,
}

impl Default for DosingCfg {
    fn default() -> Self {
        Self { default_isf: 75.0 }
    }
}

/// How projection cycles of one session relate to each other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CyclePolicy {
    /// A cycle holds the session's cycle gate from fetch to display.
    #[default]
    Serialized,
    /// Fetches of different cycles may overlap; only the ledger update is
    /// exclusive, so the last cycle to settle sees every earlier dose.
    Overlapping,
}
