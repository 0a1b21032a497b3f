//! Insulin sensitivity factor from the user's preference.
//!
//! The preference is stored as a string under `ISF_KEY` and parsed as a whole
//! number. A missing, unparseable or zero value falls back to the configured
//! default instead of producing a zero divisor.

use exloop_traits::PreferenceStore;

use crate::error::{PipelineError, Result};

pub const ISF_KEY: &str = "ISF";

/// Where the effective ISF came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsfSource {
    Preference,
    /// Preference absent.
    DefaultMissing,
    /// Preference present but not a positive whole number.
    DefaultInvalid,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedIsf {
    pub value: f64,
    pub source: IsfSource,
}

pub fn resolve_isf(prefs: &dyn PreferenceStore, default_isf: f64) -> ResolvedIsf {
    let Some(raw) = prefs.get_string(ISF_KEY) else {
        tracing::debug!(default_isf, "no ISF preference; using default");
        return ResolvedIsf {
            value: default_isf,
            source: IsfSource::DefaultMissing,
        };
    };
    match raw.parse::<u32>() {
        Ok(v) if v > 0 && f64::from(v) <= exloop_config::MAX_ISF => ResolvedIsf {
            value: f64::from(v),
            source: IsfSource::Preference,
        },
        _ => {
            tracing::warn!(raw = %raw, default_isf, "unusable ISF preference; using default");
            ResolvedIsf {
                value: default_isf,
                source: IsfSource::DefaultInvalid,
            }
        }
    }
}

/// Persist a new ISF preference after range checking it.
pub fn save_isf(prefs: &dyn PreferenceStore, value: u32) -> Result<()> {
    if value == 0 || f64::from(value) > exloop_config::MAX_ISF {
        return Err(PipelineError::Config(format!(
            "ISF must be in 1..={}, got {value}",
            exloop_config::MAX_ISF
        ))
        .into());
    }
    prefs
        .set_string(ISF_KEY, &value.to_string())
        .map_err(|e| eyre::Report::new(PipelineError::Io(e.to_string())))?;
    tracing::info!(isf = value, "saved ISF preference");
    Ok(())
}
