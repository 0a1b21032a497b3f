#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and insulin-history parsing for the projection pipeline.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - The insulin-history CSV loader enforces headers and rejects rows that
//!   would poison the look-back sums (negative or non-finite values).
use serde::Deserialize;
use std::path::PathBuf;

/// Largest ISF accepted anywhere in the stack (mg/dL per unit).
pub const MAX_ISF: f64 = 1000.0;

/// Oldest insulin-history row accepted, in minutes (one week). Only the last
/// three hours feed the estimate.
pub const MAX_HISTORY_MINUTES: f64 = 7.0 * 24.0 * 60.0;

/// Insulin-history CSV schema.
///
/// Expected headers:
/// minutes_ago,units
///
/// Example:
/// minutes_ago,units
/// 20,1.5
/// 95,0.8
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct InsulinRow {
    pub minutes_ago: f64,
    pub units: f64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Dosing {
    /// ISF used when the user preference is absent, unparseable or zero.
    pub default_isf: f64,
}

impl Default for Dosing {
    fn default() -> Self {
        Self { default_isf: 75.0 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// TOML file holding string preferences (the "ISF" key lives here).
    pub file: PathBuf,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            file: PathBuf::from("etc/preferences.toml"),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CycleMode {
    /// One projection cycle at a time per session.
    #[default]
    Serialized,
    /// Cycles may overlap while fetching; ledger updates stay atomic.
    Overlapping,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RunnerCfg {
    pub cycles: CycleMode,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub dosing: Dosing,
    #[serde(default)]
    pub preferences: Preferences,
    #[serde(default)]
    pub runner: RunnerCfg,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Dosing
        let isf = self.dosing.default_isf;
        if !isf.is_finite() || isf <= 0.0 {
            eyre::bail!("dosing.default_isf must be > 0");
        }
        if isf > MAX_ISF {
            eyre::bail!("dosing.default_isf is unreasonably large (>{MAX_ISF})");
        }

        // Preferences
        if self.preferences.file.as_os_str().is_empty() {
            eyre::bail!("preferences.file must not be empty");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got {rot:?}");
        }

        // Runner: no extra validation; serde restricts to known modes

        Ok(())
    }
}

pub fn load_insulin_history_csv(path: &std::path::Path) -> eyre::Result<Vec<InsulinRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open insulin history CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["minutes_ago", "units"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "insulin history CSV must have headers 'minutes_ago,units', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<InsulinRow>().enumerate() {
        let line = idx + 2;
        let row = rec.map_err(|e| eyre::eyre!("invalid CSV row {line}: {e}"))?;
        if !row.minutes_ago.is_finite() || row.minutes_ago < 0.0 {
            eyre::bail!("row {line}: minutes_ago must be a non-negative number");
        }
        if row.minutes_ago > MAX_HISTORY_MINUTES {
            eyre::bail!("row {line}: minutes_ago must be at most {MAX_HISTORY_MINUTES}");
        }
        if !row.units.is_finite() || row.units < 0.0 {
            eyre::bail!("row {line}: units must be a non-negative number");
        }
        rows.push(row);
    }
    Ok(rows)
}
