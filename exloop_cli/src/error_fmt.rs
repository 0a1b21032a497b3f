//! Human-readable error descriptions and structured JSON error formatting.

use exloop_core::error::{BuildError, PipelineError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingSampleStore => {
                "What happened: No health sample store was provided to the pipeline.\nLikely causes: The store failed to initialize or was not wired into the builder.\nHow to fix: Pass a store via with_store(...).".to_string()
            }
            BuildError::MissingDoseRecorder => {
                "What happened: No dose recorder was provided to the pipeline.\nLikely causes: The recorder was not wired into the builder.\nHow to fix: Pass a recorder via with_recorder(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the [dosing] section of the config, then rerun."
            ),
        };
    }

    if let Some(pe) = err.downcast_ref::<PipelineError>() {
        return match pe {
            PipelineError::GlucoseUnavailable(why) => format!(
                "What happened: No usable glucose reading ({why}).\nLikely causes: The health store has no recent glucose samples.\nHow to fix: Provide a glucose value and rerun."
            ),
            PipelineError::State(why) => format!(
                "What happened: Workout session rejected the request ({why}).\nLikely causes: The session already ended.\nHow to fix: Start a new workout."
            ),
            PipelineError::Config(why) => format!(
                "What happened: {why}.\nLikely causes: An argument or preference is out of range.\nHow to fix: Check the value and rerun."
            ),
            PipelineError::Io(why) => format!(
                "What happened: Could not write preferences ({why}).\nLikely causes: Missing directory permissions or a read-only file.\nHow to fix: Check preferences.file in the config."
            ),
        };
    }

    if err.downcast_ref::<toml::de::Error>().is_some() {
        return format!(
            "What happened: The config file is not valid TOML for this tool.\nLikely causes: Typo, unknown enum value or wrong value type.\nHow to fix: Compare with etc/exloop_config.toml. Parser said: {err}"
        );
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("insulin history csv must have headers") {
        return "Invalid headers in insulin history CSV. Expected 'minutes_ago,units'.".to_string();
    }

    if lower.contains("default_isf")
        || lower.contains("preferences.file")
        || lower.contains("logging.rotation")
    {
        return format!(
            "What happened: Configuration is invalid ({msg}).\nLikely causes: Out-of-range or empty values.\nHow to fix: Edit the TOML config and try again."
        );
    }

    if lower.contains("read config") {
        return format!(
            "What happened: Could not read the config file ({msg}).\nHow to fix: Pass --config FILE or create etc/exloop_config.toml."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes for typed pipeline errors; everything else returns 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if let Some(pe) = err.downcast_ref::<PipelineError>() {
        return match pe {
            PipelineError::GlucoseUnavailable(_) => 3,
            PipelineError::State(_) => 4,
            PipelineError::Config(_) => 5,
            PipelineError::Io(_) => 6,
        };
    }
    if err.downcast_ref::<BuildError>().is_some() {
        return 5;
    }
    1
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(pe) = err.downcast_ref::<PipelineError>() {
        return match pe {
            PipelineError::GlucoseUnavailable(_) => "GlucoseUnavailable",
            PipelineError::State(_) => "State",
            PipelineError::Config(_) => "Config",
            PipelineError::Io(_) => "Io",
        };
    }
    if err.downcast_ref::<BuildError>().is_some() {
        return "Build";
    }
    "Error"
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_errors_map_to_stable_codes() {
        let err = eyre::Report::new(PipelineError::Config("ISF must be in 1..=1000".into()));
        assert_eq!(exit_code_for_error(&err), 5);
        assert!(humanize(&err).contains("ISF must be in"));

        let err = eyre::eyre!("anything else");
        assert_eq!(exit_code_for_error(&err), 1);
    }

    #[test]
    fn json_error_has_reason_and_message() {
        let err = eyre::Report::new(PipelineError::Io("disk full".into()));
        let v: serde_json::Value =
            serde_json::from_str(&format_error_json(&err)).expect("valid json");
        assert_eq!(v["reason"], "Io");
        assert_eq!(v["exit_code"], 6);
        assert!(v["message"].as_str().is_some_and(|m| m.contains("disk full")));
    }
}
