use exloop_config::{CycleMode, load_toml};
use rstest::rstest;

#[test]
fn empty_document_uses_defaults() {
    let cfg = load_toml("").expect("parse TOML");
    cfg.validate().expect("defaults are valid");
    assert_eq!(cfg.dosing.default_isf, 75.0);
    assert_eq!(cfg.runner.cycles, CycleMode::Serialized);
    assert!(cfg.logging.file.is_none());
}

#[test]
fn parses_full_document() {
    let toml = r#"
[dosing]
default_isf = 40.0

[preferences]
file = "/tmp/prefs.toml"

[runner]
cycles = "overlapping"

[logging]
file = "exloop.log"
level = "debug"
rotation = "daily"
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("valid config");
    assert_eq!(cfg.dosing.default_isf, 40.0);
    assert_eq!(cfg.runner.cycles, CycleMode::Overlapping);
    assert_eq!(cfg.preferences.file.to_str(), Some("/tmp/prefs.toml"));
    assert_eq!(cfg.logging.level.as_deref(), Some("debug"));
}

#[rstest]
#[case("0.0", "default_isf must be > 0")]
#[case("-5.0", "default_isf must be > 0")]
#[case("nan", "default_isf must be > 0")]
#[case("5000.0", "unreasonably large")]
fn rejects_bad_default_isf(#[case] value: &str, #[case] needle: &str) {
    let toml = format!("[dosing]\ndefault_isf = {value}\n");
    let cfg = load_toml(&toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject ISF");
    assert!(format!("{err}").contains(needle), "got: {err}");
}

#[test]
fn rejects_unknown_rotation() {
    let cfg = load_toml("[logging]\nrotation = \"weekly\"\n").expect("parse TOML");
    let err = cfg.validate().expect_err("should reject rotation");
    assert!(format!("{err}").contains("logging.rotation"));
}

#[test]
fn rejects_empty_preferences_path() {
    let cfg = load_toml("[preferences]\nfile = \"\"\n").expect("parse TOML");
    assert!(cfg.validate().is_err());
}

#[test]
fn unknown_cycle_mode_is_a_parse_error() {
    assert!(load_toml("[runner]\ncycles = \"parallel\"\n").is_err());
}
