use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use tempfile::{TempDir, tempdir};

// Minimal valid config whose preference file lives inside the temp dir.
fn write_valid_config(dir: &TempDir) -> PathBuf {
    let prefs = dir.path().join("prefs.toml");
    let toml = format!(
        r#"
[dosing]
default_isf = 75.0

[preferences]
file = "{}"

[runner]
cycles = "serialized"
"#,
        prefs.display().to_string().replace('\\', "/")
    );
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

// One unit in each half-hour bucket of the last three hours.
fn write_history(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("history.csv");
    let mut f = fs::File::create(&path).unwrap();
    writeln!(f, "minutes_ago,units").unwrap();
    for m in [10, 40, 70, 100, 130, 160] {
        writeln!(f, "{m},1.0").unwrap();
    }
    path
}

fn exloop(cfg: &PathBuf) -> Command {
    let mut cmd = Command::cargo_bin("exloop").unwrap();
    cmd.arg("--config").arg(cfg);
    cmd
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["self-check"], 0, "OK", "stdout")]
#[case(&["isf", "show"], 0, "DefaultMissing", "stdout")]
#[case(&["project", "--glucose", "140"], 2, "required", "stderr")]
#[case(&["project", "--glucose=0", "--kcal", "100"], 5, "glucose must be a positive number", "stderr")]
#[case(&["project", "--glucose", "140", "--kcal", "inf"], 5, "kcal must be a finite number", "stderr")]
#[case(&["isf", "set", "0"], 5, "ISF must be in", "stderr")]
#[case(&["isf", "set", "abc"], 2, "invalid value", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = exloop(&cfg);
    for a in args {
        cmd.arg(a);
    }

    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[test]
fn project_prints_display_block_and_total() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let history = write_history(&dir);

    exloop(&cfg)
        .args(["project", "--glucose", "146.4", "--insulin-history"])
        .arg(&history)
        .args(["--kcal", "100"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "100.0 cal\nC: 146.0 mg/dL\nF: 112.0 mg/dL",
        ))
        .stdout(predicate::str::contains("Total simulated insulin: 0.46 U"));
}

#[test]
fn project_json_lines_follow_the_ledger() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let history = write_history(&dir);

    let out = exloop(&cfg)
        .arg("--json")
        .args(["project", "--glucose", "146", "--insulin-history"])
        .arg(&history)
        .args(["--kcal", "100", "--kcal", "100", "--kcal", "180"])
        .output()
        .unwrap();
    assert!(out.status.success());

    let lines: Vec<serde_json::Value> = String::from_utf8(out.stdout)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).expect("json line"))
        .collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0]["dose"], "recorded");
    assert_eq!(lines[0]["dose_units"], 0.46);
    assert_eq!(lines[0]["projected_bg"], 112.0);
    // Second sample repeats the same energy: the earlier dose already covers it.
    assert_eq!(lines[1]["dose"], "suppressed");
    assert_eq!(lines[2]["dose_units"], 0.44);
    assert_eq!(lines[3]["completed"], 3);
    assert_eq!(lines[3]["total_delivered_u"], 0.89);
}

#[test]
fn paused_workout_skips_remaining_samples() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    exloop(&cfg)
        .args([
            "project", "--glucose", "150", "--kcal", "100", "--kcal", "200", "--pause-after", "1",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 completed, 1 skipped"));
}

#[test]
fn isf_preference_persists_and_drives_dosing() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let history = write_history(&dir);

    exloop(&cfg)
        .args(["isf", "set", "50"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ISF set to 50"));

    exloop(&cfg)
        .args(["isf", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ISF: 50 mg/dL per U (Preference)"));

    // 34.375 mg/dL drop / 50 = 0.6875 U
    exloop(&cfg)
        .args(["project", "--glucose", "146", "--insulin-history"])
        .arg(&history)
        .args(["--kcal", "100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total simulated insulin: 0.69 U"));
}

#[test]
fn cli_reports_bad_history_header() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let bad_csv = dir.path().join("history.csv");
    let mut f = fs::File::create(&bad_csv).unwrap();
    writeln!(f, "minutes,units").unwrap();
    writeln!(f, "10,1.0").unwrap();

    exloop(&cfg)
        .args(["project", "--glucose", "140", "--kcal", "100", "--insulin-history"])
        .arg(&bad_csv)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid headers"));
}

#[test]
fn cli_rejects_invalid_config() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("cfg.toml");
    fs::write(&cfg, "[dosing]\ndefault_isf = 0.0\n").unwrap();

    exloop(&cfg)
        .arg("self-check")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("default_isf must be > 0"));
}

#[test]
fn cli_json_error_is_structured() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let out = exloop(&cfg)
        .args(["--json", "isf", "set", "0"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(5));
    let stderr = String::from_utf8(out.stderr).unwrap();
    let last = stderr.lines().last().expect("error line");
    let v: serde_json::Value = serde_json::from_str(last).unwrap();
    assert_eq!(v["reason"], "Config");
}
