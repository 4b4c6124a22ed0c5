//! Command line tests
//!
//! Run the `inspector` binary against fixture suites and check exit codes
//! and the files it writes.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn inspector(args: &[&str], dir: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_inspector"))
        .args(args)
        .current_dir(dir)
        .env("RUST_LOG", "warn")
        .env("NO_COLOR", "1")
        .output()
        .expect("Failed to run inspector")
}

/// Config with instant instruments and no dropped CAN frames
fn instant_config(dir: &Path) -> PathBuf {
    let path = dir.join("config.toml");
    std::fs::write(
        &path,
        "[engine]\nretry_delay_ms = 0\n\n[simulation]\nlatency_scale = 0.0\ncan_drop_rate = 0.0\n",
    )
    .unwrap();
    path
}

#[test]
fn test_run_writes_report() {
    let dir = tempfile::tempdir().unwrap();
    let config = instant_config(dir.path());
    let suite = fixture("bench.yaml");

    let output = inspector(
        &[
            "run",
            suite.to_str().unwrap(),
            "--parallel",
            "2",
            "--config",
            config.to_str().unwrap(),
            "--report",
            "out/report.json",
        ],
        dir.path(),
    );
    assert!(
        output.status.success(),
        "stdout: {}\nstderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );

    let report: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("out").join("report.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(report["total"], 5);
    assert_eq!(report["failed"], 0);
    assert_eq!(report["execution"]["mode"], "parallel");
    assert_eq!(report["execution"]["batches"], serde_json::json!([2, 2, 1]));
}

#[test]
fn test_run_exits_nonzero_on_failed_case() {
    let dir = tempfile::tempdir().unwrap();
    let config = instant_config(dir.path());
    let suite = fixture("unknown_device.yaml");

    let output = inspector(
        &["run", suite.to_str().unwrap(), "--config", config.to_str().unwrap()],
        dir.path(),
    );
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("SCOPE1"));
    assert!(stdout.contains("2/3 passed"));
}

#[test]
fn test_run_rejects_unknown_type() {
    let dir = tempfile::tempdir().unwrap();
    let config = instant_config(dir.path());
    let suite = fixture("unknown_type.yaml");

    let output = inspector(
        &["run", suite.to_str().unwrap(), "--config", config.to_str().unwrap()],
        dir.path(),
    );
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unsupported test type 'thermal'"), "{}", stderr);
}

#[test]
fn test_sample_then_validate() {
    let dir = tempfile::tempdir().unwrap();

    let output = inspector(&["sample", "suite.yaml"], dir.path());
    assert!(output.status.success());
    assert!(dir.path().join("suite.yaml").exists());

    // Refuses to overwrite without --force
    let output = inspector(&["sample", "suite.yaml"], dir.path());
    assert_eq!(output.status.code(), Some(1));

    let output = inspector(&["validate", "suite.yaml"], dir.path());
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("is valid"));
}

#[test]
fn test_validate_reports_unknown_device() {
    let dir = tempfile::tempdir().unwrap();
    let suite = fixture("unknown_device.yaml");

    let output = inspector(&["validate", suite.to_str().unwrap()], dir.path());
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stdout).contains("SCOPE1 step 1"));
}

#[test]
fn test_validate_honors_config_flag() {
    let dir = tempfile::tempdir().unwrap();
    let suite = fixture("bench.yaml");

    let config = instant_config(dir.path());
    let output = inspector(
        &["validate", suite.to_str().unwrap(), "--config", config.to_str().unwrap()],
        dir.path(),
    );
    assert!(output.status.success());

    let broken = dir.path().join("broken.toml");
    std::fs::write(&broken, "[engine]\nmax_concurrency = 0\n").unwrap();
    let output = inspector(
        &["validate", suite.to_str().unwrap(), "--config", broken.to_str().unwrap()],
        dir.path(),
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("max_concurrency"));
}

#[test]
fn test_drivers_lists_classes() {
    let dir = tempfile::tempdir().unwrap();
    let output = inspector(&["drivers"], dir.path());
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for class in ["DMM", "PSU", "CAN", "RELAY"] {
        assert!(stdout.contains(class), "missing {}", class);
    }
    assert!(stdout.contains("MeasureDCVoltage"));
}
