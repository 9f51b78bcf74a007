//! CLI argument validation tests.
//!
//! Tests command-line argument parsing, validation, and error handling.

#![allow(clippy::unwrap_used)]
#![allow(deprecated)] // cargo_bin deprecation

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// `aiscan` isolated from the user's config and data directories.
fn aiscan(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("aiscan").unwrap();
    cmd.current_dir(home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("XDG_DATA_HOME", home.path().join("data"));
    cmd
}

// === Missing Input Tests ===

#[test]
fn test_missing_inputs_shows_error() {
    let home = tempfile::tempdir().unwrap();
    aiscan(&home)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No inputs specified"));
}

#[test]
fn test_scan_subcommand_without_inputs_shows_error() {
    let home = tempfile::tempdir().unwrap();
    aiscan(&home)
        .arg("scan")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No inputs specified"));
}

#[test]
fn test_empty_directory() {
    let home = tempfile::tempdir().unwrap();
    let images = home.path().join("images");
    fs::create_dir(&images).unwrap();

    // Nothing to analyse: success with no output
    aiscan(&home)
        .arg(&images)
        .assert()
        .code(0)
        .stdout(predicate::str::is_empty());
}

// === Value Validation Tests ===

#[test]
fn test_invalid_format_rejected() {
    let home = tempfile::tempdir().unwrap();
    aiscan(&home)
        .args(["--format", "xml", "a.png"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("json").and(predicate::str::contains("jsonl")));
}

#[test]
fn test_threshold_out_of_range_rejected() {
    let home = tempfile::tempdir().unwrap();
    aiscan(&home)
        .args(["--threshold", "1.5", "a.png"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("1.5 is not in (0.0, 1.0]"));
}

#[test]
fn test_zero_threshold_rejected() {
    let home = tempfile::tempdir().unwrap();
    aiscan(&home)
        .args(["--threshold", "0", "a.png"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not in (0.0, 1.0]"));
}

#[test]
fn test_unknown_method_rejected() {
    let home = tempfile::tempdir().unwrap();
    aiscan(&home)
        .args(["--method", "magic", "a.png"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown processing method 'magic'"));
}

#[test]
fn test_unknown_face_method_rejected() {
    let home = tempfile::tempdir().unwrap();
    aiscan(&home)
        .args(["--face-method", "magic", "a.png"])
        .assert()
        .failure();
}

// === Help and Subcommands ===

#[test]
fn test_help_lists_subcommands() {
    let home = tempfile::tempdir().unwrap();
    aiscan(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("scan")
                .and(predicate::str::contains("methods"))
                .and(predicate::str::contains("status"))
                .and(predicate::str::contains("models")),
        );
}

#[test]
fn test_models_path_honours_flag() {
    let home = tempfile::tempdir().unwrap();
    let dir = home.path().join("my-models");
    aiscan(&home)
        .args(["models", "path", "--models-dir"])
        .arg(&dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("my-models"));
}

#[test]
fn test_models_path_defaults_to_data_dir() {
    let home = tempfile::tempdir().unwrap();
    aiscan(&home)
        .args(["models", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("aiscan/models"));
}

#[test]
fn test_models_list_reports_missing_models() {
    let home = tempfile::tempdir().unwrap();
    aiscan(&home)
        .args(["models", "list", "--models-dir"])
        .arg(home.path().join("empty"))
        .assert()
        .success()
        .stdout(
            predicate::str::contains("deepfake-detection")
                .and(predicate::str::contains("seeta-frontal"))
                .and(predicate::str::contains("0/2 models installed")),
        );
}

#[test]
fn test_models_list_reports_installed_model() {
    let home = tempfile::tempdir().unwrap();
    let dir = home.path().join("models");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("deepfake-detection.onnx"), b"onnx").unwrap();

    aiscan(&home)
        .args(["models", "list", "--models-dir"])
        .arg(&dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("1/2 models installed"));
}

#[test]
fn test_status_without_model_fails() {
    let home = tempfile::tempdir().unwrap();
    let output = aiscan(&home)
        .args(["status", "--models-dir"])
        .arg(home.path().join("empty"))
        .assert()
        .code(2)
        .get_output()
        .stdout
        .clone();

    let status: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(status["state"], "failed");
    assert_eq!(status["attempts"], 1);
    assert!(status["error"]
        .as_str()
        .unwrap()
        .contains("Model file not found"));
}

// === Methods Command ===

#[test]
fn test_methods_reports_every_method() {
    let home = tempfile::tempdir().unwrap();
    let samples = home.path().join("samples.json");
    fs::write(
        &samples,
        r#"[
            {"logits": [2.0, 0.3], "expected": false},
            {"logits": [0.1, 1.9], "expected": true}
        ]"#,
    )
    .unwrap();

    let output = aiscan(&home)
        .arg("methods")
        .arg(&samples)
        .assert()
        .success()
        .stderr(predicate::str::contains("Best method:"))
        .get_output()
        .stdout
        .clone();

    let reports: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let reports = reports.as_array().unwrap();
    assert_eq!(reports.len(), 6);
    assert_eq!(reports[0]["method"], "inverted_softmax");
    for report in reports {
        assert_eq!(report["total"], 2);
        assert_eq!(report["predictions"].as_array().unwrap().len(), 2);
    }
}

#[test]
fn test_methods_rejects_malformed_file() {
    let home = tempfile::tempdir().unwrap();
    let samples = home.path().join("samples.json");
    fs::write(&samples, "not json").unwrap();

    aiscan(&home)
        .arg("methods")
        .arg(&samples)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Failed to parse labelled logits"));
}
