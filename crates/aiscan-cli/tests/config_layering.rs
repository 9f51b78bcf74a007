//! Integration tests for configuration layering.
//!
//! Tests the full priority chain: hardcoded defaults < XDG config < project config < CLI args

#![allow(clippy::unwrap_used)] // Test code uses unwrap for brevity
#![allow(deprecated)] // cargo_bin deprecation warning

use std::fs;
use std::path::{Path, PathBuf};

use aiscan_test_support::SyntheticImageBuilder;
use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// `aiscan` isolated from the user's config and data directories.
fn aiscan(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("aiscan").unwrap();
    cmd.current_dir(home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("XDG_DATA_HOME", home.path().join("data"))
        .arg("--quiet");
    cmd
}

fn write_face(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    let png = SyntheticImageBuilder::png(&SyntheticImageBuilder::face(64)).unwrap();
    fs::write(&path, png).unwrap();
    path
}

fn write_xdg_config(home: &TempDir, contents: &str) {
    let dir = home.path().join("config/aiscan");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("config.toml"), contents).unwrap();
}

fn stdout_json(cmd: &mut Command) -> Value {
    let output = cmd.assert().code(0).get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

#[test]
fn test_project_config_disables_analysis() {
    let home = tempfile::tempdir().unwrap();
    fs::write(home.path().join(".aiscan.toml"), "[analysis]\nenabled = false\n").unwrap();
    let image = write_face(home.path(), "face.png");

    let response = stdout_json(aiscan(&home).arg(&image));
    assert_eq!(response["requestId"], "req-1");
    assert_eq!(response["result"]["isAIGenerated"], false);
    assert_eq!(response["result"]["error"], "Analysis disabled in settings");
}

#[test]
fn test_project_config_found_in_parent_directory() {
    let home = tempfile::tempdir().unwrap();
    fs::write(home.path().join(".aiscan.toml"), "[analysis]\nenabled = false\n").unwrap();
    let nested = home.path().join("a/b");
    fs::create_dir_all(&nested).unwrap();
    let image = write_face(&nested, "face.png");

    let response = stdout_json(aiscan(&home).current_dir(&nested).arg(&image));
    assert_eq!(response["result"]["error"], "Analysis disabled in settings");
}

#[test]
fn test_xdg_config_applies_format() {
    let home = tempfile::tempdir().unwrap();
    write_xdg_config(&home, "[analysis]\nenabled = false\n\n[output]\nformat = 'json'\n");
    let a = write_face(home.path(), "a.png");
    let b = write_face(home.path(), "b.png");

    let responses = stdout_json(aiscan(&home).arg(&a).arg(&b));
    let responses = responses.as_array().unwrap();
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["requestId"], "req-1");
    assert!(responses[0]["image"].as_str().unwrap().ends_with("a.png"));
    assert_eq!(responses[1]["requestId"], "req-2");
}

#[test]
fn test_project_config_overrides_xdg() {
    let home = tempfile::tempdir().unwrap();
    write_xdg_config(&home, "[analysis]\nenabled = false\n\n[output]\nformat = 'json'\n");
    fs::write(home.path().join(".aiscan.toml"), "[output]\nformat = 'jsonl'\n").unwrap();
    let image = write_face(home.path(), "face.png");

    // JSONL: a single object, still disabled by the XDG layer
    let response = stdout_json(aiscan(&home).arg(&image));
    assert!(response.is_object());
    assert_eq!(response["result"]["error"], "Analysis disabled in settings");
}

#[test]
fn test_cli_format_overrides_config() {
    let home = tempfile::tempdir().unwrap();
    fs::write(
        home.path().join(".aiscan.toml"),
        "[analysis]\nenabled = false\n\n[output]\nformat = 'jsonl'\n",
    )
    .unwrap();
    let image = write_face(home.path(), "face.png");

    let responses = stdout_json(aiscan(&home).args(["--format", "json"]).arg(&image));
    assert_eq!(responses.as_array().unwrap().len(), 1);
}

#[test]
fn test_invalid_config_values_are_ignored() {
    let home = tempfile::tempdir().unwrap();
    fs::write(
        home.path().join(".aiscan.toml"),
        "[analysis]\nenabled = false\nprocessing_method = 'magic'\nconfidence_threshold = 3.0\n",
    )
    .unwrap();
    let image = write_face(home.path(), "face.png");

    let response = stdout_json(aiscan(&home).arg(&image));
    assert_eq!(response["result"]["error"], "Analysis disabled in settings");
}

#[test]
fn test_config_models_dir_is_used() {
    let home = tempfile::tempdir().unwrap();
    let dir = home.path().join("configured-models");
    fs::write(
        home.path().join(".aiscan.toml"),
        format!("[models]\ndir = '{}'\n", dir.display()),
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("aiscan").unwrap();
    cmd.current_dir(home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .args(["models", "path"])
        .assert()
        .success()
        .stdout(predicates::str::contains("configured-models"));
}
