//! End-to-end scan tests without a classifier model installed.

#![allow(clippy::unwrap_used)]
#![allow(deprecated)] // cargo_bin deprecation

use std::fs;
use std::path::{Path, PathBuf};

use aiscan_test_support::SyntheticImageBuilder;
use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// `aiscan` with an empty models directory.
fn aiscan(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("aiscan").unwrap();
    cmd.current_dir(home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("XDG_DATA_HOME", home.path().join("data"))
        .arg("--quiet")
        .arg("--models-dir")
        .arg(home.path().join("models"));
    cmd
}

fn write_face(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    let png = SyntheticImageBuilder::png(&SyntheticImageBuilder::face(64)).unwrap();
    fs::write(&path, png).unwrap();
    path
}

fn jsonl(output: &[u8]) -> Vec<Value> {
    String::from_utf8_lossy(output)
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn test_missing_model_yields_session_error_verdicts() {
    let home = tempfile::tempdir().unwrap();
    let a = write_face(home.path(), "a.png");
    let b = write_face(home.path(), "b.png");

    let output = aiscan(&home).arg(&a).arg(&b).assert().code(0).get_output().stdout.clone();
    let responses = jsonl(&output);
    assert_eq!(responses.len(), 2);

    let mut ids: Vec<&str> = responses
        .iter()
        .map(|r| r["requestId"].as_str().unwrap())
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, ["req-1", "req-2"]);

    for response in &responses {
        let result = &response["result"];
        assert_eq!(result["isAIGenerated"], false);
        assert_eq!(result["confidence"], 0.0);
        let error = result["error"].as_str().unwrap();
        assert!(
            error.starts_with("Failed to initialize classifier session"),
            "{error}"
        );
        assert!(error.contains("Model file not found"), "{error}");
    }
}

#[test]
fn test_explicit_model_path_is_reported() {
    let home = tempfile::tempdir().unwrap();
    let image = write_face(home.path(), "face.png");

    let output = aiscan(&home)
        .arg("--model")
        .arg(home.path().join("custom.onnx"))
        .arg(&image)
        .assert()
        .code(0)
        .get_output()
        .stdout
        .clone();
    let responses = jsonl(&output);
    let error = responses[0]["result"]["error"].as_str().unwrap();
    assert!(error.contains("custom.onnx"), "{error}");
}

#[test]
fn test_data_url_input_is_echoed() {
    let home = tempfile::tempdir().unwrap();
    let url = SyntheticImageBuilder::data_url(&SyntheticImageBuilder::face(64)).unwrap();

    let output = aiscan(&home)
        .arg("--format")
        .arg("json")
        .arg(&url)
        .assert()
        .code(0)
        .get_output()
        .stdout
        .clone();
    let responses: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(responses[0]["image"], url.as_str());
    assert!(responses[0]["result"]["error"].is_string());
}

#[test]
fn test_log_file_records_newest_first() {
    let home = tempfile::tempdir().unwrap();
    let log = home.path().join("log.json");
    let url = SyntheticImageBuilder::data_url(&SyntheticImageBuilder::face(64)).unwrap();
    let image = write_face(home.path(), "face.png");

    aiscan(&home).arg("--log-file").arg(&log).arg(&url).assert().code(0);
    aiscan(&home).arg("--log-file").arg(&log).arg(&image).assert().code(0);

    let entries: Value = serde_json::from_str(&fs::read_to_string(&log).unwrap()).unwrap();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 2);

    // Second run first
    assert!(entries[0]["imageUrl"].as_str().unwrap().ends_with("face.png"));
    assert_eq!(entries[1]["imageUrl"], "base64_data");
    for entry in entries {
        assert_eq!(entry["requestId"], "req-1");
        assert!(entry["error"].is_string());
        assert!(entry.get("isAIGenerated").is_none());
        assert!(entry["time"].is_string());
    }
}

#[test]
fn test_log_file_is_bounded() {
    let home = tempfile::tempdir().unwrap();
    let log = home.path().join("log.json");
    let image = write_face(home.path(), "face.png");

    let inputs = vec![image; 105];
    aiscan(&home)
        .arg("--log-file")
        .arg(&log)
        .args(&inputs)
        .assert()
        .code(0);

    let entries: Value = serde_json::from_str(&fs::read_to_string(&log).unwrap()).unwrap();
    assert_eq!(entries.as_array().unwrap().len(), 100);
}
