//! Model downloading and caching adapter.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Placeholder checksum indicating verification should be skipped.
pub const PLACEHOLDER_CHECKSUM: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// Name of the image classifier model.
pub const CLASSIFIER_MODEL: &str = "deepfake-detection";
/// Name of the external face detector model.
pub const FACE_MODEL: &str = "seeta-frontal";

/// Model metadata.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    /// Model name/identifier.
    pub name: &'static str,
    /// Download URL.
    pub url: &'static str,
    /// Expected SHA256 hash, or [`PLACEHOLDER_CHECKSUM`].
    pub sha256: &'static str,
    /// Filename in models directory.
    pub filename: &'static str,
    /// Whether analysis cannot run without it.
    pub required: bool,
}

/// Known models.
pub const MODELS: &[ModelInfo] = &[
    ModelInfo {
        name: CLASSIFIER_MODEL,
        url: "https://github.com/aiscan/aiscan/releases/download/models-v1/deepfake-detection.onnx",
        sha256: PLACEHOLDER_CHECKSUM,
        filename: "deepfake-detection.onnx",
        required: true,
    },
    ModelInfo {
        name: FACE_MODEL,
        url: "https://github.com/atomashpolskiy/rustface/raw/master/model/seeta_fd_frontal_v1.0.bin",
        sha256: PLACEHOLDER_CHECKSUM,
        filename: "seeta_fd_frontal_v1.0.bin",
        required: false,
    },
];

/// Install state of one model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelStatus {
    pub name: &'static str,
    pub path: PathBuf,
    pub installed: bool,
    pub required: bool,
}

/// Returns the default models directory path.
///
/// Uses `XDG_DATA_HOME/aiscan/models` or `~/.local/share/aiscan/models`.
#[must_use]
pub fn default_models_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("aiscan")
        .join("models")
}

/// Looks up a known model by name.
#[must_use]
pub fn find_model(name: &str) -> Option<&'static ModelInfo> {
    MODELS.iter().find(|m| m.name == name)
}

/// Returns the path to a specific model file under `dir`.
#[must_use]
pub fn model_path(dir: &Path, name: &str) -> Option<PathBuf> {
    find_model(name).map(|m| dir.join(m.filename))
}

/// Downloads every model missing from `dir`; `all` also fetches optional ones.
///
/// Returns the names of the models that were downloaded.
///
/// # Errors
///
/// Returns an error if:
/// - The models directory cannot be created
/// - A model download fails
/// - A model's checksum doesn't match
pub fn ensure_models(dir: &Path, all: bool) -> Result<Vec<&'static str>> {
    fs::create_dir_all(dir).context("Failed to create models directory")?;

    let mut fetched = Vec::new();
    for model in MODELS.iter().filter(|m| all || m.required) {
        let path = dir.join(model.filename);
        if path.exists() {
            debug!("Model {} already exists", model.name);
        } else {
            download_model(model, &path)?;
            fetched.push(model.name);
        }
    }

    Ok(fetched)
}

/// Downloads a model from its URL.
fn download_model(model: &ModelInfo, path: &Path) -> Result<()> {
    info!("Downloading model: {}", model.name);

    let response = reqwest::blocking::get(model.url)
        .with_context(|| format!("Failed to download {}", model.name))?;

    if !response.status().is_success() {
        anyhow::bail!("Download failed with status: {}", response.status());
    }

    let bytes = response
        .bytes()
        .with_context(|| format!("Failed to read response for {}", model.name))?;

    verify_checksum(model, &bytes).with_context(|| {
        format!(
            "Try deleting {} and re-running to download a fresh copy",
            path.display()
        )
    })?;

    fs::write(path, &bytes).with_context(|| format!("Failed to write {}", model.name))?;

    info!("Downloaded {} ({} bytes)", model.name, bytes.len());
    Ok(())
}

/// Checks `bytes` against the model's SHA-256, skipping placeholders.
///
/// # Errors
///
/// Returns an error if the digest does not match.
pub fn verify_checksum(model: &ModelInfo, bytes: &[u8]) -> Result<()> {
    if model.sha256 == PLACEHOLDER_CHECKSUM {
        debug!(
            "Skipping checksum verification for {} (placeholder checksum)",
            model.name
        );
        return Ok(());
    }

    let hash = format!("{:x}", Sha256::digest(bytes));
    if hash != model.sha256 {
        anyhow::bail!(
            "Checksum mismatch for {}: expected {}, got {}",
            model.name,
            model.sha256,
            hash
        );
    }
    Ok(())
}

/// Lists known models with their install state under `dir`.
#[must_use]
pub fn list_models(dir: &Path) -> Vec<ModelStatus> {
    MODELS
        .iter()
        .map(|m| {
            let path = dir.join(m.filename);
            ModelStatus {
                name: m.name,
                installed: path.exists(),
                path,
                required: m.required,
            }
        })
        .collect()
}
