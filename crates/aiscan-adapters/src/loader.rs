//! Image loading from file paths, `data:` URLs and `http(s)` URLs.

use std::path::{Path, PathBuf};

use aiscan_core::{AnalysisError, ImageSample};
use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{debug, warn};

/// Raster extensions accepted for local files.
pub const RASTER_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tiff", "tif", "webp", "bmp", "gif"];

/// A parsed image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    /// Local file.
    File(PathBuf),
    /// Inline `data:image/*;base64,` URL.
    DataUrl(String),
    /// Remote `http` or `https` URL.
    Http(String),
}

impl ImageRef {
    /// Classifies `reference`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidInput`] for empty references, `blob:`
    /// and other unsupported schemes, non-image data URLs and files without
    /// a raster extension.
    pub fn parse(reference: &str) -> Result<Self, AnalysisError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(invalid("No image data or URL provided"));
        }

        if let Some(rest) = reference.strip_prefix("data:") {
            let header = rest.split_once(',').map_or(rest, |(header, _)| header);
            if !header.starts_with("image/") || !header.ends_with(";base64") {
                return Err(invalid("Unsupported data URL: expected data:image/*;base64"));
            }
            return Ok(Self::DataUrl(reference.to_string()));
        }

        if reference.starts_with("http://") || reference.starts_with("https://") {
            return Ok(Self::Http(reference.to_string()));
        }

        if reference.starts_with("blob:") {
            return Err(invalid("Invalid image URL: blob URLs are not supported"));
        }

        let path = match reference.strip_prefix("file://") {
            Some(path) => PathBuf::from(path),
            None if has_scheme(reference) => {
                return Err(invalid(format!("Invalid image URL: {reference}")));
            }
            None => PathBuf::from(reference),
        };

        if !is_supported_image(&path) {
            return Err(invalid(format!(
                "Unsupported image type: {}",
                path.display()
            )));
        }
        Ok(Self::File(path))
    }
}

fn invalid(message: impl Into<String>) -> AnalysisError {
    AnalysisError::InvalidInput(message.into())
}

/// `scheme:` prefix per RFC 3986, ignoring single-letter Windows drives.
fn has_scheme(reference: &str) -> bool {
    reference.split_once(':').is_some_and(|(scheme, _)| {
        scheme.len() > 1
            && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

/// Checks if a path has a supported raster extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .is_some_and(|e| RASTER_EXTENSIONS.contains(&e.as_str()))
}

/// Fetches and decodes image references into RGBA samples.
#[derive(Debug, Clone, Default)]
pub struct ImageLoader {
    client: reqwest::Client,
}

impl ImageLoader {
    /// Creates a loader with a default HTTP client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a loader sharing `client`.
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Loads `reference` and decodes it.
    ///
    /// # Errors
    ///
    /// Returns an error carrying [`AnalysisError::InvalidInput`] for bad
    /// references, or a plain error if fetching or decoding fails.
    pub async fn load(&self, reference: &str) -> Result<ImageSample> {
        let bytes = match ImageRef::parse(reference)? {
            ImageRef::File(path) => tokio::fs::read(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?,
            ImageRef::DataUrl(url) => decode_data_url(&url)?,
            ImageRef::Http(url) => self.fetch(&url).await?,
        };
        debug!("Loaded {} bytes", bytes.len());
        decode(&bytes)
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {url}"))?;

        if !response.status().is_success() {
            anyhow::bail!("HTTP error! status: {}", response.status());
        }

        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read response from {url}"))?;
        Ok(bytes.to_vec())
    }
}

/// Decodes the base64 payload of a `data:` URL.
///
/// # Errors
///
/// Returns an error if the URL has no payload or it is not valid base64.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>> {
    let (_, payload) = url
        .split_once(',')
        .context("data URL has no payload")?;
    STANDARD
        .decode(payload.trim())
        .context("data URL payload is not valid base64")
}

/// Decodes encoded image bytes into an RGBA sample.
///
/// # Errors
///
/// Returns an error if the format is unknown or the data is corrupt.
pub fn decode(bytes: &[u8]) -> Result<ImageSample> {
    let image = image::load_from_memory(bytes).context("Failed to decode image")?;
    Ok(ImageSample::from_dynamic(&image))
}

/// Expands CLI inputs: URLs and files pass through, directories are
/// scanned for raster images.
#[must_use]
pub fn collect_inputs(inputs: &[String], recursive: bool) -> Vec<String> {
    let mut collected = Vec::new();

    for input in inputs {
        let path = Path::new(input);
        if path.is_dir() {
            collect_from_dir(path, recursive, &mut collected);
        } else {
            collected.push(input.clone());
        }
    }

    collected
}

fn collect_from_dir(dir: &Path, recursive: bool, found: &mut Vec<String>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            warn!("Failed to read directory {}: {e}", dir.display());
            return;
        }
    };

    let mut paths: Vec<PathBuf> = entries.flatten().map(|entry| entry.path()).collect();
    paths.sort();

    for path in paths {
        if path.is_file() && is_supported_image(&path) {
            found.push(path.to_string_lossy().into_owned());
        } else if path.is_dir() && recursive {
            collect_from_dir(&path, recursive, found);
        }
    }
}
