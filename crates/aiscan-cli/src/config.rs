//! Configuration file support for aiscan.
//!
//! Supports TOML configuration from:
//! - XDG config: `~/.config/aiscan/config.toml` (lowest priority)
//! - Project-local: `.aiscan.toml` (searched up directory tree)
//! - CLI flags (highest priority, applied separately)

use std::path::{Path, PathBuf};

use aiscan_core::{FaceDetectionMethod, ProcessingMethod};
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Project-local config file name.
pub const PROJECT_CONFIG: &str = ".aiscan.toml";

/// Top-level configuration structure.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Per-call analysis settings.
    pub analysis: AnalysisSection,
    /// Classifier session retry settings.
    pub session: SessionSection,
    /// Image loading settings.
    pub loading: LoadingSection,
    /// Model settings.
    pub models: ModelsConfig,
    /// Output formatting settings.
    pub output: OutputConfig,
}

/// Analysis configuration.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalysisSection {
    /// Master switch for analysis.
    pub enabled: Option<bool>,
    /// Run the face gate before inference.
    pub face_detection: Option<bool>,
    /// `heuristic` or `external`.
    pub face_method: Option<String>,
    /// Calibration method name.
    pub processing_method: Option<String>,
    /// Fixed decision threshold in (0, 1].
    pub confidence_threshold: Option<f64>,
}

/// Session configuration.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    pub max_attempts: Option<u32>,
    pub initial_backoff_ms: Option<u64>,
    pub max_backoff_ms: Option<u64>,
}

/// Loading configuration.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoadingSection {
    /// Per-image load timeout.
    pub timeout_ms: Option<u64>,
    /// Minimum width and height in pixels.
    pub min_edge: Option<u32>,
    /// Images analysed at once.
    pub concurrency: Option<usize>,
}

/// Model configuration.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Custom models directory path.
    pub dir: Option<PathBuf>,
}

/// Output formatting configuration.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "json" or "jsonl".
    pub format: Option<String>,
    /// Pretty-print JSON output.
    pub pretty: Option<bool>,
    /// Show progress bar.
    pub progress: Option<bool>,
    /// JSON file holding the analysis log.
    pub log_file: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from XDG and project-local files.
    ///
    /// Priority (lowest to highest):
    /// 1. XDG config: `~/.config/aiscan/config.toml`
    /// 2. Project-local: `.aiscan.toml` (searched up from cwd)
    ///
    /// Missing files are silently ignored. Invalid values are reported as
    /// warnings and dropped.
    pub fn load() -> Self {
        let cwd = std::env::current_dir().ok();
        Self::load_from(xdg_config_path().as_deref(), cwd.as_deref())
    }

    /// [`AppConfig::load`] with explicit locations.
    pub fn load_from(xdg_path: Option<&Path>, project_dir: Option<&Path>) -> Self {
        let mut config = Self::default();

        // Load XDG config (lowest priority)
        if let Some(xdg_path) = xdg_path {
            if xdg_path.exists() {
                info!("Loading XDG config: {}", xdg_path.display());
                if let Some(xdg_config) = load_file(xdg_path) {
                    config = xdg_config;
                }
            } else {
                debug!("XDG config not found: {}", xdg_path.display());
            }
        }

        // Load project-local config (higher priority, merged)
        if let Some(project_path) = project_dir.and_then(find_config_in_parents) {
            info!("Loading project config: {}", project_path.display());
            if let Some(project_config) = load_file(&project_path) {
                config.merge(project_config);
            }
        }

        for problem in config.sanitize() {
            eprintln!("warning: {problem}");
        }

        config
    }

    /// Drops values outside their accepted range, returning one message per
    /// dropped value.
    fn sanitize(&mut self) -> Vec<String> {
        let mut problems = Vec::new();

        if let Some(t) = self.analysis.confidence_threshold {
            if !(t > 0.0 && t <= 1.0) {
                problems.push(format!(
                    "analysis.confidence_threshold must be in (0.0, 1.0], got {t}"
                ));
                self.analysis.confidence_threshold = None;
            }
        }
        if let Some(ref m) = self.analysis.processing_method {
            if let Err(e) = m.parse::<ProcessingMethod>() {
                problems.push(format!("analysis.processing_method: {e}"));
                self.analysis.processing_method = None;
            }
        }
        if let Some(ref m) = self.analysis.face_method {
            if let Err(e) = m.parse::<FaceDetectionMethod>() {
                problems.push(format!("analysis.face_method: {e}"));
                self.analysis.face_method = None;
            }
        }

        if self.session.max_attempts == Some(0) {
            problems.push("session.max_attempts must be at least 1".to_string());
            self.session.max_attempts = None;
        }
        if self.loading.timeout_ms == Some(0) {
            problems.push("loading.timeout_ms must be positive".to_string());
            self.loading.timeout_ms = None;
        }
        if self.loading.concurrency == Some(0) {
            problems.push("loading.concurrency must be at least 1".to_string());
            self.loading.concurrency = None;
        }

        // Output format validation
        if let Some(ref f) = self.output.format {
            if f != "json" && f != "jsonl" {
                problems.push(format!(
                    "output.format must be 'json' or 'jsonl', got '{f}'"
                ));
                self.output.format = None;
            }
        }

        problems
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` when present.
    fn merge(&mut self, other: Self) {
        // Analysis
        let (mine, theirs) = (&mut self.analysis, other.analysis);
        mine.enabled = theirs.enabled.or(mine.enabled);
        mine.face_detection = theirs.face_detection.or(mine.face_detection);
        mine.face_method = theirs.face_method.or_else(|| mine.face_method.take());
        mine.processing_method = theirs
            .processing_method
            .or_else(|| mine.processing_method.take());
        mine.confidence_threshold = theirs.confidence_threshold.or(mine.confidence_threshold);

        // Session
        self.session.max_attempts = other.session.max_attempts.or(self.session.max_attempts);
        self.session.initial_backoff_ms = other
            .session
            .initial_backoff_ms
            .or(self.session.initial_backoff_ms);
        self.session.max_backoff_ms = other.session.max_backoff_ms.or(self.session.max_backoff_ms);

        // Loading
        self.loading.timeout_ms = other.loading.timeout_ms.or(self.loading.timeout_ms);
        self.loading.min_edge = other.loading.min_edge.or(self.loading.min_edge);
        self.loading.concurrency = other.loading.concurrency.or(self.loading.concurrency);

        // Models
        self.models.dir = other.models.dir.or_else(|| self.models.dir.take());

        // Output
        self.output.format = other.output.format.or_else(|| self.output.format.take());
        self.output.pretty = other.output.pretty.or(self.output.pretty);
        self.output.progress = other.output.progress.or(self.output.progress);
        self.output.log_file = other.output.log_file.or_else(|| self.output.log_file.take());
    }
}

/// Get the XDG config file path.
fn xdg_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("aiscan").join("config.toml"))
}

/// Search for `.aiscan.toml` in the given directory and its parents.
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);

    while let Some(dir) = current {
        let config_path = dir.join(PROJECT_CONFIG);
        if config_path.exists() {
            return Some(config_path);
        }
        current = dir.parent();
    }

    None
}

/// Load and parse a TOML config file.
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return None;
        }
    };

    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!("Failed to parse config file {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> AppConfig {
        toml::from_str(toml).expect("parse config")
    }

    #[test]
    fn test_parse_minimal_config() {
        let config = parse("");
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_parse_full_config() {
        let config = parse(
            r"
[analysis]
enabled = true
face_detection = false
face_method = 'external'
processing_method = 'sigmoid_diff'
confidence_threshold = 0.7

[session]
max_attempts = 3
initial_backoff_ms = 500
max_backoff_ms = 10000

[loading]
timeout_ms = 2000
min_edge = 64
concurrency = 8

[models]
dir = '/opt/models'

[output]
format = 'json'
pretty = true
progress = false
log_file = 'scan-log.json'
",
        );

        assert_eq!(config.analysis.face_detection, Some(false));
        assert_eq!(config.analysis.face_method.as_deref(), Some("external"));
        assert_eq!(config.analysis.confidence_threshold, Some(0.7));
        assert_eq!(config.session.max_attempts, Some(3));
        assert_eq!(config.loading.min_edge, Some(64));
        assert_eq!(config.loading.concurrency, Some(8));
        assert_eq!(config.models.dir, Some(PathBuf::from("/opt/models")));
        assert_eq!(config.output.format, Some("json".to_string()));
        assert_eq!(config.output.log_file, Some(PathBuf::from("scan-log.json")));
    }

    #[test]
    fn test_merge_configs() {
        let mut base = parse(
            r"
[analysis]
processing_method = 'adaptive'
confidence_threshold = 0.5

[loading]
timeout_ms = 3000
",
        );
        let override_config = parse(
            r"
[analysis]
confidence_threshold = 0.7

[output]
format = 'json'
",
        );

        base.merge(override_config);

        // Threshold overridden
        assert_eq!(base.analysis.confidence_threshold, Some(0.7));
        // Method and loading preserved from base
        assert_eq!(base.analysis.processing_method.as_deref(), Some("adaptive"));
        assert_eq!(base.loading.timeout_ms, Some(3000));
        // Output added from override
        assert_eq!(base.output.format.as_deref(), Some("json"));
    }

    #[test]
    fn test_merge_empty_override_preserves_base() {
        let mut base = parse("[session]\nmax_attempts = 2\n[models]\ndir = '/m'\n");
        let expected = base.clone();
        base.merge(AppConfig::default());
        assert_eq!(base, expected);
    }

    #[test]
    fn test_invalid_toml_syntax_handled() {
        let result: Result<AppConfig, _> = toml::from_str("[analysis\nenabled = true");
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_field_type_handled() {
        let result: Result<AppConfig, _> =
            toml::from_str("[analysis]\nconfidence_threshold = 'high'\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_section_ignored() {
        let config = parse("[blur]\nthreshold = 0.5\n\n[output]\npretty = true\n");
        assert_eq!(config.output.pretty, Some(true));
    }

    #[test]
    fn test_sanitize_drops_invalid_values() {
        let mut config = parse(
            r"
[analysis]
confidence_threshold = 0.0
processing_method = 'magic'
face_method = 'mediapipe'

[session]
max_attempts = 0

[loading]
concurrency = 0

[output]
format = 'xml'
pretty = true
",
        );

        let problems = config.sanitize();
        assert_eq!(problems.len(), 6, "{problems:?}");
        assert!(problems[0].contains("confidence_threshold"));
        assert!(config.analysis.confidence_threshold.is_none());
        assert!(config.analysis.processing_method.is_none());
        assert!(config.analysis.face_method.is_none());
        assert!(config.session.max_attempts.is_none());
        assert!(config.loading.concurrency.is_none());
        assert!(config.output.format.is_none());
        // Valid values survive.
        assert_eq!(config.output.pretty, Some(true));
    }

    #[test]
    fn test_sanitize_accepts_valid_config() {
        let mut config = parse(
            "[analysis]\nconfidence_threshold = 1.0\nprocessing_method = 'softmax_0_fake'\n",
        );
        assert!(config.sanitize().is_empty());
        assert_eq!(config.analysis.confidence_threshold, Some(1.0));
    }

    #[test]
    fn test_find_config_in_parents() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("a/b/c");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(root.path().join(PROJECT_CONFIG), "").unwrap();

        let found = find_config_in_parents(&nested).unwrap();
        assert_eq!(found, root.path().join(PROJECT_CONFIG));
    }

    #[test]
    fn test_project_config_overrides_xdg() {
        let xdg_dir = tempfile::tempdir().unwrap();
        let xdg = xdg_dir.path().join("config.toml");
        std::fs::write(&xdg, "[output]\nformat = 'json'\npretty = true\n").unwrap();

        let project = tempfile::tempdir().unwrap();
        std::fs::write(
            project.path().join(PROJECT_CONFIG),
            "[output]\nformat = 'jsonl'\n",
        )
        .unwrap();

        let config = AppConfig::load_from(Some(&xdg), Some(project.path()));
        assert_eq!(config.output.format.as_deref(), Some("jsonl"));
        assert_eq!(config.output.pretty, Some(true));
    }

    #[test]
    fn test_unreadable_project_config_is_ignored() {
        let project = tempfile::tempdir().unwrap();
        std::fs::write(project.path().join(PROJECT_CONFIG), "not = [valid").unwrap();
        let config = AppConfig::load_from(None, Some(project.path()));
        assert_eq!(config, AppConfig::default());
    }
}
