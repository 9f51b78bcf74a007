//! Scan command - analyze images for signs of AI generation.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use aiscan_adapters::models::{CLASSIFIER_MODEL, FACE_MODEL};
use aiscan_adapters::{
    collect_inputs, default_models_dir, model_path, ImageLoader, OnnxSessionLoader,
    RustfaceDetector,
};
use aiscan_core::log::{AnalysisLog, AnalysisLogEntry};
use aiscan_core::{
    AnalysisConfig, AnalysisRequest, AnalysisResponse, FaceDetectionMethod, Pipeline,
    PipelineOptions, ProcessingMethod, RetryPolicy,
};
use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::ExitCode;
use crate::config::AppConfig;
use crate::output::{JsonOutput, ProgressBar, ScanEvent};

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// JSON Lines (one response per line, in completion order)
    #[default]
    Jsonl,
    /// Single JSON array, in input order
    Json,
}

/// Hardcoded default values.
mod defaults {
    pub const CONCURRENCY: usize = 4;
}

/// Parse and validate a decision threshold (0.0 exclusive to 1.0).
fn parse_threshold(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if value > 0.0 && value <= 1.0 {
        Ok(value)
    } else {
        Err(format!("{value} is not in (0.0, 1.0]"))
    }
}

/// Shared arguments for image analysis.
#[derive(Args, Clone, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct ScanArgs {
    /// Image files, directories, data: URLs or http(s) URLs
    pub inputs: Vec<String>,

    /// Recurse into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Skip the face gate and analyse every image
    #[arg(long)]
    pub no_face_detection: bool,

    /// Face gate implementation (heuristic, external)
    #[arg(long, value_name = "METHOD")]
    pub face_method: Option<FaceDetectionMethod>,

    /// Score calibration method
    #[arg(long, value_name = "METHOD")]
    pub method: Option<ProcessingMethod>,

    /// Fixed decision threshold (0.0-1.0], replaces the adaptive threshold
    #[arg(long, value_parser = parse_threshold)]
    pub threshold: Option<f64>,

    /// Per-image load timeout in milliseconds
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Minimum image width and height in pixels
    #[arg(long, value_name = "PX")]
    pub min_edge: Option<u32>,

    /// Images analysed concurrently
    #[arg(short = 'j', long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Show progress bar
    #[arg(long)]
    pub progress: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Pretty-print JSON output (only affects --format json)
    #[arg(long)]
    pub pretty: bool,

    /// Custom models directory (overrides default and config)
    #[arg(long, value_name = "DIR")]
    pub models_dir: Option<PathBuf>,

    /// Classifier model file (overrides the models directory)
    #[arg(long, value_name = "FILE")]
    pub model: Option<PathBuf>,

    /// Append results to this JSON analysis log
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Merged config (populated by `with_config`, not from CLI).
    #[arg(skip)]
    pub(crate) config: AppConfig,
}

impl ScanArgs {
    /// Apply configuration file values, respecting CLI precedence.
    ///
    /// Layering priority (lowest to highest):
    /// 1. Hardcoded defaults (in accessor methods)
    /// 2. Config file values (XDG, then project-local)
    /// 3. CLI arguments (already set on self)
    #[must_use]
    pub fn with_config(mut args: Self, config: &AppConfig) -> Self {
        let analysis = &config.analysis;

        // Face gate: CLI --no-face-detection wins, then config
        if !args.no_face_detection {
            args.no_face_detection = analysis.face_detection == Some(false);
        }
        if args.face_method.is_none() {
            args.face_method = analysis.face_method.as_deref().and_then(|m| m.parse().ok());
        }
        if args.method.is_none() {
            args.method = analysis
                .processing_method
                .as_deref()
                .and_then(|m| m.parse().ok());
        }
        args.threshold = args.threshold.or(analysis.confidence_threshold);

        // Loading: CLI > config
        args.timeout_ms = args.timeout_ms.or(config.loading.timeout_ms);
        args.min_edge = args.min_edge.or(config.loading.min_edge);
        args.concurrency = args.concurrency.or(config.loading.concurrency);

        // Output format: CLI > config (accessor provides fallback)
        if args.format.is_none() {
            args.format = config
                .output
                .format
                .as_ref()
                .and_then(|s| match s.as_str() {
                    "json" => Some(OutputFormat::Json),
                    "jsonl" => Some(OutputFormat::Jsonl),
                    _ => None,
                });
        }

        // Boolean output options: CLI flag wins, then config
        if !args.pretty {
            args.pretty = config.output.pretty.unwrap_or(false);
        }
        if !args.progress {
            args.progress = config.output.progress.unwrap_or(false);
        }

        // Paths: CLI > config
        if args.models_dir.is_none() {
            args.models_dir.clone_from(&config.models.dir);
        }
        if args.log_file.is_none() {
            args.log_file.clone_from(&config.output.log_file);
        }

        // Keep the config for settings without a CLI flag
        args.config = config.clone();

        args
    }

    /// Per-call analysis settings.
    #[must_use]
    pub fn analysis_config(&self) -> AnalysisConfig {
        let defaults = AnalysisConfig::default();
        AnalysisConfig {
            enabled: self.config.analysis.enabled.unwrap_or(defaults.enabled),
            face_detection_enabled: !self.no_face_detection,
            face_detection_method: self.face_method.unwrap_or(defaults.face_detection_method),
            processing_method: self.method.unwrap_or(defaults.processing_method),
            confidence_threshold: self.threshold,
        }
    }

    /// Pipeline tuning.
    #[must_use]
    pub fn pipeline_options(&self) -> PipelineOptions {
        let defaults = PipelineOptions::default();
        let session = &self.config.session;
        let retry = RetryPolicy {
            max_attempts: session.max_attempts.unwrap_or(defaults.retry.max_attempts),
            initial_backoff: session
                .initial_backoff_ms
                .map_or(defaults.retry.initial_backoff, Duration::from_millis),
            max_backoff: session
                .max_backoff_ms
                .map_or(defaults.retry.max_backoff, Duration::from_millis),
        };
        PipelineOptions {
            min_image_edge: self.min_edge.unwrap_or(defaults.min_image_edge),
            load_timeout: self
                .timeout_ms
                .map_or(defaults.load_timeout, Duration::from_millis),
            retry,
        }
    }

    /// Get output format with fallback to JSONL.
    fn format(&self) -> OutputFormat {
        self.format.unwrap_or_default()
    }

    fn concurrency(&self) -> usize {
        self.concurrency.unwrap_or(defaults::CONCURRENCY).max(1)
    }

    /// Models directory with fallback to the data dir.
    #[must_use]
    pub fn models_dir(&self) -> PathBuf {
        self.models_dir.clone().unwrap_or_else(default_models_dir)
    }

    /// Classifier model path.
    ///
    /// # Errors
    ///
    /// Returns an error if the classifier model is unknown.
    pub fn model_path(&self) -> Result<PathBuf> {
        match &self.model {
            Some(path) => Ok(path.clone()),
            None => model_path(&self.models_dir(), CLASSIFIER_MODEL)
                .context("classifier model is not registered"),
        }
    }
}

/// Result of running the scan command.
#[allow(dead_code)] // Fields exposed for programmatic use
pub struct ScanResult {
    /// Number of images analysed.
    pub analysed: usize,
    /// Number of images flagged as AI-generated.
    pub flagged: usize,
    /// Number of images whose verdict carries an error.
    pub failed: usize,
    /// Exit code.
    pub exit_code: ExitCode,
}

/// Run the scan command.
///
/// Expects `args` to have been processed through `with_config()` first
/// to apply configuration file settings.
pub fn run(args: &ScanArgs) -> Result<ScanResult> {
    if args.inputs.is_empty() {
        anyhow::bail!("No inputs specified");
    }

    let inputs = collect_inputs(&args.inputs, args.recursive);
    info!("Running scan on {} images", inputs.len());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    runtime.block_on(scan(args, inputs))
}

/// Builds the pipeline over the ONNX classifier and, when asked for, the
/// external face detector.
pub fn build_pipeline(args: &ScanArgs) -> Result<Pipeline<OnnxSessionLoader>> {
    let model = args.model_path()?;
    debug!("Using classifier model: {}", model.display());

    let mut pipeline = Pipeline::new(OnnxSessionLoader::new(model), args.pipeline_options());

    let config = args.analysis_config();
    if config.face_detection_enabled && config.face_detection_method == FaceDetectionMethod::External
    {
        if let Some(detector) = external_face_detector(&args.models_dir()) {
            pipeline = pipeline.with_face_detector(Arc::new(detector));
        }
    }
    Ok(pipeline)
}

fn external_face_detector(models_dir: &Path) -> Option<RustfaceDetector> {
    let path = model_path(models_dir, FACE_MODEL)?;
    if !path.exists() {
        info!(
            "External face detector unavailable: {} not found. Run `aiscan models fetch --all`.",
            path.display()
        );
        return None;
    }
    match RustfaceDetector::from_file(&path) {
        Ok(detector) => Some(detector),
        Err(e) => {
            warn!("External face detector unavailable: {e:#}");
            None
        }
    }
}

async fn scan(args: &ScanArgs, inputs: Vec<String>) -> Result<ScanResult> {
    let config = args.analysis_config();
    let pipeline = Arc::new(build_pipeline(args)?);

    if config.enabled && !inputs.is_empty() {
        if let Err(e) = pipeline.warm_up().await {
            warn!("Classifier session unavailable: {e}");
        }
    }

    let show_progress = !args.quiet && (args.progress || std::io::stderr().is_terminal());
    let progress = ProgressBar::new(inputs.len() as u64, args.quiet, show_progress);
    let output = JsonOutput::stdout();
    let mut log = args.log_file.as_deref().map(load_log);

    let loader = ImageLoader::new();
    let semaphore = Arc::new(Semaphore::new(args.concurrency()));
    let mut tasks = JoinSet::new();

    for (index, image) in inputs.into_iter().enumerate() {
        let request = AnalysisRequest {
            request_id: format!("req-{}", index + 1),
            image,
        };
        let pipeline = Arc::clone(&pipeline);
        let semaphore = Arc::clone(&semaphore);
        let loader = loader.clone();
        let config = config.clone();

        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            debug!(request_id = %request.request_id, "Analysing {}", request.image);
            let verdict = pipeline
                .analyze_loaded(loader.load(&request.image), &config)
                .await;
            (index, AnalysisResponse::new(request, verdict))
        });
    }

    let mut responses = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let (index, response) = joined.context("Analysis task failed")?;
        progress.on_event(&ScanEvent::Completed {
            response: &response,
        });
        if let Some(log) = log.as_mut() {
            log.push(AnalysisLogEntry::now(&response));
        }
        if args.format() == OutputFormat::Jsonl {
            output.write(&response)?;
        }
        responses.push((index, response));
    }

    // For JSON format, output all responses as one array in input order
    responses.sort_by_key(|(index, _)| *index);
    let responses: Vec<AnalysisResponse> = responses.into_iter().map(|(_, r)| r).collect();
    if args.format() == OutputFormat::Json {
        output.write_document(&responses, args.pretty)?;
    }
    output.flush()?;

    if let (Some(path), Some(log)) = (args.log_file.as_deref(), log) {
        save_log(path, log)?;
    }

    let flagged = responses.iter().filter(|r| r.result.is_ai_generated).count();
    let failed = responses.iter().filter(|r| r.result.is_error()).count();
    progress.on_event(&ScanEvent::Finished { flagged, failed });
    info!(
        "Scan finished: {} analysed, {flagged} flagged, {failed} failed",
        responses.len()
    );

    let exit_code = if flagged > 0 {
        ExitCode::AiDetected
    } else {
        ExitCode::Success
    };

    Ok(ScanResult {
        analysed: responses.len(),
        flagged,
        failed,
        exit_code,
    })
}

/// Reads a saved log, starting fresh if it is missing or unreadable.
fn load_log(path: &Path) -> AnalysisLog {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to read analysis log {}: {e}", path.display());
            }
            return AnalysisLog::new();
        }
    };
    match serde_json::from_str::<Vec<AnalysisLogEntry>>(&text) {
        Ok(entries) => AnalysisLog::from_entries(entries),
        Err(e) => {
            warn!("Ignoring malformed analysis log {}: {e}", path.display());
            AnalysisLog::new()
        }
    }
}

fn save_log(path: &Path, log: AnalysisLog) -> Result<()> {
    let json = serde_json::to_string_pretty(&log.into_entries())?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write analysis log {}", path.display()))
}
