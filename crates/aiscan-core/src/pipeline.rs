//! Per-call orchestration.
//!
//! `analyze` sequences the stages for one image and always returns a
//! well-formed [`Verdict`]: every failure becomes an error verdict.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::calibration::calibrate;
use crate::decision::decide;
use crate::domain::{
    AnalysisConfig, FaceDetectionMethod, ImageSample, RawLogits, Verdict, NO_FACE_MESSAGE,
};
use crate::error::{AnalysisError, Result};
use crate::heuristic::detect_face;
use crate::ports::{Classifier, FaceDetector, SessionLoader};
use crate::preprocess::{preprocess, InputTensor};
use crate::session::{RetryPolicy, SessionCell, SessionError, SessionStatus};

/// Error text for calls made while analysis is switched off.
pub const DISABLED_MESSAGE: &str = "Analysis disabled in settings";

/// Process-wide pipeline tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Images narrower or shorter than this are rejected.
    pub min_image_edge: u32,
    /// Bound on fetching and decoding one image.
    pub load_timeout: Duration,
    /// Session initialization retry policy.
    pub retry: RetryPolicy,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            min_image_edge: 32,
            load_timeout: Duration::from_secs(5),
            retry: RetryPolicy::default(),
        }
    }
}

/// One analysis request, matched to its response by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    /// Opaque caller-chosen identifier.
    pub request_id: String,
    /// Reference to the image (path or URL).
    pub image: String,
}

/// The verdict for one [`AnalysisRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    /// Identifier copied from the request.
    pub request_id: String,
    /// Image reference copied from the request.
    pub image: String,
    /// Outcome of the analysis.
    pub result: Verdict,
}

impl AnalysisResponse {
    /// Pairs a verdict with the request it answers.
    #[must_use]
    pub fn new(request: AnalysisRequest, result: Verdict) -> Self {
        Self {
            request_id: request.request_id,
            image: request.image,
            result,
        }
    }
}

/// Owns the shared session and runs analyses against it.
pub struct Pipeline<L: SessionLoader> {
    session: SessionCell<L>,
    options: PipelineOptions,
    external: Option<Arc<dyn FaceDetector>>,
}

impl<L: SessionLoader> Pipeline<L> {
    /// Creates a pipeline whose session is not yet initialized.
    #[must_use]
    pub fn new(loader: L, options: PipelineOptions) -> Self {
        let session = SessionCell::new(loader, options.retry.clone());
        Self {
            session,
            options,
            external: None,
        }
    }

    /// Installs the detector used when the config asks for `external`.
    #[must_use]
    pub fn with_face_detector(mut self, detector: Arc<dyn FaceDetector>) -> Self {
        self.external = Some(detector);
        self
    }

    /// Pipeline tuning in effect.
    #[must_use]
    pub const fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// The shared session.
    #[must_use]
    pub const fn session(&self) -> &SessionCell<L> {
        &self.session
    }

    /// Non-blocking session lifecycle snapshot.
    #[must_use]
    pub fn session_status(&self) -> SessionStatus {
        self.session.status()
    }

    /// Initializes the session ahead of the first call.
    ///
    /// # Errors
    ///
    /// Returns the shared initialization error.
    pub async fn warm_up(&self) -> std::result::Result<(), SessionError> {
        self.session.get().await.map(|_| ())
    }

    /// Analyses an already decoded image.
    pub async fn analyze(&self, sample: &ImageSample, config: &AnalysisConfig) -> Verdict {
        let outcome = async {
            let classifier = self.prepare(config).await?;
            self.run(&classifier, sample, config).await
        }
        .await;
        into_verdict(outcome)
    }

    /// Analyses an image produced by `load`, which is bounded by the
    /// configured load timeout.
    ///
    /// Loader errors that already are an [`AnalysisError`] keep their
    /// category; anything else is reported as an image load failure.
    pub async fn analyze_loaded<F>(&self, load: F, config: &AnalysisConfig) -> Verdict
    where
        F: Future<Output = anyhow::Result<ImageSample>>,
    {
        let outcome = async {
            let classifier = self.prepare(config).await?;
            let sample = self.load(load).await?;
            self.run(&classifier, &sample, config).await
        }
        .await;
        into_verdict(outcome)
    }

    async fn prepare(&self, config: &AnalysisConfig) -> Result<Arc<L::Classifier>> {
        if !config.enabled {
            return Err(AnalysisError::InvalidInput(DISABLED_MESSAGE.to_string()));
        }
        Ok(self.session.get().await?)
    }

    async fn load<F>(&self, load: F) -> Result<ImageSample>
    where
        F: Future<Output = anyhow::Result<ImageSample>>,
    {
        let timeout = self.options.load_timeout;
        match tokio::time::timeout(timeout, load).await {
            Ok(Ok(sample)) => Ok(sample),
            Ok(Err(e)) => Err(categorize(e, AnalysisError::ImageLoad)),
            Err(_) => Err(AnalysisError::Timeout {
                step: "image load",
                millis: timeout.as_millis(),
            }),
        }
    }

    async fn run(
        &self,
        classifier: &Arc<L::Classifier>,
        sample: &ImageSample,
        config: &AnalysisConfig,
    ) -> Result<Verdict> {
        self.check_size(sample)?;

        if let Some(skipped) = self.face_gate(sample, config) {
            return Ok(skipped);
        }

        let tensor = preprocess(sample)?;
        let logits = classify(Arc::clone(classifier), tensor).await?;
        debug!(logits = ?logits.values(), "Classifier output");

        let method = config.processing_method;
        let score = calibrate(&logits, method);
        let decision = decide(&logits, score, config.confidence_threshold);
        info!(
            method = %method,
            is_ai_generated = decision.is_ai_generated,
            confidence = decision.confidence,
            "{}",
            decision.reason
        );
        Ok(decision.into_verdict(logits, method, score))
    }

    fn check_size(&self, sample: &ImageSample) -> Result<()> {
        let (width, height) = (sample.width(), sample.height());
        let min = self.options.min_image_edge;
        if width < min || height < min {
            return Err(AnalysisError::InvalidInput(format!(
                "Image too small ({width}x{height}), minimum edge is {min}px"
            )));
        }
        Ok(())
    }

    /// Returns a skip verdict when no face is found.
    fn face_gate(&self, sample: &ImageSample, config: &AnalysisConfig) -> Option<Verdict> {
        if !config.face_detection_enabled {
            return None;
        }

        if config.face_detection_method == FaceDetectionMethod::External {
            match &self.external {
                Some(detector) => match detector.has_face(sample) {
                    Ok(true) => {
                        debug!(detector = detector.name(), "Face found");
                        return None;
                    }
                    Ok(false) => {
                        info!(detector = detector.name(), "No face found, skipping analysis");
                        return Some(Verdict {
                            reason: Some(format!("{} detector found no face", detector.name())),
                            ..Verdict::failed(NO_FACE_MESSAGE)
                        });
                    }
                    Err(e) => warn!(
                        "{} face detector failed, falling back to heuristic: {e:#}",
                        detector.name()
                    ),
                },
                None => debug!("No external face detector available, using heuristic"),
            }
        }

        let result = detect_face(sample);
        if result.has_face {
            None
        } else {
            info!(score = result.final_score, "No face found, skipping analysis");
            Some(Verdict::skipped_no_face(result.final_score))
        }
    }
}

async fn classify<C: Classifier>(classifier: Arc<C>, tensor: InputTensor) -> Result<RawLogits> {
    match tokio::task::spawn_blocking(move || classifier.classify(&tensor)).await {
        Ok(Ok(logits)) => Ok(logits),
        Ok(Err(e)) => Err(categorize(e, AnalysisError::Classifier)),
        Err(e) => Err(AnalysisError::Environment(format!(
            "classifier task did not complete: {e}"
        ))),
    }
}

/// Keeps an [`AnalysisError`] carried inside `e`, otherwise wraps its message.
fn categorize(e: anyhow::Error, wrap: fn(String) -> AnalysisError) -> AnalysisError {
    match e.downcast::<AnalysisError>() {
        Ok(err) => err,
        Err(e) => wrap(format!("{e:#}")),
    }
}

fn into_verdict(outcome: Result<Verdict>) -> Verdict {
    outcome.unwrap_or_else(|e| {
        warn!("Analysis failed: {e}");
        Verdict::from_error(&e)
    })
}
