//! aiscan core - decision pipeline for AI-generated image detection
//!
//! This crate holds the domain types, the heuristic face gate, the
//! preprocessor, score calibration, the adaptive-threshold decision engine
//! and the shared classifier session. Inference engines and image sources
//! plug in through the traits in [`ports`].

pub mod calibration;
pub mod decision;
pub mod domain;
pub mod error;
pub mod evaluation;
pub mod heuristic;
pub mod log;
pub mod pipeline;
pub mod ports;
pub mod preprocess;
pub mod session;

pub use domain::{
    AnalysisConfig, AnalysisDetails, CalibratedScore, FaceDetectionMethod, FaceHeuristicResult,
    ImageSample, ProcessingMethod, RawLogits, Verdict,
};
pub use error::{AnalysisError, Result};
pub use pipeline::{AnalysisRequest, AnalysisResponse, Pipeline, PipelineOptions};
pub use ports::{Classifier, FaceDetector, SessionLoader};
pub use session::{RetryPolicy, SessionError, SessionStatus};
