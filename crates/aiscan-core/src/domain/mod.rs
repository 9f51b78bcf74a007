//! Core domain types for image analysis.

mod config;
mod face;
mod sample;
mod verdict;

pub use config::{AnalysisConfig, FaceDetectionMethod, ProcessingMethod};
pub use face::FaceHeuristicResult;
pub use sample::{ImageSample, CHANNELS};
pub use verdict::{AnalysisDetails, CalibratedScore, RawLogits, Verdict, NO_FACE_MESSAGE};
