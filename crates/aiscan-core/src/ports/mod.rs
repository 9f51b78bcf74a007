//! Port definitions for hexagonal architecture.
//!
//! These traits define the boundaries between the decision pipeline and
//! the inference engine, face-detection models, and image sources.

mod classifier;
mod face_detector;

pub use classifier::{Classifier, SessionLoader};
pub use face_detector::FaceDetector;
