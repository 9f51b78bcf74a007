//! aiscan adapters - concrete implementations of the core ports.
//!
//! This crate provides adapters for:
//! - Image loading from files, `data:` URLs and `http(s)` URLs
//! - The ONNX image classifier
//! - The SeetaFace face detector
//! - Model downloading and caching

pub mod classifier;
pub mod face;
pub mod loader;
pub mod models;

pub use classifier::{OnnxClassifier, OnnxSessionLoader};
pub use face::RustfaceDetector;
pub use loader::{collect_inputs, ImageLoader, ImageRef};
pub use models::{default_models_dir, list_models, model_path};
