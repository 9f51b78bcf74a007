//! Test support utilities for aiscan.
//!
//! Provides mocks, synthetic image builders, and utilities for testing
//! the aiscan decision pipeline.
//!
//! # Example
//!
//! ```
//! use aiscan_test_support::{MockLoader, SyntheticImageBuilder};
//!
//! // Create synthetic test images
//! let face = SyntheticImageBuilder::face(200);
//! let black = SyntheticImageBuilder::black(200, 200);
//!
//! // Create a loader whose classifier returns fixed logits
//! let loader = MockLoader::returning(vec![2.0, 0.3]);
//! ```

mod builders;
mod mocks;

pub use builders::{SyntheticImageBuilder, SKIN};
pub use mocks::{CallCounter, MockClassifier, MockFaceDetector, MockLoader};
