//! Mock implementations of core port traits.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use aiscan_core::domain::{ImageSample, RawLogits};
use aiscan_core::ports::{Classifier, FaceDetector, SessionLoader};
use aiscan_core::preprocess::InputTensor;

/// Shared call counter, readable after the mock has been moved.
#[derive(Debug, Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    /// Number of recorded calls.
    #[must_use]
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn bump(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst)
    }
}

/// Mock implementation of `Classifier` for testing.
///
/// Returns fixed logits or a fixed error and counts invocations.
#[derive(Debug, Clone)]
pub struct MockClassifier {
    outcome: Result<Vec<f32>, String>,
    calls: CallCounter,
}

impl MockClassifier {
    /// A classifier that always returns `logits`.
    #[must_use]
    pub fn returning(logits: Vec<f32>) -> Self {
        Self {
            outcome: Ok(logits),
            calls: CallCounter::default(),
        }
    }

    /// A classifier that always fails with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            outcome: Err(message.into()),
            calls: CallCounter::default(),
        }
    }

    /// Counter of `classify` calls.
    #[must_use]
    pub fn calls(&self) -> CallCounter {
        self.calls.clone()
    }
}

impl Classifier for MockClassifier {
    fn classify(&self, _input: &InputTensor) -> anyhow::Result<RawLogits> {
        self.calls.bump();
        match &self.outcome {
            Ok(logits) => Ok(RawLogits::new(logits.clone())?),
            Err(message) => anyhow::bail!("{message}"),
        }
    }
}

/// Mock implementation of `SessionLoader` for testing.
///
/// Fails the first `failures` loads, optionally after a delay, then hands
/// out its classifier.
#[derive(Debug, Clone)]
pub struct MockLoader {
    classifier: MockClassifier,
    failures: usize,
    delay: Duration,
    loads: CallCounter,
}

impl MockLoader {
    /// A loader that succeeds immediately with `classifier`.
    #[must_use]
    pub fn new(classifier: MockClassifier) -> Self {
        Self {
            classifier,
            failures: 0,
            delay: Duration::ZERO,
            loads: CallCounter::default(),
        }
    }

    /// A loader for a classifier returning `logits`.
    #[must_use]
    pub fn returning(logits: Vec<f32>) -> Self {
        Self::new(MockClassifier::returning(logits))
    }

    /// A loader that never succeeds.
    #[must_use]
    pub fn failing() -> Self {
        Self::returning(vec![0.0, 0.0]).with_failures(usize::MAX)
    }

    /// Fails the first `failures` loads.
    #[must_use]
    pub const fn with_failures(mut self, failures: usize) -> Self {
        self.failures = failures;
        self
    }

    /// Sleeps for `delay` inside every load.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Counter of `load` calls.
    #[must_use]
    pub fn loads(&self) -> CallCounter {
        self.loads.clone()
    }
}

impl SessionLoader for MockLoader {
    type Classifier = MockClassifier;

    async fn load(&self) -> anyhow::Result<MockClassifier> {
        let call = self.loads.bump();
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if call < self.failures {
            anyhow::bail!("mock model unavailable (load {})", call + 1);
        }
        Ok(self.classifier.clone())
    }
}

/// Mock implementation of `FaceDetector` for testing.
#[derive(Debug, Clone)]
pub struct MockFaceDetector {
    outcome: Result<bool, String>,
    calls: CallCounter,
}

impl MockFaceDetector {
    /// A detector that always answers `found`.
    #[must_use]
    pub fn answering(found: bool) -> Self {
        Self {
            outcome: Ok(found),
            calls: CallCounter::default(),
        }
    }

    /// A detector that always errors.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            outcome: Err(message.into()),
            calls: CallCounter::default(),
        }
    }

    /// Counter of `has_face` calls.
    #[must_use]
    pub fn calls(&self) -> CallCounter {
        self.calls.clone()
    }
}

impl FaceDetector for MockFaceDetector {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn has_face(&self, _sample: &ImageSample) -> anyhow::Result<bool> {
        self.calls.bump();
        match &self.outcome {
            Ok(found) => Ok(*found),
            Err(message) => anyhow::bail!("{message}"),
        }
    }
}
