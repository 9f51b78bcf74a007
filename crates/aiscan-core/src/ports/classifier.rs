//! Black-box image classifier port.

use std::future::Future;

use crate::domain::RawLogits;
use crate::preprocess::InputTensor;

/// A loaded classifier: fixed-size tensor in, one or two logits out.
pub trait Classifier: Send + Sync + 'static {
    /// Runs the model on a preprocessed tensor.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails.
    fn classify(&self, input: &InputTensor) -> anyhow::Result<RawLogits>;
}

/// Creates the classifier behind the shared session.
pub trait SessionLoader: Send + Sync + 'static {
    /// Classifier produced by this loader.
    type Classifier: Classifier;

    /// Loads weights and builds the execution context.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be loaded.
    fn load(&self) -> impl Future<Output = anyhow::Result<Self::Classifier>> + Send;
}
