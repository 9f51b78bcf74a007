//! ONNX classifier backed by `candle-onnx`.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use aiscan_core::preprocess::InputTensor;
use aiscan_core::{Classifier, RawLogits, SessionLoader};
use anyhow::{Context, Result};
use candle_core::{Device, Tensor};
use candle_onnx::onnx::ModelProto;
use tracing::{debug, info};

/// A loaded ONNX graph with one image input and one logits output.
pub struct OnnxClassifier {
    model: ModelProto,
    input_name: String,
    output_name: String,
    device: Device,
}

impl OnnxClassifier {
    /// Reads an ONNX model from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, not valid ONNX, or has no
    /// graph inputs or outputs.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!(
                "Model file not found: {} (run `aiscan models fetch`)",
                path.display()
            );
        }
        let model = candle_onnx::read_file(path)
            .with_context(|| format!("Failed to read ONNX model {}", path.display()))?;
        Self::from_model(model)
    }

    /// Wraps a parsed model.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph has no data input or no output.
    pub fn from_model(model: ModelProto) -> Result<Self> {
        let graph = model.graph.as_ref().context("ONNX model has no graph")?;

        // Older exporters list initializers among the graph inputs.
        let initializers: HashSet<&str> =
            graph.initializer.iter().map(|t| t.name.as_str()).collect();
        let input_name = graph
            .input
            .iter()
            .map(|i| i.name.as_str())
            .find(|name| !initializers.contains(name))
            .context("ONNX graph has no data input")?
            .to_string();
        let output_name = graph
            .output
            .first()
            .map(|o| o.name.clone())
            .context("ONNX graph has no output")?;

        debug!(input = %input_name, output = %output_name, "ONNX graph");
        Ok(Self {
            model,
            input_name,
            output_name,
            device: Device::Cpu,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn classify(&self, input: &InputTensor) -> Result<RawLogits> {
        let tensor = Tensor::from_slice(input.data(), input.shape().to_vec(), &self.device)
            .context("Failed to build input tensor")?;

        let inputs = HashMap::from([(self.input_name.clone(), tensor)]);
        let mut outputs =
            candle_onnx::simple_eval(&self.model, inputs).context("ONNX inference failed")?;

        let logits = outputs
            .remove(&self.output_name)
            .with_context(|| format!("ONNX output {} missing", self.output_name))?;
        let values = logits
            .flatten_all()
            .and_then(|t| t.to_dtype(candle_core::DType::F32))
            .and_then(|t| t.to_vec1::<f32>())
            .context("Failed to read ONNX output")?;

        Ok(RawLogits::new(values)?)
    }
}

/// Loads an [`OnnxClassifier`] from a model path, off the async runtime.
#[derive(Debug, Clone)]
pub struct OnnxSessionLoader {
    model_path: PathBuf,
}

impl OnnxSessionLoader {
    #[must_use]
    pub const fn new(model_path: PathBuf) -> Self {
        Self { model_path }
    }

    #[must_use]
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }
}

impl SessionLoader for OnnxSessionLoader {
    type Classifier = OnnxClassifier;

    async fn load(&self) -> Result<OnnxClassifier> {
        let path = self.model_path.clone();
        info!("Loading ONNX model from {}", path.display());
        tokio::task::spawn_blocking(move || OnnxClassifier::from_file(&path))
            .await
            .context("Model loading task did not complete")?
    }
}
