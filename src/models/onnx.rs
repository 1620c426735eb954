//! ONNX regression models run through ONNX Runtime

use anyhow::{anyhow, Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

use crate::models::loader::Regressor;

/// ONNX Runtime session for a single-output regression graph.
pub struct OnnxModel {
    /// `Session::run` needs `&mut`, so the session is serialized behind a lock
    session: Mutex<Session>,
    /// Input name for the model
    input_name: String,
    /// Output name holding the regression value
    output_name: String,
}

impl OnnxModel {
    /// Load an ONNX graph from file.
    pub fn load<P: AsRef<Path>>(path: P, onnx_threads: usize) -> Result<Self> {
        let path = path.as_ref();

        info!(path = %path.display(), threads = onnx_threads, "Loading ONNX model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(onnx_threads)?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load model from {}", path.display()))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("variable") || o.name.contains("output"))
            .or_else(|| session.outputs.first())
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "variable".to_string());

        debug!(input = %input_name, output = %output_name, "Resolved ONNX tensor names");

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
        })
    }
}

impl Regressor for OnnxModel {
    fn predict(&self, features: &[f32]) -> Result<Vec<f32>> {
        // Prepare input tensor - shape [1, num_features]
        let shape = vec![1_i64, features.len() as i64];
        let input_tensor = Tensor::from_array((shape, features.to_vec()))
            .context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow!("Lock error: {}", e))?;

        let outputs = session.run(ort::inputs![&self.input_name => input_tensor])?;

        let output = outputs
            .get(self.output_name.as_str())
            .ok_or_else(|| anyhow!("model produced no output named {}", self.output_name))?;

        let (_shape, data) = output
            .try_extract_tensor::<f32>()
            .context("regression output is not an f32 tensor")?;

        Ok(data.to_vec())
    }

    fn kind(&self) -> &'static str {
        "onnx"
    }
}
