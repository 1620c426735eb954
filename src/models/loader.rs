//! Model artifact loader

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{error, info};

use crate::error::{PredictorError, PredictorResult};
use crate::models::linear::LinearModel;

/// A trained regression model: eight features in, one value out.
pub trait Regressor: Send + Sync {
    /// Run the model on one feature row and return its outputs.
    fn predict(&self, features: &[f32]) -> Result<Vec<f32>>;

    /// Short name of the model family, used in logs.
    fn kind(&self) -> &'static str;
}

/// Supported artifact formats, picked from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    /// `.json` linear regression
    Linear,
    /// `.onnx` graph
    Onnx,
}

impl ModelFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "json" => Some(ModelFormat::Linear),
            "onnx" => Some(ModelFormat::Onnx),
            _ => None,
        }
    }
}

/// Loaded model with metadata
pub struct LoadedModel {
    /// Model name (artifact file stem)
    pub name: String,
    /// Where the artifact was read from
    pub path: PathBuf,
    regressor: Box<dyn Regressor>,
}

impl LoadedModel {
    /// Wrap an already constructed regressor.
    pub fn from_regressor(name: impl Into<String>, regressor: Box<dyn Regressor>) -> Self {
        Self {
            name: name.into(),
            path: PathBuf::new(),
            regressor,
        }
    }

    pub fn predict(&self, features: &[f32]) -> Result<Vec<f32>> {
        self.regressor.predict(features)
    }

    pub fn kind(&self) -> &'static str {
        self.regressor.kind()
    }
}

impl std::fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModel")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("kind", &self.kind())
            .finish()
    }
}

/// Loader for model artifacts
#[derive(Debug, Clone)]
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a new model loader with default settings (1 thread)
    pub fn new() -> Self {
        Self::with_threads(1)
    }

    /// Create a new model loader with specified number of ONNX threads
    pub fn with_threads(onnx_threads: usize) -> Self {
        Self {
            onnx_threads: onnx_threads.max(1),
        }
    }

    /// Load a model artifact, mapping every failure to a load error.
    pub fn load_model<P: AsRef<Path>>(&self, path: P) -> PredictorResult<LoadedModel> {
        let path = path.as_ref();

        match self.load_regressor(path) {
            Ok(regressor) => {
                let name = path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .unwrap_or("model")
                    .to_string();

                info!(
                    model = %name,
                    kind = regressor.kind(),
                    path = %path.display(),
                    "Model loaded successfully"
                );

                Ok(LoadedModel {
                    name,
                    path: path.to_path_buf(),
                    regressor,
                })
            }
            Err(e) => {
                error!("Error loading model: {:#}", e);
                Err(PredictorError::load(path, &e))
            }
        }
    }

    fn load_regressor(&self, path: &Path) -> Result<Box<dyn Regressor>> {
        if !path.exists() {
            bail!("model file not found");
        }

        match ModelFormat::from_path(path) {
            Some(ModelFormat::Linear) => Ok(Box::new(LinearModel::from_file(path)?)),
            Some(ModelFormat::Onnx) => self.load_onnx(path),
            None => bail!("unsupported model format (expected .json or .onnx)"),
        }
    }

    #[cfg(feature = "onnx")]
    fn load_onnx(&self, path: &Path) -> Result<Box<dyn Regressor>> {
        let model = crate::models::onnx::OnnxModel::load(path, self.onnx_threads)?;
        Ok(Box::new(model))
    }

    #[cfg(not(feature = "onnx"))]
    fn load_onnx(&self, _path: &Path) -> Result<Box<dyn Regressor>> {
        bail!(
            "ONNX support is not compiled in (rebuild with --features onnx, {} threads requested)",
            self.onnx_threads
        )
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Loads a model artifact on first use and hands out the same handle afterwards.
pub struct ModelCache {
    loader: ModelLoader,
    path: PathBuf,
    model: Mutex<Option<Arc<LoadedModel>>>,
}

impl ModelCache {
    pub fn new(loader: ModelLoader, path: impl Into<PathBuf>) -> Self {
        Self {
            loader,
            path: path.into(),
            model: Mutex::new(None),
        }
    }

    /// Return the cached model, loading it if this is the first successful call.
    pub fn get_or_load(&self) -> PredictorResult<Arc<LoadedModel>> {
        let mut slot = self.model.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(model) = slot.as_ref() {
            return Ok(Arc::clone(model));
        }

        let model = Arc::new(self.loader.load_model(&self.path)?);
        *slot = Some(Arc::clone(&model));
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::test_support::capture_logs;
    use std::io::Write;

    const MODEL_JSON: &str = r#"{
        "coefficients": [0.12, 0.10, 0.09, -0.15, 0.29, 0.02, 0.02, 0.11],
        "intercept": -23.3
    }"#;

    fn write_model(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ModelFormat::from_path(Path::new("m.json")), Some(ModelFormat::Linear));
        assert_eq!(ModelFormat::from_path(Path::new("m.ONNX")), Some(ModelFormat::Onnx));
        assert_eq!(ModelFormat::from_path(Path::new("m.pkl")), None);
        assert_eq!(ModelFormat::from_path(Path::new("model")), None);
    }

    #[test]
    fn test_load_linear_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_model(&dir, "linear_regression.json", MODEL_JSON);

        let model = ModelLoader::new().load_model(&path).unwrap();

        assert_eq!(model.name, "linear_regression");
        assert_eq!(model.kind(), "linear");
        assert_eq!(model.predict(&[0.0; 8]).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_artifact_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ModelLoader::new()
            .load_model(dir.path().join("absent.json"))
            .unwrap_err();

        assert!(matches!(err, PredictorError::Load { .. }));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_corrupt_artifact_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_model(&dir, "broken.json", "{ \"coefficients\": [1.0,");

        let err = ModelLoader::new().load_model(&path).unwrap_err();
        assert!(matches!(err, PredictorError::Load { .. }));
    }

    #[test]
    fn test_unsupported_format_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_model(&dir, "linear_regression.pkl", "binary");

        let err = ModelLoader::new().load_model(&path).unwrap_err();
        assert!(err.to_string().contains("unsupported model format"));
    }

    #[test]
    fn test_cache_returns_same_handle() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_model(&dir, "linear_regression.json", MODEL_JSON);
        let cache = ModelCache::new(ModelLoader::new(), &path);

        let ((first, second), logs) = capture_logs(|| {
            let first = cache.get_or_load().unwrap();
            let second = cache.get_or_load().unwrap();
            (first, second)
        });

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(logs.matches("Model loaded successfully").count(), 1);

        // Once loaded, the artifact is no longer read
        std::fs::remove_file(&path).unwrap();
        assert!(Arc::ptr_eq(&first, &cache.get_or_load().unwrap()));
    }

    #[test]
    fn test_cache_retries_after_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("late.json");
        let cache = ModelCache::new(ModelLoader::new(), &path);

        assert!(cache.get_or_load().is_err());

        write_model(&dir, "late.json", MODEL_JSON);
        assert!(cache.get_or_load().is_ok());
    }
}
