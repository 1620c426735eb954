//! Regression model loading and inference

pub mod inference;
pub mod linear;
pub mod loader;
#[cfg(feature = "onnx")]
pub mod onnx;

pub use inference::InferenceEngine;
pub use linear::LinearModel;
pub use loader::{LoadedModel, ModelCache, ModelLoader, Regressor};
