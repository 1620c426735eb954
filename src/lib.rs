//! Concrete Strength Predictor Library
//!
//! Predicts the compressive strength of a concrete mix design with a
//! pre-trained regression model, served through a small web form.

pub mod config;
pub mod error;
pub mod feature_extractor;
pub mod handler;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod server;
pub mod stats;
pub mod types;

pub use config::AppConfig;
pub use error::{PredictorError, PredictorResult};
pub use feature_extractor::FeatureExtractor;
pub use handler::PredictionService;
pub use models::inference::InferenceEngine;
pub use stats::{AppStats, StatsReporter};
pub use types::{mix_design::MixDesignInput, prediction::StrengthPrediction};
