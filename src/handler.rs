//! Prediction form handler: validate, check the model, infer, record.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, warn};

use crate::error::{PredictorError, PredictorResult};
use crate::metrics::ServiceMetrics;
use crate::models::inference::InferenceEngine;
use crate::types::mix_design::MixDesignInput;
use crate::types::prediction::StrengthPrediction;

/// Handles one submission at a time against a shared engine.
#[derive(Clone)]
pub struct PredictionService {
    engine: Option<Arc<InferenceEngine>>,
    metrics: Arc<ServiceMetrics>,
}

impl PredictionService {
    pub fn new(engine: Arc<InferenceEngine>, metrics: Arc<ServiceMetrics>) -> Self {
        Self {
            engine: Some(engine),
            metrics,
        }
    }

    /// A service with no model behind it; every valid submission is refused.
    pub fn unavailable(metrics: Arc<ServiceMetrics>) -> Self {
        Self {
            engine: None,
            metrics,
        }
    }

    pub fn model_name(&self) -> Option<&str> {
        self.engine.as_deref().map(InferenceEngine::model_name)
    }

    pub fn metrics(&self) -> &Arc<ServiceMetrics> {
        &self.metrics
    }

    /// Process one submission.
    pub fn submit(&self, input: &MixDesignInput) -> PredictorResult<StrengthPrediction> {
        let design = input.validate().map_err(|err| {
            if err.has_invalid() {
                warn!(fields = ?err.invalid, "Invalid input values provided");
            }
            if err.has_missing() {
                warn!(fields = ?err.missing, "Missing input values provided");
            }
            self.metrics.record_rejection();
            PredictorError::from(err)
        })?;

        let engine = self.engine.as_ref().ok_or_else(|| {
            error!("The model is not available");
            PredictorError::ModelUnavailable
        })?;

        match engine.predict(&design) {
            Ok(prediction) => {
                self.metrics.record_prediction(
                    Duration::from_secs_f64(prediction.elapsed_secs),
                    prediction.strength_mpa,
                );
                Ok(prediction)
            }
            Err(e) => {
                self.metrics.record_failure();
                Err(e)
            }
        }
    }
}
