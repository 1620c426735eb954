//! Inference engine for concrete strength prediction

use std::sync::Arc;
use std::time::Instant;

use anyhow::anyhow;
use tracing::{debug, error, info};

use crate::error::{PredictorError, PredictorResult};
use crate::feature_extractor::FeatureExtractor;
use crate::models::loader::LoadedModel;
use crate::stats::prediction_message;
use crate::types::mix_design::MixDesign;
use crate::types::prediction::StrengthPrediction;

/// Runs the loaded regression model on validated mix designs.
pub struct InferenceEngine {
    model: Arc<LoadedModel>,
    extractor: FeatureExtractor,
}

impl InferenceEngine {
    /// Create an inference engine around an already loaded model.
    pub fn new(model: Arc<LoadedModel>) -> Self {
        info!(
            model = %model.name,
            kind = model.kind(),
            "Inference engine initialized"
        );

        Self {
            model,
            extractor: FeatureExtractor::new(),
        }
    }

    /// Name of the underlying model.
    pub fn model_name(&self) -> &str {
        &self.model.name
    }

    /// Predict compressive strength for one mix design.
    ///
    /// Logs exactly one prediction record on success. Model errors, empty
    /// outputs and non-finite values come back as [`PredictorError::Inference`].
    pub fn predict(&self, design: &MixDesign) -> PredictorResult<StrengthPrediction> {
        let features = self.extractor.extract(design);

        let start_time = Instant::now();
        let outcome = self.model.predict(&features);
        let elapsed = start_time.elapsed();

        let strength_mpa = outcome
            .and_then(|output| {
                let value = output
                    .first()
                    .copied()
                    .ok_or_else(|| anyhow!("model returned no output"))?;
                if value.is_finite() {
                    Ok(f64::from(value))
                } else {
                    Err(anyhow!("model returned a non-finite value ({value})"))
                }
            })
            .map_err(|e| {
                error!(model = %self.model.name, error = %e, "Inference failed");
                PredictorError::inference(&e)
            })?;

        debug!(
            model = %self.model.name,
            features = ?features,
            latency_us = elapsed.as_micros() as u64,
            "Model call complete"
        );

        info!("{}", prediction_message(strength_mpa, elapsed.as_secs_f64()));

        Ok(StrengthPrediction::new(
            design,
            strength_mpa,
            elapsed,
            &self.model.name,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::test_support::capture_logs;
    use crate::models::linear::LinearModel;
    use crate::models::loader::Regressor;
    use crate::stats::{PredictionRecord, PREDICTION_MARKER};
    use crate::types::mix_design::MixDesignInput;

    struct FixedOutput(Vec<f32>);

    impl Regressor for FixedOutput {
        fn predict(&self, _features: &[f32]) -> anyhow::Result<Vec<f32>> {
            Ok(self.0.clone())
        }

        fn kind(&self) -> &'static str {
            "fixed"
        }
    }

    struct Failing;

    impl Regressor for Failing {
        fn predict(&self, _features: &[f32]) -> anyhow::Result<Vec<f32>> {
            Err(anyhow!("shape mismatch"))
        }

        fn kind(&self) -> &'static str {
            "failing"
        }
    }

    fn engine(regressor: Box<dyn Regressor>) -> InferenceEngine {
        InferenceEngine::new(Arc::new(LoadedModel::from_regressor("test", regressor)))
    }

    fn design() -> MixDesign {
        MixDesignInput::with_defaults().validate().unwrap()
    }

    #[test]
    fn test_predict_logs_one_record() {
        let engine = engine(Box::new(LinearModel {
            feature_names: Vec::new(),
            coefficients: vec![0.1; 8],
            intercept: 1.0,
        }));

        let (prediction, logs) = capture_logs(|| engine.predict(&design()).unwrap());

        // 0.1 * (300 + 100 + 50 + 180 + 5 + 1000 + 800 + 28) + 1
        assert!((prediction.strength_mpa - 247.3).abs() < 1e-3);
        assert_eq!(prediction.model, "test");

        let records: Vec<&str> = logs.lines().filter(|l| l.contains(PREDICTION_MARKER)).collect();
        assert_eq!(records.len(), 1);
        let record = PredictionRecord::parse(records[0]).unwrap();
        assert_eq!(record.strength_mpa, 247.3);
    }

    #[test]
    fn test_model_error_becomes_inference_error() {
        let engine = engine(Box::new(Failing));

        let (result, logs) = capture_logs(|| engine.predict(&design()));

        assert!(matches!(result, Err(PredictorError::Inference(_))));
        assert!(!logs.contains(PREDICTION_MARKER));
        assert!(logs.contains("Inference failed"));
    }

    #[test]
    fn test_empty_output_is_inference_error() {
        let engine = engine(Box::new(FixedOutput(Vec::new())));
        assert!(matches!(
            engine.predict(&design()),
            Err(PredictorError::Inference(_))
        ));
    }

    #[test]
    fn test_non_finite_output_is_inference_error() {
        let engine = engine(Box::new(FixedOutput(vec![f32::NAN])));
        let err = engine.predict(&design()).unwrap_err();
        assert!(err.to_string().contains("non-finite"));
    }
}
