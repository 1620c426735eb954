//! Linear regression model stored as JSON

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::models::loader::Regressor;
use crate::types::mix_design::FEATURE_COUNT;

/// Ordinary least squares model: `intercept + Σ coefficient_i * x_i`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModel {
    /// Feature names in column order (informational)
    #[serde(default)]
    pub feature_names: Vec<String>,
    /// One coefficient per feature
    pub coefficients: Vec<f64>,
    /// Bias term
    pub intercept: f64,
}

impl LinearModel {
    /// Parse a model from its JSON representation and check it fits the mix design layout.
    pub fn from_json(json: &str) -> Result<Self> {
        let model: LinearModel =
            serde_json::from_str(json).context("Failed to parse linear model JSON")?;
        model.check_compatible()?;
        Ok(model)
    }

    /// Read and parse a model file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read model artifact {}", path.display()))?;
        Self::from_json(&json)
    }

    fn check_compatible(&self) -> Result<()> {
        if self.coefficients.len() != FEATURE_COUNT {
            bail!(
                "model expects {} features, mix designs have {}",
                self.coefficients.len(),
                FEATURE_COUNT
            );
        }
        if !self.feature_names.is_empty() && self.feature_names.len() != self.coefficients.len() {
            bail!(
                "model lists {} feature names for {} coefficients",
                self.feature_names.len(),
                self.coefficients.len()
            );
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            bail!("model contains non-finite parameters");
        }
        Ok(())
    }
}

impl Regressor for LinearModel {
    fn predict(&self, features: &[f32]) -> Result<Vec<f32>> {
        if features.len() != self.coefficients.len() {
            bail!(
                "shape mismatch: got {} features, expected {}",
                features.len(),
                self.coefficients.len()
            );
        }

        let value = self
            .coefficients
            .iter()
            .zip(features)
            .fold(self.intercept, |acc, (&coef, &x)| acc + coef * f64::from(x));

        Ok(vec![value as f32])
    }

    fn kind(&self) -> &'static str {
        "linear"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_model() -> LinearModel {
        LinearModel {
            feature_names: Vec::new(),
            coefficients: vec![1.0, 0.0, 0.0, -1.0, 0.0, 0.0, 0.0, 0.5],
            intercept: 10.0,
        }
    }

    #[test]
    fn test_predict_weighted_sum() {
        let model = unit_model();
        let features = [300.0, 100.0, 50.0, 180.0, 5.0, 1000.0, 800.0, 28.0];

        let output = model.predict(&features).unwrap();

        assert_eq!(output.len(), 1);
        assert!((output[0] - 144.0).abs() < 1e-4);
    }

    #[test]
    fn test_predict_rejects_wrong_shape() {
        let model = unit_model();
        let err = model.predict(&[1.0, 2.0, 3.0]).unwrap_err();
        assert!(err.to_string().contains("shape mismatch"));
    }

    #[test]
    fn test_from_json_rejects_wrong_feature_count() {
        let json = r#"{"coefficients": [0.1, 0.2], "intercept": 1.0}"#;
        let err = LinearModel::from_json(json).unwrap_err();
        assert!(err.to_string().contains("expects 2 features"));
    }

    #[test]
    fn test_from_json_rejects_corrupt_input() {
        assert!(LinearModel::from_json("not json").is_err());
    }

    #[test]
    fn test_from_json_accepts_valid_model() {
        let json = r#"{
            "feature_names": ["cement", "blast_furnace_slag", "fly_ash", "water",
                              "superplasticizer", "coarse_aggregate", "fine_aggregate", "age"],
            "coefficients": [0.12, 0.10, 0.09, -0.15, 0.29, 0.02, 0.02, 0.11],
            "intercept": -23.3
        }"#;

        let model = LinearModel::from_json(json).unwrap();
        assert_eq!(model.coefficients.len(), 8);
        assert_eq!(model.kind(), "linear");
    }
}
