//! Strength prediction results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::types::mix_design::MixDesign;

/// Predicted compressive strength for one mix design
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrengthPrediction {
    /// Predicted compressive strength (MPa)
    pub strength_mpa: f64,

    /// Wall-clock duration of the model call, in seconds
    pub elapsed_secs: f64,

    /// Name of the model that produced the prediction
    pub model: String,

    /// Inputs the prediction was computed from, in model order
    pub inputs: Vec<f64>,

    /// Prediction timestamp
    pub timestamp: DateTime<Utc>,
}

impl StrengthPrediction {
    pub fn new(design: &MixDesign, strength_mpa: f64, elapsed: Duration, model: &str) -> Self {
        Self {
            strength_mpa,
            elapsed_secs: elapsed.as_secs_f64(),
            model: model.to_string(),
            inputs: design.values().to_vec(),
            timestamp: Utc::now(),
        }
    }

    /// Heading shown on the result page.
    pub fn headline(&self) -> String {
        format!("Predicted concrete strength: {:.2} MPa", self.strength_mpa)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::mix_design::MixDesignInput;

    #[test]
    fn test_headline_rounds_to_two_decimals() {
        let design = MixDesignInput::with_defaults().validate().unwrap();
        let prediction =
            StrengthPrediction::new(&design, 41.23678, Duration::from_micros(250), "linear");

        assert_eq!(prediction.headline(), "Predicted concrete strength: 41.24 MPa");
        assert_eq!(prediction.inputs.len(), 8);
        assert!((prediction.elapsed_secs - 0.00025).abs() < 1e-12);
    }
}
