//! Feature extraction for concrete strength model inference.
//!
//! Features are laid out in the column order of the training data
//! (Yeh's concrete compressive strength dataset).

use crate::types::mix_design::MixDesign;

/// Feature extractor that transforms mix designs into model input features.
pub struct FeatureExtractor;

impl FeatureExtractor {
    /// Create a new feature extractor.
    pub fn new() -> Self {
        Self
    }

    /// Extract features from a validated mix design.
    pub fn extract(&self, design: &MixDesign) -> Vec<f32> {
        design.values().iter().map(|&value| value as f32).collect()
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}
