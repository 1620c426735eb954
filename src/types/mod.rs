//! Type definitions for the strength predictor

pub mod mix_design;
pub mod prediction;

pub use mix_design::{MixComponent, MixDesign, MixDesignInput, ValidationError};
pub use prediction::StrengthPrediction;
