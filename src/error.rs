//! Error taxonomy for the predictor.
//!
//! Load failures are fatal at startup. Validation, availability and inference
//! failures are reported back to the user. Stats failures are swallowed by
//! the reporter and only surface through [`crate::stats::StatsReporter::try_report`].

use std::path::PathBuf;

use thiserror::Error;

use crate::types::mix_design::ValidationError;

/// Errors produced while loading the model, serving predictions or reading stats.
#[derive(Debug, Error)]
pub enum PredictorError {
    /// The model artifact is missing, corrupt or incompatible.
    #[error("failed to load model from {}: {reason}", .path.display())]
    Load { path: PathBuf, reason: String },

    /// The submitted mix design failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No model handle is available to serve the request.
    #[error("the model is not available")]
    ModelUnavailable,

    /// The model call itself failed.
    #[error("inference failed: {0}")]
    Inference(String),

    /// The log file could not be read or parsed.
    #[error("failed to read stats from {}: {reason}", .path.display())]
    StatsRead { path: PathBuf, reason: String },
}

/// Result alias used across the crate.
pub type PredictorResult<T> = Result<T, PredictorError>;

impl PredictorError {
    pub fn load(path: impl Into<PathBuf>, err: &anyhow::Error) -> Self {
        Self::Load {
            path: path.into(),
            reason: format!("{err:#}"),
        }
    }

    pub fn inference(err: &anyhow::Error) -> Self {
        Self::Inference(format!("{err:#}"))
    }

    pub fn stats_read(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::StatsRead {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Messages suitable for showing to the user.
    pub fn user_messages(&self) -> Vec<String> {
        match self {
            Self::Validation(err) => err.messages(),
            Self::ModelUnavailable => vec!["The model is not available.".to_string()],
            Self::Inference(_) => {
                vec!["The prediction could not be computed. Please try again.".to_string()]
            }
            other => vec![other.to_string()],
        }
    }
}
