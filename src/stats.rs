//! Usage statistics derived from the application log.
//!
//! The reporter re-reads the log file on every call, keeps the lines that
//! record a prediction and averages the latency logged with each of them.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::{PredictorError, PredictorResult};
use crate::logging::{FIELD_SEPARATOR, TIMESTAMP_FORMAT};

/// Marker identifying a prediction record in the log.
pub const PREDICTION_MARKER: &str = "Prediction made";

/// Log message written for every served prediction.
pub fn prediction_message(strength_mpa: f64, elapsed_secs: f64) -> String {
    format!("{PREDICTION_MARKER}: {strength_mpa:.2} MPa in {elapsed_secs} seconds")
}

/// Figures shown in the sidebar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AppStats {
    pub total_predictions: u64,
    /// Mean model latency in seconds, taken from the elapsed time each
    /// prediction record logs. Earlier releases always reported 0.0 here.
    pub average_latency: f64,
}

/// One prediction record parsed back from the log.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRecord {
    pub timestamp: NaiveDateTime,
    pub strength_mpa: f64,
    pub elapsed_secs: f64,
}

impl PredictionRecord {
    /// Parse a `<timestamp> - <LEVEL> - Prediction made: <mpa> MPa in <secs> seconds` line.
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut fields = line.splitn(3, FIELD_SEPARATOR);
        let timestamp = fields.next().unwrap_or_default().trim();
        let timestamp = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT)
            .map_err(|e| format!("invalid timestamp: {e}"))?;

        let message = fields
            .nth(1)
            .ok_or_else(|| "line has no message field".to_string())?;
        let start = message
            .find(PREDICTION_MARKER)
            .ok_or_else(|| "line is not a prediction record".to_string())?;
        let body = message[start + PREDICTION_MARKER.len()..].trim_start_matches(':');

        let tokens: Vec<&str> = body.split_whitespace().collect();
        match tokens.as_slice() {
            [mpa, "MPa", "in", secs, "seconds", ..] => Ok(Self {
                timestamp,
                strength_mpa: parse_number(mpa, "strength")?,
                elapsed_secs: parse_number(secs, "latency")?,
            }),
            _ => Err("unrecognised prediction message".to_string()),
        }
    }
}

fn parse_number(token: &str, what: &str) -> Result<f64, String> {
    token
        .parse::<f64>()
        .map_err(|e| format!("invalid {what} {token:?}: {e}"))
}

/// Computes [`AppStats`] from the log file.
#[derive(Debug, Clone)]
pub struct StatsReporter {
    log_path: PathBuf,
}

impl StatsReporter {
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        Self {
            log_path: log_path.into(),
        }
    }

    /// Stats for the sidebar. Any failure is logged and reported as zeros.
    pub fn report(&self) -> AppStats {
        match self.try_report() {
            Ok(stats) => stats,
            Err(e) => {
                error!("Error loading app stats: {}", e);
                AppStats::default()
            }
        }
    }

    /// Stats, or the reason they could not be computed.
    pub fn try_report(&self) -> PredictorResult<AppStats> {
        let file = File::open(&self.log_path)
            .map_err(|e| PredictorError::stats_read(&self.log_path, e.to_string()))?;

        let mut total_predictions = 0u64;
        let mut latency_sum = 0.0;

        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| PredictorError::stats_read(&self.log_path, e.to_string()))?;
            if !line.contains(PREDICTION_MARKER) {
                continue;
            }

            let record = PredictionRecord::parse(&line).map_err(|reason| {
                PredictorError::stats_read(&self.log_path, format!("line {}: {reason}", index + 1))
            })?;

            total_predictions += 1;
            latency_sum += record.elapsed_secs;
        }

        let average_latency = if total_predictions > 0 {
            latency_sum / total_predictions as f64
        } else {
            0.0
        };

        Ok(AppStats {
            total_predictions,
            average_latency,
        })
    }
}
