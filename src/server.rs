//! HTTP surface: the prediction form page plus a small JSON API.
//!
//! The page is rendered server-side with askama. Every render re-reads the
//! log for the sidebar statistics, on the blocking pool.

use std::collections::HashMap;
use std::sync::Arc;

use askama::Template;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::config::AppConfig;
use crate::error::{PredictorError, PredictorResult};
use crate::handler::PredictionService;
use crate::metrics::{MetricsSnapshot, ServiceMetrics};
use crate::models::inference::InferenceEngine;
use crate::models::loader::{ModelCache, ModelLoader};
use crate::stats::{AppStats, StatsReporter};
use crate::types::mix_design::{MixComponent, MixDesignInput};
use crate::types::prediction::StrengthPrediction;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: PredictionService,
    pub stats: StatsReporter,
}

impl AppState {
    /// Load the configured model and wire up the handler and stats reporter.
    ///
    /// Fails with [`PredictorError::Load`] when the model cannot be loaded, in
    /// which case no router should be built.
    pub fn from_config(config: &AppConfig, metrics: Arc<ServiceMetrics>) -> PredictorResult<Self> {
        let cache = ModelCache::new(
            ModelLoader::with_threads(config.model.onnx_threads),
            &config.model.path,
        );
        let engine = Arc::new(InferenceEngine::new(cache.get_or_load()?));

        Ok(Self {
            service: PredictionService::new(engine, metrics),
            stats: StatsReporter::new(&config.logging.file),
        })
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler).post(submit_form_handler))
        .route("/api/predict", axum::routing::post(predict_handler))
        .route("/api/stats", get(stats_handler))
        .route("/api/health", get(health_handler))
        .with_state(state)
}

/// One numeric input of the form.
struct FieldView {
    key: &'static str,
    label: &'static str,
    min: String,
    step: &'static str,
    value: String,
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    model_name: Option<String>,
    fields: Vec<FieldView>,
    errors: Vec<String>,
    headline: Option<String>,
    total_predictions: u64,
    average_latency: String,
}

impl IndexTemplate {
    fn new(state: &AppState, input: &MixDesignInput, stats: AppStats) -> Self {
        let fields = MixComponent::ALL
            .iter()
            .map(|&component| FieldView {
                key: component.key(),
                label: component.label(),
                min: component.min_value().to_string(),
                step: if component.is_integer() { "1" } else { "any" },
                value: input
                    .get(component)
                    .map(|value| value.to_string())
                    .unwrap_or_default(),
            })
            .collect();

        Self {
            model_name: state.service.model_name().map(str::to_string),
            fields,
            errors: Vec::new(),
            headline: None,
            total_predictions: stats.total_predictions,
            average_latency: format!("{:.2}", stats.average_latency),
        }
    }

    fn with_outcome(mut self, outcome: &PredictorResult<StrengthPrediction>) -> Self {
        match outcome {
            Ok(prediction) => self.headline = Some(prediction.headline()),
            Err(e) => self.errors = e.user_messages(),
        }
        self
    }
}

fn render(template: &IndexTemplate) -> Result<Html<String>, (StatusCode, String)> {
    template.render().map(Html).map_err(|e| {
        error!(error = %e, "Failed to render page");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "failed to render page".to_string(),
        )
    })
}

async fn load_stats(reporter: &StatsReporter) -> AppStats {
    let reporter = reporter.clone();
    tokio::task::spawn_blocking(move || reporter.report())
        .await
        .unwrap_or_else(|e| {
            error!(error = %e, "Stats task failed");
            AppStats::default()
        })
}

/// Run one submission on the blocking pool; model calls may wait on a session lock.
async fn run_submission(
    service: &PredictionService,
    input: MixDesignInput,
) -> PredictorResult<StrengthPrediction> {
    let service = service.clone();
    tokio::task::spawn_blocking(move || service.submit(&input))
        .await
        .unwrap_or_else(|e| {
            error!(error = %e, "Prediction task failed");
            Err(PredictorError::Inference(e.to_string()))
        })
}

/// Parse the submitted form. Blank or non-numeric fields count as missing.
fn input_from_form(fields: &HashMap<String, String>) -> MixDesignInput {
    let mut input = MixDesignInput::default();
    for component in MixComponent::ALL {
        let value = fields
            .get(component.key())
            .map(|raw| raw.trim())
            .filter(|raw| !raw.is_empty())
            .and_then(|raw| raw.parse::<f64>().ok());
        input.set(component, value);
    }
    input
}

async fn index_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>, (StatusCode, String)> {
    let stats = load_stats(&state.stats).await;
    render(&IndexTemplate::new(
        &state,
        &MixDesignInput::with_defaults(),
        stats,
    ))
}

async fn submit_form_handler(
    State(state): State<Arc<AppState>>,
    Form(fields): Form<HashMap<String, String>>,
) -> Result<Html<String>, (StatusCode, String)> {
    let input = input_from_form(&fields);
    let outcome = run_submission(&state.service, input.clone()).await;

    // Stats are read after the submission so the sidebar includes it
    let stats = load_stats(&state.stats).await;
    render(&IndexTemplate::new(&state, &input, stats).with_outcome(&outcome))
}

async fn predict_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<MixDesignInput>, JsonRejection>,
) -> Result<Json<StrengthPrediction>, Response> {
    let Json(input) = payload.map_err(rejection_response)?;
    run_submission(&state.service, input)
        .await
        .map(Json)
        .map_err(IntoResponse::into_response)
}

/// Malformed JSON bodies get the same error shape as validation failures.
fn rejection_response(rejection: JsonRejection) -> Response {
    let body = ErrorBody {
        error: rejection.body_text(),
        messages: vec!["Please enter valid values for all features.".to_string()],
    };
    (rejection.status(), Json(body)).into_response()
}

#[derive(Debug, Serialize, Deserialize)]
struct ErrorBody {
    error: String,
    messages: Vec<String>,
}

impl IntoResponse for PredictorError {
    fn into_response(self) -> Response {
        let status = match &self {
            PredictorError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PredictorError::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody {
            error: self.to_string(),
            messages: self.user_messages(),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Serialize)]
struct StatsResponse {
    log: AppStats,
    metrics: MetricsSnapshot,
}

async fn stats_handler(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    Json(StatsResponse {
        log: load_stats(&state.stats).await,
        metrics: state.service.metrics().snapshot(),
    })
}

#[derive(Debug, Serialize, Deserialize)]
struct HealthResponse {
    status: String,
    model: Option<String>,
}

async fn health_handler(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let model = state.service.model_name().map(str::to_string);
    let (status, label) = if model.is_some() {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "model unavailable")
    };
    (
        status,
        Json(HealthResponse {
            status: label.to_string(),
            model,
        }),
    )
}
