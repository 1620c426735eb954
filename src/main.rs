//! Concrete Strength Predictor - Main Entry Point
//!
//! Loads the regression model once, then serves the prediction form until
//! interrupted. If the model cannot be loaded the server never starts.

use anyhow::{Context, Result};
use concrete_strength_predictor::{
    config::{AppConfig, DEFAULT_CONFIG_PATH},
    logging,
    metrics::ServiceMetrics,
    server::{build_router, AppState},
};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Optional config path as the first argument
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = AppConfig::load_or_default(&config_path)
        .with_context(|| format!("Failed to load configuration from {config_path}"))?;

    logging::init(&config.logging)?;

    info!("App started");
    info!(
        config = %config_path,
        model = %config.model.path.display(),
        log_file = %config.logging.file.display(),
        "Configuration loaded"
    );

    let metrics = Arc::new(ServiceMetrics::new());
    let state = match AppState::from_config(&config, Arc::clone(&metrics)) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            error!(error = %e, "Model could not be loaded, refusing to serve predictions");
            return Err(e).context("Error loading model");
        }
    };

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Predictor shutting down...");
    metrics.print_summary();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
