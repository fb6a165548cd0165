//! CHD Risk Service - Main Entry Point
//!
//! Loads the persisted model artifact once and serves predictions over HTTP
//! until interrupted.

use anyhow::{Context, Result};
use chd_risk_pipeline::{
    config::{AppConfig, DEFAULT_CONFIG_PATH},
    logging,
    metrics::MetricsReporter,
    models::InferenceEngine,
    server::{self, AppState},
};
use tracing::info;

/// Environment variable naming an alternative configuration file
const CONFIG_PATH_ENV: &str = "CHD_CONFIG";

#[tokio::main]
async fn main() -> Result<()> {
    let config_path =
        std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = AppConfig::load_from_path(&config_path)?;

    logging::init(&config.logging)?;
    info!(config = %config_path, "Starting CHD risk service");

    let engine = InferenceEngine::load(&config.artifact.path).with_context(|| {
        format!(
            "Failed to load model artifact from {}",
            config.artifact.path.display()
        )
    })?;
    info!(
        artifact_id = %engine.artifact().artifact_id,
        features = engine.artifact().columns.len(),
        "Inference engine ready"
    );

    let state = AppState::new(engine);
    let metrics = state.metrics.clone();

    if config.metrics.report_interval_secs > 0 {
        let reporter = MetricsReporter::new(metrics.clone(), config.metrics.report_interval_secs);
        tokio::spawn(reporter.start());
    }

    let app = server::router(state, config.server.cors_permissive);
    let address = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!(address = %address, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Service shutting down...");
    metrics.print_summary();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
