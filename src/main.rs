// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use crate::application::calibration_manager::CalibrationManager;
use crate::application::sampling_controller::SamplingController;
use crate::application::sensor_client::SensorClient;
use crate::application::session::TelemetrySession;
use crate::infrastructure::config::load_telemetry_config;
use crate::infrastructure::http_sensor_client::HttpSensorClient;
use crate::presentation::app_state::AppState;
use crate::presentation::router::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = load_telemetry_config()?;

    // Create sensor client (infrastructure layer)
    let sensor: Arc<dyn SensorClient> = Arc::new(HttpSensorClient::new(
        &config.sensor.base_url,
        config.sensor.request_timeout(),
    )?);

    // Create session and use cases (application layer)
    let session = TelemetrySession::new(config.calibration.strategy);
    let sampling = SamplingController::new(
        session.clone(),
        sensor.clone(),
        config.sampling.period(),
        config.sensor.request_timeout(),
    );
    let calibration = CalibrationManager::new(
        session.clone(),
        sensor,
        config.calibration.strategy,
        config.sensor.request_timeout(),
    );

    // The sampling loop idles until an operator starts a run
    tokio::spawn(sampling.clone().run());

    let state = Arc::new(AppState {
        session,
        sampling,
        calibration,
    });

    // Build router (presentation layer)
    let router = build_router(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .bind_addr
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.server.bind_addr))?;
    tracing::info!(
        sensor = %config.sensor.base_url,
        strategy = ?config.calibration.strategy,
        "Starting thrust-stand telemetry service on {}",
        addr
    );

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
