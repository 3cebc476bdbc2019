// HTTP request handlers
use crate::application::calibration_manager::CalibrationError;
use crate::application::sampling_controller::ThrottleError;
use crate::domain::calibration::{CalibrationStrategy, KnownValues};
use crate::domain::telemetry::DisplayRecord;
use crate::infrastructure::chunked_json::stream_response;
use crate::infrastructure::event_mapper::feed_from_receiver;
use crate::infrastructure::http_response::{error_response, html_response};
use crate::infrastructure::report::render_log_document;
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct ThrottleQuery {
    pub value: String,
}

#[derive(Deserialize)]
pub struct CalibrationRequest {
    #[serde(default)]
    pub strategy: Option<CalibrationStrategy>,
    pub known: KnownValues,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.session.status().await)
}

pub async fn set_throttle(
    Query(query): Query<ThrottleQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let value = match query.value.trim().parse::<u16>() {
        Ok(value) => value,
        Err(_) => {
            return error_response(StatusCode::BAD_REQUEST, "invalid throttle: not a pulse width")
        }
    };

    match state.sampling.set_throttle(value).await {
        Ok(()) => Json(state.session.status().await).into_response(),
        Err(e @ ThrottleError::InvalidInput(_)) => {
            error_response(StatusCode::BAD_REQUEST, &e.to_string())
        }
        Err(e @ ThrottleError::Sensor(_)) => {
            tracing::warn!("Throttle write failed: {}", e);
            error_response(StatusCode::BAD_GATEWAY, &e.to_string())
        }
    }
}

pub async fn start_sampling(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.sampling.start().await;
    Json(state.session.status().await)
}

pub async fn stop_sampling(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.sampling.stop().await;
    Json(state.session.status().await)
}

pub async fn reset(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.sampling.reset().await;
    Json(state.session.status().await)
}

pub async fn run_calibration(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CalibrationRequest>,
) -> Response {
    match state.calibration.calibrate(request.strategy, request.known).await {
        Ok(factors) => Json(factors).into_response(),
        Err(e @ CalibrationError::InvalidInput(_)) => {
            error_response(StatusCode::BAD_REQUEST, &e.to_string())
        }
        Err(e @ CalibrationError::Sensor(_)) => {
            tracing::error!("Calibration failed: {}", e);
            error_response(StatusCode::BAD_GATEWAY, &e.to_string())
        }
    }
}

/// Rolling window for the live chart
pub async fn chart(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let points: Vec<DisplayRecord> = state
        .session
        .window_snapshot()
        .await
        .iter()
        .map(|r| r.display())
        .collect();
    Json(points)
}

/// Full session log for the data table
pub async fn log(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let rows: Vec<DisplayRecord> = state
        .session
        .log_snapshot()
        .await
        .iter()
        .map(|r| r.display())
        .collect();
    Json(rows)
}

/// Printable export of the session log
pub async fn export_log(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let records = state.session.log_snapshot().await;
    html_response(render_log_document(&records))
}

/// Live feed of session events, one JSON document per line
pub async fn stream_events(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    stream_response(feed_from_receiver(state.session.subscribe()))
}
