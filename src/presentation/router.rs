// Route table for the operator API
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    chart, export_log, health_check, log, reset, run_calibration, set_throttle, start_sampling,
    status, stop_sampling, stream_events,
};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    // The live feed stays uncompressed so each line is flushed as it arrives
    let feed = Router::new().route("/stream", get(stream_events));

    let api = Router::new()
        .route("/healthz", get(health_check))
        .route("/status", get(status))
        .route("/throttle", post(set_throttle))
        .route("/sampling/start", post(start_sampling))
        .route("/sampling/stop", post(stop_sampling))
        .route("/reset", post(reset))
        .route("/calibration", post(run_calibration))
        .route("/chart", get(chart))
        .route("/log", get(log))
        .route("/log/print", get(export_log))
        .layer(CompressionLayer::new());

    Router::new()
        .merge(api)
        .merge(feed)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
