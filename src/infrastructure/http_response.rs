// HTTP response utilities for HTML documents and error bodies
use axum::{
    body::Body,
    http::{header, HeaderValue, Response, StatusCode},
    response::IntoResponse,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

/// Build an HTML response with an explicit length
pub fn html_response(document: String) -> Response<Body> {
    let length = HeaderValue::from(document.len());

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
        .header(header::CONTENT_LENGTH, length)
        .body(Body::from(document))
        .unwrap_or_else(|e| {
            tracing::error!("Response build error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        })
}

/// Build a JSON `{ "error": ... }` response
pub fn error_response(status: StatusCode, message: &str) -> Response<Body> {
    let body = match serde_json::to_vec(&ErrorBody { error: message }) {
        Ok(body) => body,
        Err(e) => {
            tracing::error!("Error body serialization error: {}", e);
            return status.into_response();
        }
    };

    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap_or_else(|_| status.into_response())
}
