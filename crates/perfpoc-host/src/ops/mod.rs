//! Operational HTTP endpoints.
//!
//! - `/healthz`      : liveness
//! - `/readyz`       : readiness (503 unless emitters are running)
//! - `/metrics`      : Prometheus text format (raw counters)
//! - `/v1/counters`  : derived values since the previous call (JSON)

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use perfpoc_core::ErrorCode;

use crate::app_state::AppState;
use crate::obs::metrics;

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    if state.is_ready() {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, state.host_state().as_str())
    }
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    let body = metrics::render(state.category(), &state.sample(), state.host_state());

    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
        .into_response()
}

pub async fn counters(State(state): State<AppState>) -> Response {
    match state.derived() {
        Ok(values) => Json(json!({
            "category": state.category(),
            "state": state.host_state().as_str(),
            "counters": values,
        }))
        .into_response(),
        Err(e) => (
            match e.code() {
                ErrorCode::CategoryNotFound => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Json(json!({
                "error": e.code().as_str(),
                "message": e.to_string(),
            })),
        )
            .into_response(),
    }
}
