//! HTTP handlers.
//!
//! Each handler is a thin adapter from request shape to a
//! [`MetricService`](crate::MetricService) call; records are decoded with the
//! metric codec rather than axum's JSON extractor so kind errors keep their
//! own status codes.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse};
use metricd_core::{MetricKind, decode_query, encode};

use crate::ApiState;
use crate::error::ServiceResult;
use crate::exposition::{render_html, render_prometheus};

const JSON: [(header::HeaderName, &str); 1] = [(header::CONTENT_TYPE, "application/json")];

// ── Ingest ─────────────────────────────────────────────────────

/// POST /update/{type}/{id}/{value}
pub async fn update_by_path(
    State(state): State<ApiState>,
    Path((kind, id, value)): Path<(String, String, String)>,
) -> ServiceResult<impl IntoResponse> {
    let stored = state.service.ingest_path(&kind, &id, &value)?;
    Ok((StatusCode::OK, stored.render_value()))
}

/// POST /update/
pub async fn update_json(
    State(state): State<ApiState>,
    body: Bytes,
) -> ServiceResult<impl IntoResponse> {
    let stored = state.service.ingest(&body)?;
    Ok((StatusCode::OK, JSON, encode(&stored)?))
}

/// POST /updates/
pub async fn update_batch(
    State(state): State<ApiState>,
    body: Bytes,
) -> ServiceResult<impl IntoResponse> {
    let applied = state.service.ingest_batch(&body)?;
    Ok(axum::Json(serde_json::json!({ "applied": applied })))
}

// ── Query ──────────────────────────────────────────────────────

/// GET /value/{type}/{id}
pub async fn value_by_path(
    State(state): State<ApiState>,
    Path((kind, id)): Path<(String, String)>,
) -> ServiceResult<impl IntoResponse> {
    let kind = kind.parse::<MetricKind>()?;
    let metric = state.service.lookup(&id, kind)?;
    Ok(metric.render_value())
}

/// POST /value/
pub async fn value_json(
    State(state): State<ApiState>,
    body: Bytes,
) -> ServiceResult<impl IntoResponse> {
    let query = decode_query(&body)?;
    let metric = state.service.lookup(&query.id, query.kind)?;
    Ok((StatusCode::OK, JSON, encode(&metric)?))
}

/// GET /values
pub async fn list_values(State(state): State<ApiState>) -> ServiceResult<impl IntoResponse> {
    Ok((StatusCode::OK, JSON, state.service.query_all()?))
}

/// GET /
pub async fn index(State(state): State<ApiState>) -> impl IntoResponse {
    Html(render_html(&state.service.snapshot()))
}

/// GET /metrics
pub async fn prometheus_metrics(State(state): State<ApiState>) -> impl IntoResponse {
    let body = render_prometheus(&state.service.snapshot());
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}
