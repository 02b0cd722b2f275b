//! metricd-api: ingest and query surface for the metric store.
//!
//! [`MetricService`] is the facade over store + journal; [`build_router`]
//! mounts it behind axum.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | POST | `/update/{type}/{id}/{value}` | Path-form update |
//! | POST | `/update/` | Single JSON record update |
//! | POST | `/updates/` | Newline-delimited bulk update |
//! | GET | `/value/{type}/{id}` | Plain-text value lookup |
//! | POST | `/value/` | JSON record lookup |
//! | GET | `/values` | Full dump as a JSON array |
//! | GET | `/` | HTML listing |
//! | GET | `/metrics` | Prometheus exposition |

pub mod error;
pub mod exposition;
pub mod handlers;
pub mod service;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

pub use error::{ServiceError, ServiceResult};
pub use exposition::{render_html, render_prometheus};
pub use service::MetricService;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub service: MetricService,
}

/// Build the complete router.
pub fn build_router(service: MetricService) -> Router {
    let state = ApiState { service };

    Router::new()
        .route("/", get(handlers::index))
        .route("/update", post(handlers::update_json))
        .route("/update/", post(handlers::update_json))
        .route("/update/{kind}/{id}/{value}", post(handlers::update_by_path))
        .route("/updates", post(handlers::update_batch))
        .route("/updates/", post(handlers::update_batch))
        .route("/value", post(handlers::value_json))
        .route("/value/", post(handlers::value_json))
        .route("/value/{kind}/{id}", get(handlers::value_by_path))
        .route("/values", get(handlers::list_values))
        .route("/metrics", get(handlers::prometheus_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
