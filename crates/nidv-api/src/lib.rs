//! # nidv-api — National ID Validation Service
//!
//! Authenticates API clients by key, enforces a per-key request quota,
//! decodes 14-digit national identity numbers and audits every decoded
//! attempt.
//!
//! ## API Surface
//!
//! | Path                   | Auth     | Module                     |
//! |------------------------|----------|----------------------------|
//! | `/api/v1/national-id`  | API key  | [`routes::national_id`]    |
//! | `/openapi.json`        | none     | [`openapi`]                |
//! | `/metrics`             | none     | Prometheus text exposition |
//! | `/health/*`            | none     | liveness and readiness     |
//!
//! ## Request Flow
//!
//! ```text
//! TraceLayer → MetricsMiddleware → CatchPanic → Handler → RequestPipeline
//!   RequestPipeline: Authenticator → RateLimiter → decode → AuditLogger
//! ```
//!
//! Authentication and the rate gate live in [`pipeline::RequestPipeline`]
//! rather than in middleware because the gate is keyed by the authenticated
//! credential and audit records need it too.

pub mod audit;
pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod credentials;
pub mod error;
pub mod middleware;
pub mod openapi;
pub mod pipeline;
pub mod routes;
pub mod state;

use axum::extract::State;
use axum::http::header;
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
///
/// Health checks (`/health/*`) are mounted outside the metrics layer so
/// orchestrator polling does not inflate request counts.
pub fn app(state: AppState) -> Router {
    let routes = Router::new()
        .merge(routes::national_id::router())
        .merge(openapi::router())
        .route("/metrics", get(prometheus_metrics));
    let api = with_api_layers(routes, state.clone());

    let health = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .with_state(state);

    Router::new().merge(health).merge(api)
}

/// Wrap API routes in the shared middleware stack and bind the state.
pub fn with_api_layers(routes: Router<AppState>, state: AppState) -> Router {
    let metrics = state.metrics.clone();
    routes
        .layer(CatchPanicLayer::custom(error::panic_response))
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(metrics))
        .with_state(state)
}

/// Liveness check: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness check: 200 once the credential store answers.
async fn readiness(State(state): State<AppState>) -> Result<&'static str, AppError> {
    state
        .credentials
        .list()
        .map(|_| "ready")
        .map_err(|e| AppError::ServiceUnavailable(e.to_string()))
}

/// Prometheus text exposition of the `metrics` facade counters.
async fn prometheus_metrics(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let handle = state
        .prometheus
        .as_ref()
        .ok_or_else(|| AppError::ServiceUnavailable("prometheus recorder not installed".into()))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    ))
}
