//! # Application State
//!
//! Shared state for the Axum application, passed to route handlers via the
//! `State` extractor. Every component is cheaply cloneable and shares its
//! underlying stores through `Arc`.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use crate::audit::{AuditLogger, AuditSink};
use crate::auth::Authenticator;
use crate::credentials::CredentialStore;
use crate::middleware::metrics::ApiMetrics;
use crate::middleware::rate_limit::{RateLimitConfig, RateLimiter};
use crate::pipeline::RequestPipeline;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub credentials: CredentialStore,
    pub pipeline: RequestPipeline,
    pub metrics: ApiMetrics,
    /// Present when a global Prometheus recorder is installed.
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Wire the request pipeline over the given stores.
    pub fn new(
        credentials: CredentialStore,
        audit_sink: Arc<dyn AuditSink>,
        rate_limit: RateLimitConfig,
    ) -> Self {
        let metrics = ApiMetrics::new();
        let pipeline = RequestPipeline::new(
            Authenticator::new(credentials.clone()),
            RateLimiter::new(rate_limit, metrics.clone()),
            AuditLogger::new(audit_sink, metrics.clone()),
            metrics.clone(),
        );
        Self {
            credentials,
            pipeline,
            metrics,
            prometheus: None,
        }
    }

    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }
}
