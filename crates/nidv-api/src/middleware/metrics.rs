//! # Request Metrics
//!
//! Counters are emitted through the `metrics` facade (exported as Prometheus
//! text at `/metrics` when a recorder is installed) and mirrored into
//! in-process atomics that tests and the readiness check can read directly.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

pub const HTTP_REQUESTS_TOTAL: &str = "nidv_http_requests_total";
pub const HTTP_ERRORS_TOTAL: &str = "nidv_http_errors_total";
pub const VALIDATIONS_TOTAL: &str = "nidv_validations_total";
pub const RATE_LIMITED_TOTAL: &str = "nidv_rate_limited_total";
pub const AUDIT_FAILURES_TOTAL: &str = "nidv_audit_failures_total";

/// Shared metrics state.
#[derive(Debug, Clone, Default)]
pub struct ApiMetrics {
    request_count: Arc<AtomicU64>,
    error_count: Arc<AtomicU64>,
    rate_limited_count: Arc<AtomicU64>,
    audit_failure_count: Arc<AtomicU64>,
}

impl ApiMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> u64 {
        self.error_count.load(Ordering::Relaxed)
    }

    pub fn rate_limited(&self) -> u64 {
        self.rate_limited_count.load(Ordering::Relaxed)
    }

    pub fn audit_failures(&self) -> u64 {
        self.audit_failure_count.load(Ordering::Relaxed)
    }

    pub fn record_rate_limited(&self) {
        self.rate_limited_count.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(RATE_LIMITED_TOTAL).increment(1);
    }

    pub fn record_audit_failure(&self) {
        self.audit_failure_count.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(AUDIT_FAILURES_TOTAL).increment(1);
    }

    /// `valid` or `invalid`.
    pub fn record_validation(&self, valid: bool) {
        let outcome = if valid { "valid" } else { "invalid" };
        metrics::counter!(VALIDATIONS_TOTAL, "outcome" => outcome).increment(1);
    }

    fn record_response(&self, status: u16) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(HTTP_REQUESTS_TOTAL).increment(1);
        if status >= 400 {
            self.error_count.fetch_add(1, Ordering::Relaxed);
            metrics::counter!(HTTP_ERRORS_TOTAL, "status" => status.to_string()).increment(1);
        }
    }
}

/// Middleware that counts every response and every 4xx/5xx.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let metrics = request.extensions().get::<ApiMetrics>().cloned();

    let response = next.run(request).await;

    if let Some(m) = metrics {
        m.record_response(response.status().as_u16());
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero() {
        let m = ApiMetrics::new();
        assert_eq!(m.requests(), 0);
        assert_eq!(m.errors(), 0);
        assert_eq!(m.rate_limited(), 0);
        assert_eq!(m.audit_failures(), 0);
    }

    #[test]
    fn clones_share_counters() {
        let m = ApiMetrics::new();
        let other = m.clone();
        other.record_audit_failure();
        other.record_rate_limited();
        assert_eq!(m.audit_failures(), 1);
        assert_eq!(m.rate_limited(), 1);
    }

    #[test]
    fn responses_classified_by_status() {
        let m = ApiMetrics::new();
        m.record_response(200);
        m.record_response(400);
        m.record_response(503);
        assert_eq!(m.requests(), 3);
        assert_eq!(m.errors(), 2);
    }
}
