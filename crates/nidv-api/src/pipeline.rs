//! # Request Pipeline
//!
//! Orchestrates one validation request:
//!
//! ```text
//! Start → Authenticated → Throttled
//!                       → Admitted → Decoded → Logged → Responded
//! ```
//!
//! Each step runs only if the previous one succeeded. Unauthenticated and
//! throttled requests are never decoded and never audited. A body that is
//! not valid JSON, or lacks a string `national_id`, is rejected after the
//! rate gate and is also not audited. Every decoded attempt is audited,
//! whatever its validation result.

use chrono::{DateTime, Utc};
use nidv_core::{decode_at, DecodedIdentity, ValidationError};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::audit::{AuditLogger, LogHandle};
use crate::auth::{AuthError, AuthOutcome, Authenticator};
use crate::middleware::metrics::ApiMetrics;
use crate::middleware::rate_limit::RateLimiter;

/// Body of a validation request. The identity number is kept as a raw
/// string so every malformed value is reported by the decoder.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ValidateRequest {
    #[schema(example = "30307020102113")]
    pub national_id: String,
}

/// Terminal state of one pipeline run.
#[derive(Debug, Clone)]
pub enum PipelineOutcome {
    Unauthorized(AuthError),
    Throttled,
    Malformed(String),
    Decoded {
        result: Result<DecodedIdentity, ValidationError>,
        /// `None` when the audit write failed.
        log: Option<LogHandle>,
    },
}

/// The validation request state machine.
#[derive(Debug, Clone)]
pub struct RequestPipeline {
    authenticator: Authenticator,
    limiter: RateLimiter,
    audit: AuditLogger,
    metrics: ApiMetrics,
}

impl RequestPipeline {
    pub fn new(
        authenticator: Authenticator,
        limiter: RateLimiter,
        audit: AuditLogger,
        metrics: ApiMetrics,
    ) -> Self {
        Self {
            authenticator,
            limiter,
            audit,
            metrics,
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Run against the current time.
    pub fn run(&self, token: Option<&str>, body: &[u8]) -> PipelineOutcome {
        self.run_at(token, body, Utc::now())
    }

    /// Run with an explicit clock. Birth dates after `now`'s UTC date are
    /// rejected as future dates.
    pub fn run_at(&self, token: Option<&str>, body: &[u8], now: DateTime<Utc>) -> PipelineOutcome {
        let credential = match self.authenticator.authenticate(token) {
            AuthOutcome::Authenticated(credential) => credential,
            AuthOutcome::Unauthenticated(reason) => {
                tracing::info!(reason = %reason, "request rejected: unauthenticated");
                return PipelineOutcome::Unauthorized(reason);
            }
        };

        if !self.limiter.allow_at(&credential, now) {
            return PipelineOutcome::Throttled;
        }

        let request: ValidateRequest = match serde_json::from_slice(body) {
            Ok(request) => request,
            Err(err) => {
                tracing::debug!(error = %err, "malformed request body");
                return PipelineOutcome::Malformed(format!("invalid request body: {err}"));
            }
        };

        let result = decode_at(&request.national_id, now.date_naive());
        self.metrics.record_validation(result.is_ok());
        let log = self
            .audit
            .record_best_effort(&request.national_id, &result, &credential);

        tracing::info!(
            credential_id = %credential.id,
            valid = result.is_ok(),
            error_code = result.as_ref().err().map(|e| e.code()).unwrap_or("none"),
            audited = log.is_some(),
            "national id validated"
        );
        PipelineOutcome::Decoded { result, log }
    }
}
