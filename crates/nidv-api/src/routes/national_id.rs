//! # National ID Validation Route
//!
//! `POST /api/v1/national-id` — decode a 14-digit national identity number.
//!
//! The body is taken as raw bytes and parsed by the pipeline, after
//! authentication and the rate gate, so an unauthenticated caller always
//! gets 401 regardless of what it sent. The pipeline runs on the blocking
//! pool because its stores are file-backed.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use nidv_core::DecodedIdentity;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use zeroize::Zeroizing;

use crate::auth::presented_key;
use crate::error::AppError;
pub use crate::pipeline::ValidateRequest;
use crate::pipeline::PipelineOutcome;
use crate::state::AppState;

/// Successful decode.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ValidIdentityResponse {
    pub valid: bool,
    #[schema(example = 2003)]
    pub birth_year: i32,
    /// `dd/mm/yyyy`
    #[schema(example = "02/07/2003")]
    pub birth_date: String,
    #[schema(example = "Male")]
    pub gender: String,
    #[schema(example = "Cairo")]
    pub governorate: String,
}

impl From<&DecodedIdentity> for ValidIdentityResponse {
    fn from(identity: &DecodedIdentity) -> Self {
        Self {
            valid: true,
            birth_year: identity.birth_year,
            birth_date: identity.birth_date_display(),
            gender: identity.gender.to_string(),
            governorate: identity.governorate.clone(),
        }
    }
}

/// Failed decode.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InvalidIdentityResponse {
    pub valid: bool,
    #[schema(example = "Invalid century digit (must be 2 or 3)")]
    pub error: String,
}

/// Both slash forms are served; existing clients post to the trailing-slash path.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/national-id", post(validate_national_id))
        .route("/api/v1/national-id/", post(validate_national_id))
}

/// POST /api/v1/national-id — Validate and decode a national identity number.
#[utoipa::path(
    post,
    path = "/api/v1/national-id",
    request_body = ValidateRequest,
    responses(
        (status = 200, description = "Number is valid", body = ValidIdentityResponse),
        (status = 400, description = "Number is invalid, or the body is malformed", body = InvalidIdentityResponse),
        (status = 401, description = "Missing or invalid API key", body = crate::error::ErrorBody),
        (status = 429, description = "Per-credential rate limit exceeded", body = crate::error::ErrorBody),
        (status = 503, description = "Credential store unavailable", body = crate::error::ErrorBody),
    ),
    security(("api_key" = [])),
    tag = "national-id"
)]
pub async fn validate_national_id(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let token = presented_key(&headers).map(|k| Zeroizing::new(k.to_string()));
    let pipeline = state.pipeline.clone();
    // The pipeline does blocking file I/O (credential lookups, audit appends).
    let outcome = tokio::task::spawn_blocking(move || {
        pipeline.run(token.as_ref().map(|k| k.as_str()), &body)
    })
    .await;
    match outcome {
        Ok(outcome) => respond(outcome),
        // Re-raise so the router's panic layer renders it.
        Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
        Err(err) => AppError::Internal(format!("validation task cancelled: {err}")).into_response(),
    }
}

fn respond(outcome: PipelineOutcome) -> Response {
    match outcome {
        PipelineOutcome::Unauthorized(reason) => AppError::from(reason).into_response(),
        PipelineOutcome::Throttled => AppError::RateLimited.into_response(),
        PipelineOutcome::Malformed(message) => AppError::BadRequest(message).into_response(),
        PipelineOutcome::Decoded { result: Ok(identity), .. } => {
            (StatusCode::OK, Json(ValidIdentityResponse::from(&identity))).into_response()
        }
        PipelineOutcome::Decoded { result: Err(err), .. } => (
            StatusCode::BAD_REQUEST,
            Json(InvalidIdentityResponse {
                valid: false,
                error: err.to_string(),
            }),
        )
            .into_response(),
    }
}
