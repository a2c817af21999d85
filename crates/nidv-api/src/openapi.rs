//! # OpenAPI Document Assembly
//!
//! Assembles the utoipa-documented routes into a single OpenAPI document,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::openapi::Components;
use utoipa::{Modify, OpenApi};

use crate::state::AppState;

/// Assembled OpenAPI document for the API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "National ID Validator API",
        version = "0.1.0",
        description = "Decodes and validates 14-digit Egyptian national identity numbers for authenticated API clients.",
        license(name = "AGPL-3.0-or-later")
    ),
    paths(crate::routes::national_id::validate_national_id),
    components(schemas(
        crate::pipeline::ValidateRequest,
        crate::routes::national_id::ValidIdentityResponse,
        crate::routes::national_id::InvalidIdentityResponse,
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
    )),
    modifiers(&ApiKeyScheme),
    tags((name = "national-id", description = "National identity number validation"))
)]
pub struct ApiDoc;

/// Registers the `X-API-KEY` header scheme referenced by secured paths.
struct ApiKeyScheme;

impl Modify for ApiKeyScheme {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Components::new);
        components.add_security_scheme(
            "api_key",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-API-KEY"))),
        );
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_validation_path() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        assert!(doc["paths"]["/api/v1/national-id"]["post"].is_object());
        assert!(doc["components"]["securitySchemes"]["api_key"].is_object());
        assert!(doc["components"]["schemas"]["ValidIdentityResponse"].is_object());
    }
}
