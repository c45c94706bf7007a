//! OpenAPI specification generated from handler annotations via utoipa.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Top-level OpenAPI document.
///
/// Each handler module contributes its own paths and schemas via per-module
/// `#[derive(OpenApi)]` structs that are merged into this root document.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Sitecraft API",
        description = "Site settings, contact form intake and image galleries.",
        version = "0.3.0",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "admin", description = "Site settings and mail configuration"),
        (name = "forms", description = "Form submissions"),
        (name = "galleries", description = "Image galleries"),
        (name = "locations", description = "Map location markers"),
        (name = "health", description = "Health and readiness checks"),
    ),
    components(schemas(ErrorResponse))
)]
pub struct ApiDoc;

/// Standard error response body returned by all endpoints on failure.
#[derive(serde::Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error code (e.g. "NOT_FOUND", "VALIDATION_ERROR")
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

/// Adds the admin bearer-token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

/// Build the merged OpenAPI document from all handler modules.
pub fn build_openapi() -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();

    doc.merge(super::handlers::health::HealthApiDoc::openapi());
    doc.merge(super::handlers::settings::SettingsApiDoc::openapi());
    doc.merge(super::handlers::forms::FormsApiDoc::openapi());
    doc.merge(super::handlers::galleries::GalleriesApiDoc::openapi());
    doc.merge(super::handlers::locations::LocationsApiDoc::openapi());

    doc
}
