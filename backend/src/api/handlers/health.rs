//! Health, metrics and API document endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

use crate::api::SharedState;

#[derive(OpenApi)]
#[openapi(paths(health), components(schemas(HealthResponse)))]
pub struct HealthApiDoc;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/api/openapi.json", get(openapi_json))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
}

/// GET /health
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    operation_id = "health",
    responses(
        (status = 200, description = "Service and database are up", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse),
    ),
)]
pub async fn health(State(state): State<SharedState>) -> (StatusCode, Json<HealthResponse>) {
    match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy".to_string(),
                database: "ok".to_string(),
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Health check database ping failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy".to_string(),
                    database: "unreachable".to_string(),
                }),
            )
        }
    }
}

/// GET /metrics - Prometheus exposition format
pub async fn metrics(State(state): State<SharedState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// GET /api/openapi.json
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(crate::api::openapi::build_openapi())
}
