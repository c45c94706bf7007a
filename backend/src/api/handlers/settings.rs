//! Site settings admin API handlers.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

use crate::api::validation::{validate_mailbox, validate_settings_addresses};
use crate::api::SharedState;
use crate::error::{AppError, Result};
use crate::models::site_setting::{SiteSetting, SiteSettingUpdate};
use crate::services::mail_service::{MailDispatcher, OutgoingMessage, TransportOverrides};

#[derive(OpenApi)]
#[openapi(
    paths(get_settings, update_settings, send_test_email),
    components(schemas(SiteSetting, SiteSettingUpdate, TestEmailRequest, TestEmailResponse))
)]
pub struct SettingsApiDoc;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(get_settings).put(update_settings))
        .route("/test-email", post(send_test_email))
}

/// GET /api/v1/admin/settings
#[utoipa::path(
    get,
    path = "",
    context_path = "/api/v1/admin/settings",
    tag = "admin",
    operation_id = "get_settings",
    responses(
        (status = 200, description = "Current site settings (secrets omitted)", body = SiteSetting),
        (status = 404, description = "Settings have not been created yet", body = crate::api::openapi::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn get_settings(State(state): State<SharedState>) -> Result<Json<SiteSetting>> {
    let setting = state
        .settings
        .fetch()
        .await?
        .ok_or_else(|| AppError::NotFound("Site settings have not been created".to_string()))?;
    Ok(Json(setting))
}

/// PUT /api/v1/admin/settings
#[utoipa::path(
    put,
    path = "",
    context_path = "/api/v1/admin/settings",
    tag = "admin",
    operation_id = "update_settings",
    request_body = SiteSettingUpdate,
    responses(
        (status = 200, description = "Saved settings", body = SiteSetting),
        (status = 400, description = "Validation failed", body = crate::api::openapi::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn update_settings(
    State(state): State<SharedState>,
    Json(payload): Json<SiteSettingUpdate>,
) -> Result<Json<SiteSetting>> {
    validate_settings_addresses(&payload)?;
    let setting = state.settings.save(&payload).await?;
    Ok(Json(setting))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TestEmailRequest {
    /// Recipient of the test message.
    pub to: String,
    /// Try unsaved transport values without storing them.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub overrides: TransportOverrides,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TestEmailResponse {
    pub sent: bool,
    pub host: String,
    pub port: u16,
}

/// POST /api/v1/admin/settings/test-email
#[utoipa::path(
    post,
    path = "/test-email",
    context_path = "/api/v1/admin/settings",
    tag = "admin",
    operation_id = "send_test_email",
    request_body = TestEmailRequest,
    responses(
        (status = 200, description = "Message accepted by the SMTP server", body = TestEmailResponse),
        (status = 500, description = "No settings record", body = crate::api::openapi::ErrorResponse),
        (status = 502, description = "Delivery failed", body = crate::api::openapi::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn send_test_email(
    State(state): State<SharedState>,
    Json(payload): Json<TestEmailRequest>,
) -> Result<Json<TestEmailResponse>> {
    validate_mailbox(&payload.to, "Recipient")?;

    let dispatcher = MailDispatcher::connect(
        state.settings.as_ref(),
        &payload.overrides,
        state.mail_transport.clone(),
    )
    .await?;

    let message = OutgoingMessage::new("Test email", vec![payload.to.trim().to_string()])
        .with_body("This is a test message from your site's mail settings.");
    dispatcher.send(message).await?;

    let config = dispatcher.config();
    tracing::info!(host = %config.host, port = config.port, "Test email sent");
    Ok(Json(TestEmailResponse {
        sent: true,
        host: config.host.clone(),
        port: config.port,
    }))
}
