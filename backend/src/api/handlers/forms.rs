//! Public form submission endpoint.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use crate::api::SharedState;
use crate::error::Result;
use crate::models::form_submission::FormData;

#[derive(OpenApi)]
#[openapi(paths(submit_form), components(schemas(SubmissionCreated)))]
pub struct FormsApiDoc;

pub fn router() -> Router<SharedState> {
    Router::new().route("/:form_id/submissions", post(submit_form))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubmissionCreated {
    pub id: Uuid,
    pub submitted_at: DateTime<Utc>,
}

/// POST /api/v1/forms/:form_id/submissions
///
/// Always answers 201 once the submission is stored, whether or not the
/// owner notification went out.
#[utoipa::path(
    post,
    path = "/{form_id}/submissions",
    context_path = "/api/v1/forms",
    tag = "forms",
    operation_id = "submit_form",
    params(("form_id" = String, Path, description = "Form page identifier")),
    request_body(content = Object, description = "Field name to submitted value, in form order"),
    responses(
        (status = 201, description = "Submission stored", body = SubmissionCreated),
        (status = 400, description = "Body is not a JSON object, or the captcha is missing or rejected", body = crate::api::openapi::ErrorResponse),
        (status = 502, description = "Captcha provider unreachable", body = crate::api::openapi::ErrorResponse),
    ),
)]
pub async fn submit_form(
    State(state): State<SharedState>,
    Path(form_id): Path<String>,
    Json(payload): Json<FormData>,
) -> Result<(StatusCode, Json<SubmissionCreated>)> {
    let submission = state.form_service().submit(&form_id, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(SubmissionCreated {
            id: submission.id,
            submitted_at: submission.submitted_at,
        }),
    ))
}
