//! Form submissions created from page-embedded forms.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use utoipa::ToSchema;
use uuid::Uuid;

/// Name of the captcha field injected into forms when captcha keys are set.
pub const CAPTCHA_FIELD_NAME: &str = "captcha";

/// Submitted field values, in the order the form sent them.
pub type FormData = Map<String, Value>;

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct FormSubmission {
    pub id: Uuid,
    /// Identifier of the form page that owns this submission.
    pub form_id: String,
    #[schema(value_type = Object)]
    pub form_data: sqlx::types::Json<FormData>,
    pub submitted_at: DateTime<Utc>,
}

impl FormSubmission {
    pub fn fields(&self) -> &FormData {
        &self.form_data.0
    }
}

/// Drop the captcha answer so it is neither stored nor mailed.
pub fn strip_captcha(mut data: FormData) -> FormData {
    data.shift_remove(CAPTCHA_FIELD_NAME);
    data
}
