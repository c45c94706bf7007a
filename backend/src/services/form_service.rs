//! Form submission intake.
//!
//! Checks the captcha when one is configured, stores the submission, then
//! notifies the site owner. Notification runs inline after the insert and
//! its failure never fails the submission.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::{AppError, Result};
use crate::models::form_submission::{strip_captcha, FormData, FormSubmission};
use crate::services::captcha_service::{check_captcha, CaptchaVerifier};
use crate::services::notification_service::SubmissionNotifier;
use crate::services::settings_service::SettingsStore;

#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn insert(&self, form_id: &str, data: FormData) -> Result<FormSubmission>;
}

pub struct PgSubmissionStore {
    db: PgPool,
}

impl PgSubmissionStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SubmissionStore for PgSubmissionStore {
    async fn insert(&self, form_id: &str, data: FormData) -> Result<FormSubmission> {
        // Sent as text: a JSONB parameter would reorder the keys.
        let form_data = serde_json::to_string(&data)?;
        let submission: FormSubmission = sqlx::query_as(
            r#"
            INSERT INTO form_submissions (form_id, form_data)
            VALUES ($1, $2::json)
            RETURNING id, form_id, form_data, submitted_at
            "#,
        )
        .bind(form_id)
        .bind(form_data)
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(submission)
    }
}

pub struct FormSubmissionService {
    store: Arc<dyn SubmissionStore>,
    settings: Arc<dyn SettingsStore>,
    captcha: Arc<dyn CaptchaVerifier>,
    notifier: SubmissionNotifier,
}

impl FormSubmissionService {
    pub fn new(
        store: Arc<dyn SubmissionStore>,
        settings: Arc<dyn SettingsStore>,
        captcha: Arc<dyn CaptchaVerifier>,
        notifier: SubmissionNotifier,
    ) -> Self {
        Self {
            store,
            settings,
            captcha,
            notifier,
        }
    }

    /// Record a submission and notify the owner.
    ///
    /// Errors come from the captcha check and from storing the submission,
    /// never from notification.
    pub async fn submit(&self, form_id: &str, data: FormData) -> Result<FormSubmission> {
        if form_id.trim().is_empty() {
            return Err(AppError::Validation("form id is required".to_string()));
        }

        // Fails closed: without the settings record we cannot tell whether
        // the form requires a captcha.
        let settings = self.settings.fetch().await?;
        check_captcha(settings.as_ref(), &data, self.captcha.as_ref())
            .await
            .inspect_err(|e| {
                tracing::info!(form_id = %form_id, error = %e, "Form submission refused");
            })?;

        let submission = self.store.insert(form_id, strip_captcha(data)).await?;

        // Already logged and counted by the notifier.
        let _ = self.notifier.notify(&submission).await;

        Ok(submission)
    }
}
