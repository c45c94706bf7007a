//! Email notification to the site owner when a form is submitted.

use std::sync::Arc;

use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::form_submission::{FormData, FormSubmission};
use crate::services::mail_service::{MailDispatcher, MailTransport, OutgoingMessage, TransportOverrides};
use crate::services::settings_service::SettingsStore;

pub const NOTIFICATION_SUBJECT: &str = "New Contact Form Received";

pub struct SubmissionNotifier {
    settings: Arc<dyn SettingsStore>,
    transport: Arc<dyn MailTransport>,
}

impl SubmissionNotifier {
    pub fn new(settings: Arc<dyn SettingsStore>, transport: Arc<dyn MailTransport>) -> Self {
        Self {
            settings,
            transport,
        }
    }

    /// Mail the submission to the owner address from site settings.
    ///
    /// Failures are logged and counted here; the caller decides whether they matter.
    pub async fn notify(&self, submission: &FormSubmission) -> Result<()> {
        match self.try_notify(submission).await {
            Ok(recipient) => {
                metrics::counter!("notifications_sent_total").increment(1);
                tracing::info!(
                    submission_id = %submission.id,
                    form_id = %submission.form_id,
                    recipient = %recipient,
                    "Form submission notification sent"
                );
                Ok(())
            }
            Err(e) => {
                metrics::counter!("notifications_failed_total").increment(1);
                tracing::error!(
                    submission_id = %submission.id,
                    form_id = %submission.form_id,
                    error = %e,
                    "Failed to send form submission notification"
                );
                Err(e)
            }
        }
    }

    async fn try_notify(&self, submission: &FormSubmission) -> Result<String> {
        let settings = self.settings.fetch().await?.ok_or_else(|| {
            AppError::Config("no site settings record; cannot notify".to_string())
        })?;
        let recipient = settings.owner_mail.clone();

        let dispatcher = MailDispatcher::from_settings(
            Some(&settings),
            &TransportOverrides::default(),
            self.transport.clone(),
        )?;
        dispatcher
            .send(build_notification(&recipient, submission.fields()))
            .await?;
        Ok(recipient)
    }
}

/// The notification message. The sender is left as the placeholder so the
/// dispatcher substitutes the configured one.
pub fn build_notification(recipient: &str, fields: &FormData) -> OutgoingMessage {
    OutgoingMessage::new(NOTIFICATION_SUBJECT, vec![recipient.to_string()])
        .with_html(render_body(fields))
}

/// One `<strong>Field</strong>: value<br>` line per field, in submission order.
pub fn render_body(fields: &FormData) -> String {
    fields
        .iter()
        .map(|(name, value)| {
            format!(
                "<strong>{}</strong>: {}<br>",
                escape_html(&capitalize_first(name)),
                escape_html(&display_value(value))
            )
        })
        .collect()
}

/// Uppercase the first character only; the rest is kept as typed.
fn capitalize_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
