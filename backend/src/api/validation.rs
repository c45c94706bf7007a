//! Shared input validation helpers.
//!
//! Address rules for settings and test-mail requests live here so every
//! handler rejects the same inputs with the same messages.

use lettre::message::Mailbox;

use crate::error::{AppError, Result};
use crate::models::site_setting::SiteSettingUpdate;

/// Validate a single mailbox, either `user@host` or `Name <user@host>`.
///
/// `label` is used in error messages (e.g. "Owner email").
pub fn validate_mailbox(value: &str, label: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", label)));
    }
    value
        .trim()
        .parse::<Mailbox>()
        .map(|_| ())
        .map_err(|_| AppError::Validation(format!("{} '{}' is not a valid address", label, value)))
}

/// Address checks on top of the record's own validation. Empty fields are
/// allowed: the site can be configured before mail is.
pub fn validate_settings_addresses(update: &SiteSettingUpdate) -> Result<()> {
    if !update.owner_mail.trim().is_empty() {
        validate_mailbox(&update.owner_mail, "Owner email")?;
    }
    if let Some(sender) = update.email_sender.as_deref() {
        if !sender.trim().is_empty() {
            validate_mailbox(sender, "From email address")?;
        }
    }
    if update.email_host.chars().any(char::is_whitespace) {
        return Err(AppError::Validation(
            "Email host must not contain whitespace".to_string(),
        ));
    }
    Ok(())
}
