//! Site settings record: mail transport, notification recipient and site toggles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, Result};

pub const DEFAULT_EMAIL_PORT: i32 = 465;

/// The single settings row. Only one is expected; readers take the first.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct SiteSetting {
    pub id: i32,
    pub email_host: String,
    pub email_port: i32,
    pub email_host_user: String,
    #[serde(skip_serializing)]
    pub email_host_password: String,
    pub email_use_tls: bool,
    pub email_use_ssl: bool,
    /// "From" address, e.g. `Sender Name <sender@example.com>`.
    pub email_sender: Option<String>,
    /// Recipient of form-submission notifications.
    pub owner_mail: String,
    pub captcha_site_key: String,
    #[serde(skip_serializing)]
    pub captcha_secret_key: String,
    pub facebook_page_id: String,
    pub using_messenger: bool,
    pub whatsapp_id: String,
    pub using_whatsapp: bool,
    pub custom_css: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl SiteSetting {
    /// Captcha is only enforced when both keys are configured.
    pub fn captcha_enabled(&self) -> bool {
        !self.captcha_site_key.is_empty() && !self.captcha_secret_key.is_empty()
    }
}

/// Admin-submitted replacement for the settings record.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SiteSettingUpdate {
    #[serde(default)]
    pub email_host: String,
    #[serde(default = "default_email_port")]
    pub email_port: i32,
    #[serde(default)]
    pub email_host_user: String,
    #[serde(default)]
    pub email_host_password: String,
    #[serde(default)]
    pub email_use_tls: bool,
    #[serde(default = "default_true")]
    pub email_use_ssl: bool,
    #[serde(default)]
    pub email_sender: Option<String>,
    #[serde(default)]
    pub owner_mail: String,
    #[serde(default)]
    pub captcha_site_key: String,
    #[serde(default)]
    pub captcha_secret_key: String,
    #[serde(default)]
    pub facebook_page_id: String,
    #[serde(default = "default_true")]
    pub using_messenger: bool,
    #[serde(default)]
    pub whatsapp_id: String,
    #[serde(default = "default_true")]
    pub using_whatsapp: bool,
    #[serde(default)]
    pub custom_css: Option<String>,
}

fn default_email_port() -> i32 {
    DEFAULT_EMAIL_PORT
}

fn default_true() -> bool {
    true
}

impl SiteSettingUpdate {
    /// Checks applied before the record is written.
    pub fn validate(&self) -> Result<()> {
        validate_security_mode(self.email_use_tls, self.email_use_ssl)?;
        if !(1..=i32::from(u16::MAX)).contains(&self.email_port) {
            return Err(AppError::Validation(format!(
                "Email port must be between 1 and 65535, got {}",
                self.email_port
            )));
        }
        Ok(())
    }
}

/// TLS (STARTTLS) and SSL (implicit TLS) cannot both be on.
pub fn validate_security_mode(use_tls: bool, use_ssl: bool) -> Result<()> {
    if use_tls && use_ssl {
        return Err(AppError::Validation(
            "\"Use TLS\" and \"Use SSL\" are mutually exclusive, so only set one of those settings to true."
                .to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(use_tls: bool, use_ssl: bool) -> SiteSettingUpdate {
        let mut u: SiteSettingUpdate = serde_json::from_str("{}").unwrap();
        u.email_use_tls = use_tls;
        u.email_use_ssl = use_ssl;
        u
    }

    #[test]
    fn test_both_tls_and_ssl_rejected() {
        let err = update(true, true).validate().unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(err.to_string().contains("mutually exclusive"));
    }

    #[test]
    fn test_other_combinations_accepted() {
        for (tls, ssl) in [(false, false), (true, false), (false, true)] {
            assert!(update(tls, ssl).validate().is_ok(), "tls={tls} ssl={ssl}");
        }
    }

    #[test]
    fn test_port_out_of_range_rejected() {
        let mut u = update(false, true);
        u.email_port = 0;
        assert!(u.validate().is_err());
        u.email_port = 70_000;
        assert!(u.validate().is_err());
        u.email_port = 587;
        assert!(u.validate().is_ok());
    }

    #[test]
    fn test_update_defaults_match_schema_defaults() {
        let u: SiteSettingUpdate = serde_json::from_str("{}").unwrap();
        assert_eq!(u.email_port, 465);
        assert!(u.email_use_ssl);
        assert!(!u.email_use_tls);
        assert!(u.email_sender.is_none());
    }

    #[test]
    fn test_secrets_not_serialized() {
        let setting = SiteSetting {
            id: 1,
            email_host: "smtp.example.com".into(),
            email_port: 465,
            email_host_user: "mailer".into(),
            email_host_password: "hunter2".into(),
            email_use_tls: false,
            email_use_ssl: true,
            email_sender: Some("Site <site@example.com>".into()),
            owner_mail: "owner@example.com".into(),
            captcha_site_key: "site-key".into(),
            captcha_secret_key: "secret-key".into(),
            facebook_page_id: String::new(),
            using_messenger: true,
            whatsapp_id: String::new(),
            using_whatsapp: true,
            custom_css: None,
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string(&setting).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(!json.contains("secret-key"));
        assert!(json.contains("smtp.example.com"));
        assert!(setting.captcha_enabled());
    }
}
