//! Process configuration loaded from the environment.
//!
//! Mail credentials are NOT part of this: they live in the site settings
//! record so an administrator can change them without a restart.

use std::time::Duration;

use crate::error::{AppError, Result};
use crate::services::captcha_service::RECAPTCHA_VERIFY_URL;

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    /// URL prefix under which uploaded image files are served.
    pub media_url: String,
    /// Bearer token required for admin routes. Admin routes are closed when unset.
    pub admin_token: Option<String>,
    pub smtp_timeout: Duration,
    /// reCAPTCHA `siteverify` endpoint.
    pub captcha_verify_url: String,
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::Config("DATABASE_URL must be set".to_string()))?;

        let smtp_timeout_secs = match lookup("SMTP_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                AppError::Config(format!("SMTP_TIMEOUT_SECS is not a number: {}", raw))
            })?,
            None => 10,
        };

        Ok(Self {
            database_url,
            bind_address: lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            media_url: lookup("MEDIA_URL").unwrap_or_else(|| "/media/".to_string()),
            admin_token: lookup("ADMIN_TOKEN").filter(|t| !t.is_empty()),
            smtp_timeout: Duration::from_secs(smtp_timeout_secs),
            captcha_verify_url: lookup("CAPTCHA_VERIFY_URL")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| RECAPTCHA_VERIFY_URL.to_string()),
            log_format: lookup("LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or(LogFormat::Pretty),
        })
    }
}
