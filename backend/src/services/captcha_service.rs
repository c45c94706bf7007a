//! reCAPTCHA v2 verification for public form submissions.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::form_submission::{FormData, CAPTCHA_FIELD_NAME};
use crate::models::site_setting::SiteSetting;

pub const RECAPTCHA_VERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";

/// Checks a captcha response token with the provider.
#[async_trait]
pub trait CaptchaVerifier: Send + Sync {
    /// `Ok(false)` means the provider rejected the token. `Err` means it
    /// could not be asked.
    async fn verify(&self, secret: &str, token: &str) -> Result<bool>;
}

#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

/// Google's `siteverify` endpoint over HTTPS.
pub struct ReCaptchaVerifier {
    client: reqwest::Client,
    verify_url: String,
}

impl ReCaptchaVerifier {
    pub fn new(verify_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            verify_url: verify_url.into(),
        })
    }
}

#[async_trait]
impl CaptchaVerifier for ReCaptchaVerifier {
    async fn verify(&self, secret: &str, token: &str) -> Result<bool> {
        let response: SiteVerifyResponse = self
            .client
            .post(&self.verify_url)
            .form(&[("secret", secret), ("response", token)])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::Captcha(e.to_string()))?
            .json()
            .await
            .map_err(|e| AppError::Captcha(format!("unreadable siteverify response: {}", e)))?;

        if !response.success {
            tracing::info!(errors = ?response.error_codes, "Captcha token rejected");
        }
        Ok(response.success)
    }
}

/// Require a verified captcha when both keys are configured.
///
/// Without a settings record, or with either key blank, forms carry no
/// captcha and every submission passes.
pub async fn check_captcha(
    settings: Option<&SiteSetting>,
    data: &FormData,
    verifier: &dyn CaptchaVerifier,
) -> Result<()> {
    let Some(settings) = settings.filter(|s| s.captcha_enabled()) else {
        return Ok(());
    };

    let token = data
        .get(CAPTCHA_FIELD_NAME)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Validation("Please complete the captcha".to_string()))?;

    if verifier.verify(&settings.captcha_secret_key, token).await? {
        Ok(())
    } else {
        Err(AppError::Validation(
            "Captcha verification failed, please try again".to_string(),
        ))
    }
}
