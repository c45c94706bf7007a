//! Outgoing mail: transport configuration from site settings and SMTP delivery.
//!
//! SMTP credentials are read from the site settings record each time a
//! dispatcher is built, so an administrator can change them without a
//! restart. Any field can be overridden per dispatcher.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::site_setting::{validate_security_mode, SiteSetting};
use crate::services::settings_service::SettingsStore;

/// Sender placeholder meaning "no sender was set explicitly".
pub const DEFAULT_FROM_EMAIL: &str = "webmaster@localhost";

const DEFAULT_SMTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-field overrides applied on top of the stored settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransportOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub use_tls: Option<bool>,
    pub use_ssl: Option<bool>,
}

/// Everything needed to open an SMTP connection.
#[derive(Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// STARTTLS after connecting.
    pub use_tls: bool,
    /// TLS from the first byte (SMTPS).
    pub use_ssl: bool,
}

impl std::fmt::Debug for TransportConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("use_tls", &self.use_tls)
            .field("use_ssl", &self.use_ssl)
            .finish()
    }
}

/// Merge overrides over the stored settings, field by field.
pub fn resolve_transport_config(
    settings: Option<&SiteSetting>,
    overrides: &TransportOverrides,
) -> Result<TransportConfig> {
    let settings = settings.ok_or_else(|| {
        AppError::Config("no site settings record; mail transport is not configured".to_string())
    })?;

    let port = match overrides.port {
        Some(port) => port,
        None => u16::try_from(settings.email_port).map_err(|_| {
            AppError::Config(format!("stored email port {} is invalid", settings.email_port))
        })?,
    };

    let config = TransportConfig {
        host: overrides
            .host
            .clone()
            .unwrap_or_else(|| settings.email_host.clone()),
        port,
        username: overrides
            .username
            .clone()
            .unwrap_or_else(|| settings.email_host_user.clone()),
        password: overrides
            .password
            .clone()
            .unwrap_or_else(|| settings.email_host_password.clone()),
        use_tls: overrides.use_tls.unwrap_or(settings.email_use_tls),
        use_ssl: overrides.use_ssl.unwrap_or(settings.email_use_ssl),
    };

    // Overrides can combine with a valid record into an invalid mode.
    validate_security_mode(config.use_tls, config.use_ssl)?;
    Ok(config)
}

/// A message before it is handed to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub from_email: String,
    pub to: Vec<String>,
    pub subject: String,
    /// Plain-text part.
    pub body: String,
    /// HTML alternative, if any.
    pub html: Option<String>,
}

impl OutgoingMessage {
    /// New message with the placeholder sender.
    pub fn new(subject: impl Into<String>, to: Vec<String>) -> Self {
        Self {
            from_email: DEFAULT_FROM_EMAIL.to_string(),
            to,
            subject: subject.into(),
            body: String::new(),
            html: None,
        }
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Build the RFC 5322 message.
    pub fn to_lettre(&self) -> Result<Message> {
        if self.to.is_empty() {
            return Err(AppError::Mail("message has no recipients".to_string()));
        }

        let from: Mailbox = self.from_email.parse()?;
        let mut builder = Message::builder().from(from).subject(self.subject.as_str());
        for to in &self.to {
            let mailbox: Mailbox = to.parse()?;
            builder = builder.to(mailbox);
        }

        let message = match &self.html {
            Some(html) => builder.multipart(MultiPart::alternative_plain_html(
                self.body.clone(),
                html.clone(),
            ))?,
            None => builder
                .header(ContentType::TEXT_PLAIN)
                .body(self.body.clone())?,
        };
        Ok(message)
    }
}

/// Delivers a message over a resolved transport configuration.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn deliver(&self, config: &TransportConfig, message: &OutgoingMessage) -> Result<()>;
}

/// SMTP delivery through lettre. A connection is opened per message.
pub struct SmtpMailTransport {
    timeout: Duration,
}

impl SmtpMailTransport {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn build(&self, config: &TransportConfig) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
        if config.host.is_empty() {
            return Err(AppError::Mail("mail host is not configured".to_string()));
        }

        let builder = if config.use_ssl {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
        } else if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };

        let mut builder = builder.port(config.port).timeout(Some(self.timeout));
        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }
        Ok(builder.build())
    }
}

impl Default for SmtpMailTransport {
    fn default() -> Self {
        Self::new(DEFAULT_SMTP_TIMEOUT)
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn deliver(&self, config: &TransportConfig, message: &OutgoingMessage) -> Result<()> {
        let email = message.to_lettre()?;
        let transport = self.build(config)?;
        let response = transport.send(email).await?;
        tracing::debug!(
            host = %config.host,
            port = config.port,
            code = %response.code(),
            "SMTP server accepted message"
        );
        Ok(())
    }
}

/// Sends mail using the transport settings that were current at construction.
pub struct MailDispatcher {
    config: TransportConfig,
    sender: Option<String>,
    transport: Arc<dyn MailTransport>,
}

impl MailDispatcher {
    /// Build from an already-fetched settings record.
    pub fn from_settings(
        settings: Option<&SiteSetting>,
        overrides: &TransportOverrides,
        transport: Arc<dyn MailTransport>,
    ) -> Result<Self> {
        let config = resolve_transport_config(settings, overrides)?;
        let sender = settings
            .and_then(|s| s.email_sender.clone())
            .filter(|s| !s.trim().is_empty());
        Ok(Self {
            config,
            sender,
            transport,
        })
    }

    /// Read the settings record now and build a dispatcher from it.
    pub async fn connect(
        store: &dyn SettingsStore,
        overrides: &TransportOverrides,
        transport: Arc<dyn MailTransport>,
    ) -> Result<Self> {
        let settings = store.fetch().await?;
        Self::from_settings(settings.as_ref(), overrides, transport)
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Swap the placeholder sender for the configured one.
    ///
    /// Only the exact placeholder is replaced; an explicit sender (even an
    /// empty one) is left alone, as is the placeholder when no sender is configured.
    pub fn before_send(&self, message: &mut OutgoingMessage) {
        if message.from_email == DEFAULT_FROM_EMAIL {
            if let Some(sender) = &self.sender {
                message.from_email = sender.clone();
            }
        }
    }

    pub async fn send(&self, mut message: OutgoingMessage) -> Result<()> {
        self.before_send(&mut message);
        self.transport.deliver(&self.config, &message).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Records every delivery; optionally fails each one.
    #[derive(Default)]
    pub struct RecordingTransport {
        pub sent: Mutex<Vec<(TransportConfig, OutgoingMessage)>>,
        pub fail_with: Option<String>,
    }

    impl RecordingTransport {
        pub fn failing(reason: &str) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail_with: Some(reason.to_string()),
            }
        }

        pub fn messages(&self) -> Vec<OutgoingMessage> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .map(|(_, m)| m.clone())
                .collect()
        }
    }

    #[async_trait]
    impl MailTransport for RecordingTransport {
        async fn deliver(
            &self,
            config: &TransportConfig,
            message: &OutgoingMessage,
        ) -> Result<()> {
            if let Some(reason) = &self.fail_with {
                return Err(AppError::Mail(reason.clone()));
            }
            // Same validation a real send would hit.
            message.to_lettre()?;
            self.sent
                .lock()
                .unwrap()
                .push((config.clone(), message.clone()));
            Ok(())
        }
    }
}
