//! HTTP API: shared state and router assembly.

pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod validation;

use std::sync::Arc;

use axum::{middleware::from_fn_with_state, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::Result;
use crate::services::captcha_service::{CaptchaVerifier, ReCaptchaVerifier};
use crate::services::form_service::{FormSubmissionService, PgSubmissionStore, SubmissionStore};
use crate::services::gallery_service::{GalleryResolver, ImageService, ImageStore};
use crate::services::mail_service::{MailTransport, SmtpMailTransport};
use crate::services::notification_service::SubmissionNotifier;
use crate::services::settings_service::{SettingsService, SettingsStore};

/// Everything handlers need. Collaborators sit behind traits so tests can
/// swap them out.
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    pub settings: Arc<dyn SettingsStore>,
    pub images: Arc<dyn ImageStore>,
    pub submissions: Arc<dyn SubmissionStore>,
    pub mail_transport: Arc<dyn MailTransport>,
    pub captcha: Arc<dyn CaptchaVerifier>,
    pub metrics: Option<PrometheusHandle>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Production wiring: Postgres stores, SMTP delivery and reCAPTCHA.
    pub fn new(db: PgPool, config: Config, metrics: Option<PrometheusHandle>) -> Result<Self> {
        let mail_transport: Arc<dyn MailTransport> =
            Arc::new(SmtpMailTransport::new(config.smtp_timeout));
        let captcha: Arc<dyn CaptchaVerifier> = Arc::new(ReCaptchaVerifier::new(
            config.captcha_verify_url.clone(),
            config.smtp_timeout,
        )?);
        Ok(Self {
            settings: Arc::new(SettingsService::new(db.clone())),
            images: Arc::new(ImageService::new(db.clone())),
            submissions: Arc::new(PgSubmissionStore::new(db.clone())),
            mail_transport,
            captcha,
            db,
            config,
            metrics,
        })
    }

    pub fn notifier(&self) -> SubmissionNotifier {
        SubmissionNotifier::new(self.settings.clone(), self.mail_transport.clone())
    }

    pub fn form_service(&self) -> FormSubmissionService {
        FormSubmissionService::new(
            self.submissions.clone(),
            self.settings.clone(),
            self.captcha.clone(),
            self.notifier(),
        )
    }

    pub fn gallery_resolver(&self) -> GalleryResolver {
        GalleryResolver::new(self.images.clone())
    }
}

pub fn router(state: SharedState) -> Router {
    let admin = Router::new()
        .nest("/settings", handlers::settings::router())
        .route_layer(from_fn_with_state(state.clone(), middleware::admin::admin_guard));

    Router::new()
        .merge(handlers::health::router())
        .nest("/api/v1/admin", admin)
        .nest("/api/v1/forms", handlers::forms::router())
        .nest("/api/v1/galleries", handlers::galleries::router())
        .nest("/api/v1/locations", handlers::locations::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
