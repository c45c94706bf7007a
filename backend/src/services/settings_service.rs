//! Site settings persistence.
//!
//! The settings table is expected to hold a single row. Readers always take
//! the first one; writers update it in place or create it if missing.

use async_trait::async_trait;
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::{PgPool, Postgres};

use crate::error::{AppError, Result};
use crate::models::site_setting::{SiteSetting, SiteSettingUpdate};

const SETTING_COLUMNS: &str = r#"
    id, email_host, email_port, email_host_user, email_host_password,
    email_use_tls, email_use_ssl, email_sender, owner_mail,
    captcha_site_key, captcha_secret_key, facebook_page_id, using_messenger,
    whatsapp_id, using_whatsapp, custom_css, updated_at
"#;

/// Access to the settings record.
///
/// Consumers receive this as a dependency rather than querying a global.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Fetch the settings record, if one has been created.
    async fn fetch(&self) -> Result<Option<SiteSetting>>;

    /// Validate and store the settings record, creating it on first save.
    async fn save(&self, update: &SiteSettingUpdate) -> Result<SiteSetting>;
}

pub struct SettingsService {
    db: PgPool,
}

impl SettingsService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn upsert(&self, update: &SiteSettingUpdate) -> Result<SiteSetting> {
        update.validate()?;

        let mut tx = self.db.begin().await?;

        let existing: Option<i32> =
            sqlx::query_scalar("SELECT id FROM site_settings ORDER BY id LIMIT 1 FOR UPDATE")
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

        let setting: SiteSetting = match existing {
            Some(id) => {
                let sql = format!(
                    r#"
                    UPDATE site_settings SET
                        email_host = $2, email_port = $3, email_host_user = $4,
                        email_host_password = $5, email_use_tls = $6, email_use_ssl = $7,
                        email_sender = $8, owner_mail = $9, captcha_site_key = $10,
                        captcha_secret_key = $11, facebook_page_id = $12, using_messenger = $13,
                        whatsapp_id = $14, using_whatsapp = $15, custom_css = $16,
                        updated_at = NOW()
                    WHERE id = $1
                    RETURNING {SETTING_COLUMNS}
                    "#
                );
                bind_update(sqlx::query_as(&sql).bind(id), update)
                    .fetch_one(&mut *tx)
                    .await
            }
            None => {
                let sql = format!(
                    r#"
                    INSERT INTO site_settings (
                        email_host, email_port, email_host_user, email_host_password,
                        email_use_tls, email_use_ssl, email_sender, owner_mail,
                        captcha_site_key, captcha_secret_key, facebook_page_id, using_messenger,
                        whatsapp_id, using_whatsapp, custom_css
                    )
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
                    RETURNING {SETTING_COLUMNS}
                    "#
                );
                bind_update(sqlx::query_as(&sql), update)
                    .fetch_one(&mut *tx)
                    .await
            }
        }
        .map_err(|e| AppError::Database(e.to_string()))?;

        tx.commit().await?;

        tracing::info!(
            setting_id = setting.id,
            created = existing.is_none(),
            "Site settings saved"
        );
        Ok(setting)
    }
}

/// Bind the update's columns in table order, after any already-bound parameters.
fn bind_update<'q>(
    query: QueryAs<'q, Postgres, SiteSetting, PgArguments>,
    update: &'q SiteSettingUpdate,
) -> QueryAs<'q, Postgres, SiteSetting, PgArguments> {
    query
        .bind(&update.email_host)
        .bind(update.email_port)
        .bind(&update.email_host_user)
        .bind(&update.email_host_password)
        .bind(update.email_use_tls)
        .bind(update.email_use_ssl)
        .bind(&update.email_sender)
        .bind(&update.owner_mail)
        .bind(&update.captcha_site_key)
        .bind(&update.captcha_secret_key)
        .bind(&update.facebook_page_id)
        .bind(update.using_messenger)
        .bind(&update.whatsapp_id)
        .bind(update.using_whatsapp)
        .bind(&update.custom_css)
}

#[async_trait]
impl SettingsStore for SettingsService {
    async fn fetch(&self) -> Result<Option<SiteSetting>> {
        let sql = format!("SELECT {SETTING_COLUMNS} FROM site_settings ORDER BY id LIMIT 1");
        let setting: Option<SiteSetting> = sqlx::query_as(&sql)
            .fetch_optional(&self.db)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(setting)
    }

    async fn save(&self, update: &SiteSettingUpdate) -> Result<SiteSetting> {
        self.upsert(update).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory stand-ins used by service tests.

    use super::*;
    use chrono::Utc;

    pub fn sample_setting() -> SiteSetting {
        SiteSetting {
            id: 1,
            email_host: "smtp.example.com".into(),
            email_port: 465,
            email_host_user: "mailer".into(),
            email_host_password: "s3cret".into(),
            email_use_tls: false,
            email_use_ssl: true,
            email_sender: Some("Example Site <site@example.com>".into()),
            owner_mail: "owner@example.com".into(),
            captcha_site_key: String::new(),
            captcha_secret_key: String::new(),
            facebook_page_id: String::new(),
            using_messenger: true,
            whatsapp_id: String::new(),
            using_whatsapp: true,
            custom_css: None,
            updated_at: Utc::now(),
        }
    }

    /// The record a successful save of `update` would produce.
    pub fn setting_from_update(id: i32, update: &SiteSettingUpdate) -> SiteSetting {
        SiteSetting {
            id,
            email_host: update.email_host.clone(),
            email_port: update.email_port,
            email_host_user: update.email_host_user.clone(),
            email_host_password: update.email_host_password.clone(),
            email_use_tls: update.email_use_tls,
            email_use_ssl: update.email_use_ssl,
            email_sender: update.email_sender.clone(),
            owner_mail: update.owner_mail.clone(),
            captcha_site_key: update.captcha_site_key.clone(),
            captcha_secret_key: update.captcha_secret_key.clone(),
            facebook_page_id: update.facebook_page_id.clone(),
            using_messenger: update.using_messenger,
            whatsapp_id: update.whatsapp_id.clone(),
            using_whatsapp: update.using_whatsapp,
            custom_css: update.custom_css.clone(),
            updated_at: Utc::now(),
        }
    }

    /// Returns a fixed record (or none). Saves validate but are not kept.
    pub struct StaticSettings(pub Option<SiteSetting>);

    #[async_trait]
    impl SettingsStore for StaticSettings {
        async fn fetch(&self) -> Result<Option<SiteSetting>> {
            Ok(self.0.clone())
        }

        async fn save(&self, update: &SiteSettingUpdate) -> Result<SiteSetting> {
            update.validate()?;
            let id = self.0.as_ref().map_or(1, |s| s.id);
            Ok(setting_from_update(id, update))
        }
    }

    /// Simulates an unreachable database.
    pub struct BrokenSettings;

    #[async_trait]
    impl SettingsStore for BrokenSettings {
        async fn fetch(&self) -> Result<Option<SiteSetting>> {
            Err(AppError::Database("connection refused".into()))
        }

        async fn save(&self, _update: &SiteSettingUpdate) -> Result<SiteSetting> {
            Err(AppError::Database("connection refused".into()))
        }
    }
}
