//! Business services.

pub mod captcha_service;
pub mod form_service;
pub mod gallery_service;
pub mod location_service;
pub mod mail_service;
pub mod notification_service;
pub mod settings_service;
pub mod template_helpers;
