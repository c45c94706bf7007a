//! Sitecraft backend: site settings, settings-driven mail delivery, contact
//! form notifications and image galleries for a small content site.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
