//! Database models (SQLx).

pub mod form_submission;
pub mod image;
pub mod location;
pub mod site_setting;
