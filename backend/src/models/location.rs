//! Map location markers.

use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct LocationMarker {
    #[serde(skip_serializing)]
    pub id: i32,
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Phone number, `+1234567890` format.
    pub tel: String,
    /// Street address.
    pub description: String,
    pub link: Option<String>,
}
