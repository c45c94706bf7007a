//! Location markers shown on the site map.

use sqlx::PgPool;

use crate::error::{AppError, Result};
use crate::models::location::LocationMarker;

pub struct LocationService {
    db: PgPool,
}

impl LocationService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<LocationMarker>> {
        let markers: Vec<LocationMarker> = sqlx::query_as(
            r#"
            SELECT id, location, latitude, longitude, tel, description, link
            FROM location_markers
            ORDER BY id
            "#,
        )
        .fetch_all(&self.db)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(markers)
    }
}
