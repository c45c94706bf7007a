//! Image assets and the gallery pages that display them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub const DEFAULT_IMAGES_PER_PAGE: i32 = 24;

/// An uploaded image. Every image belongs to exactly one collection.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct ImageAsset {
    pub id: Uuid,
    pub title: String,
    /// Storage path relative to the media root, e.g. `original_images/cat.jpg`.
    pub file: String,
    pub collection_name: String,
    pub created_at: DateTime<Utc>,
}

/// How a gallery orders its images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ImageOrdering {
    /// Title, descending. A `[0004]` prefix in titles gives manual ordering.
    #[default]
    ByTitleDesc,
    /// Newest image first.
    ByCreatedDesc,
}

impl ImageOrdering {
    /// Stored column value.
    pub fn code(self) -> i16 {
        match self {
            Self::ByTitleDesc => 1,
            Self::ByCreatedDesc => 2,
        }
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(Self::ByTitleDesc),
            2 => Some(Self::ByCreatedDesc),
            _ => None,
        }
    }
}

/// Gallery page configuration row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GalleryPageRow {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub intro_title: String,
    pub intro_text: String,
    pub collection_name: Option<String>,
    pub images_per_page: i32,
    pub use_lightbox: bool,
    pub order_images_by: i16,
}

/// Gallery configuration as the rest of the service sees it.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GalleryPage {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub intro_title: String,
    pub intro_text: String,
    /// The collection may have been deleted, leaving the gallery empty.
    pub collection_name: Option<String>,
    pub images_per_page: i32,
    pub use_lightbox: bool,
    pub order_images_by: ImageOrdering,
}

impl From<GalleryPageRow> for GalleryPage {
    fn from(row: GalleryPageRow) -> Self {
        let order_images_by = ImageOrdering::from_code(row.order_images_by).unwrap_or_else(|| {
            tracing::warn!(
                gallery = %row.slug,
                code = row.order_images_by,
                "Unknown image ordering code, using title ordering"
            );
            ImageOrdering::default()
        });
        Self {
            id: row.id,
            slug: row.slug,
            title: row.title,
            intro_title: row.intro_title,
            intro_text: row.intro_text,
            collection_name: row.collection_name,
            images_per_page: row.images_per_page,
            use_lightbox: row.use_lightbox,
            order_images_by,
        }
    }
}

/// Image as rendered in a gallery listing.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GalleryImageView {
    pub id: Uuid,
    /// Title with any `[NNNN]` sort prefix removed.
    pub title: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(code: i16) -> GalleryPageRow {
        GalleryPageRow {
            id: Uuid::nil(),
            slug: "summer".into(),
            title: "Summer".into(),
            intro_title: String::new(),
            intro_text: String::new(),
            collection_name: Some("Summer".into()),
            images_per_page: DEFAULT_IMAGES_PER_PAGE,
            use_lightbox: true,
            order_images_by: code,
        }
    }

    #[test]
    fn test_ordering_codes() {
        assert_eq!(ImageOrdering::from_code(1), Some(ImageOrdering::ByTitleDesc));
        assert_eq!(ImageOrdering::from_code(2), Some(ImageOrdering::ByCreatedDesc));
        assert_eq!(ImageOrdering::from_code(3), None);
        assert_eq!(ImageOrdering::ByCreatedDesc.code(), 2);
    }

    #[test]
    fn test_row_conversion() {
        let page: GalleryPage = row(2).into();
        assert_eq!(page.order_images_by, ImageOrdering::ByCreatedDesc);
        assert_eq!(page.collection_name.as_deref(), Some("Summer"));
    }

    #[test]
    fn test_unknown_code_falls_back_to_title() {
        let page: GalleryPage = row(9).into();
        assert_eq!(page.order_images_by, ImageOrdering::ByTitleDesc);
    }

    #[test]
    fn test_ordering_serializes_snake_case() {
        let json = serde_json::to_string(&ImageOrdering::ByCreatedDesc).unwrap();
        assert_eq!(json, "\"by_created_desc\"");
    }
}
