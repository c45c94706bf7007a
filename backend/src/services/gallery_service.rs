//! Gallery image selection, ordering and pagination.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use sqlx::PgPool;

use crate::error::{AppError, Result};
use crate::models::image::{GalleryPage, GalleryPageRow, ImageAsset, ImageOrdering};

/// Source of gallery pages and their image assets.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Gallery page configuration by slug; `NotFound` when there is none.
    async fn get_gallery(&self, slug: &str) -> Result<GalleryPage>;

    /// All images whose collection name matches exactly, in storage order.
    async fn list_by_collection(&self, collection_name: &str) -> Result<Vec<ImageAsset>>;
}

/// Postgres-backed images and gallery page configuration.
pub struct ImageService {
    db: PgPool,
}

impl ImageService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ImageStore for ImageService {
    async fn get_gallery(&self, slug: &str) -> Result<GalleryPage> {
        let row: Option<GalleryPageRow> = sqlx::query_as(
            r#"
            SELECT g.id, g.slug, g.title, g.intro_title, g.intro_text,
                   c.name AS collection_name, g.images_per_page, g.use_lightbox,
                   g.order_images_by
            FROM gallery_pages g
            LEFT JOIN collections c ON c.id = g.collection_id
            WHERE g.slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        row.map(GalleryPage::from)
            .ok_or_else(|| AppError::NotFound(format!("Gallery '{}' not found", slug)))
    }

    async fn list_by_collection(&self, collection_name: &str) -> Result<Vec<ImageAsset>> {
        let images: Vec<ImageAsset> = sqlx::query_as(
            r#"
            SELECT i.id, i.title, i.file, c.name AS collection_name, i.created_at
            FROM images i
            JOIN collections c ON c.id = i.collection_id
            WHERE c.name = $1
            "#,
        )
        .bind(collection_name)
        .fetch_all(&self.db)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(images)
    }
}

pub struct GalleryResolver {
    images: Arc<dyn ImageStore>,
}

impl GalleryResolver {
    pub fn new(images: Arc<dyn ImageStore>) -> Self {
        Self { images }
    }

    /// Images of a collection in the gallery's display order.
    ///
    /// Lookup errors are logged and returned; page handlers render an empty
    /// gallery instead of failing.
    pub async fn images_for(
        &self,
        collection_name: &str,
        ordering: ImageOrdering,
    ) -> Result<Vec<ImageAsset>> {
        let mut images = self
            .images
            .list_by_collection(collection_name)
            .await
            .inspect_err(|e| {
                metrics::counter!("gallery_lookup_failures_total").increment(1);
                tracing::warn!(
                    collection = %collection_name,
                    error = %e,
                    "Gallery image lookup failed"
                );
            })?;
        sort_images(&mut images, ordering);
        Ok(images)
    }
}

/// Stable sort, so ties keep storage order.
pub fn sort_images(images: &mut [ImageAsset], ordering: ImageOrdering) {
    match ordering {
        ImageOrdering::ByTitleDesc => images.sort_by(|a, b| b.title.cmp(&a.title)),
        ImageOrdering::ByCreatedDesc => images.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    }
}

/// One page of a paginated list plus what a caller needs to render controls.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number actually returned.
    pub number: usize,
    pub num_pages: usize,
    /// Total items across all pages.
    pub count: usize,
    pub per_page: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            count: self.count,
            per_page: self.per_page,
            has_next: self.has_next,
            has_previous: self.has_previous,
        }
    }
}

/// Slice `items` into the page named by a raw `?page=` value.
///
/// Missing, non-numeric and below-1 values give page 1. Values past the end
/// give the last page. An empty list still has one (empty) page.
pub fn paginate<T>(items: Vec<T>, page_size: usize, requested_page: Option<&str>) -> Page<T> {
    let per_page = page_size.max(1);
    let count = items.len();
    let num_pages = count.div_ceil(per_page).max(1);

    let number = requested_page
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .filter(|n| *n >= 1)
        .map(|n| usize::try_from(n).unwrap_or(usize::MAX).min(num_pages))
        .unwrap_or(1);

    let start = (number - 1) * per_page;
    let items: Vec<T> = items.into_iter().skip(start).take(per_page).collect();

    Page {
        items,
        number,
        num_pages,
        count,
        per_page,
        has_next: number < num_pages,
        has_previous: number > 1,
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory image stores used by service and handler tests.

    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    use crate::models::image::DEFAULT_IMAGES_PER_PAGE;

    pub fn image(title: &str, collection: &str, minutes: i64) -> ImageAsset {
        ImageAsset {
            id: Uuid::new_v4(),
            title: title.to_string(),
            file: format!("original_images/{}.jpg", title.to_lowercase()),
            collection_name: collection.to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
                + Duration::minutes(minutes),
        }
    }

    pub fn gallery(slug: &str, collection: Option<&str>) -> GalleryPage {
        GalleryPage {
            id: Uuid::new_v4(),
            slug: slug.to_string(),
            title: slug.to_string(),
            intro_title: String::new(),
            intro_text: String::new(),
            collection_name: collection.map(str::to_string),
            images_per_page: DEFAULT_IMAGES_PER_PAGE,
            use_lightbox: true,
            order_images_by: ImageOrdering::ByTitleDesc,
        }
    }

    #[derive(Default)]
    pub struct MemoryImages {
        pub galleries: Vec<GalleryPage>,
        pub images: Vec<ImageAsset>,
    }

    impl MemoryImages {
        pub fn new(images: Vec<ImageAsset>) -> Self {
            Self {
                galleries: Vec::new(),
                images,
            }
        }
    }

    #[async_trait]
    impl ImageStore for MemoryImages {
        async fn get_gallery(&self, slug: &str) -> Result<GalleryPage> {
            self.galleries
                .iter()
                .find(|g| g.slug == slug)
                .cloned()
                .ok_or_else(|| AppError::NotFound(format!("Gallery '{}' not found", slug)))
        }

        async fn list_by_collection(&self, collection_name: &str) -> Result<Vec<ImageAsset>> {
            Ok(self
                .images
                .iter()
                .filter(|i| i.collection_name == collection_name)
                .cloned()
                .collect())
        }
    }

    /// Gallery pages resolve; every image query fails.
    #[derive(Default)]
    pub struct BrokenImages {
        pub galleries: Vec<GalleryPage>,
    }

    #[async_trait]
    impl ImageStore for BrokenImages {
        async fn get_gallery(&self, slug: &str) -> Result<GalleryPage> {
            self.galleries
                .iter()
                .find(|g| g.slug == slug)
                .cloned()
                .ok_or_else(|| AppError::NotFound(format!("Gallery '{}' not found", slug)))
        }

        async fn list_by_collection(&self, _collection_name: &str) -> Result<Vec<ImageAsset>> {
            Err(AppError::Database("relation \"images\" does not exist".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use std::collections::HashMap;
    use uuid::Uuid;

    fn resolver() -> GalleryResolver {
        GalleryResolver::new(Arc::new(MemoryImages::new(vec![
            image("Apple", "Summer", 30),
            image("Zebra", "Summer", 10),
            image("Mango", "Summer", 20),
            image("Yeti", "Winter", 40),
        ])))
    }

    fn titles(images: &[ImageAsset]) -> Vec<&str> {
        images.iter().map(|i| i.title.as_str()).collect()
    }

    // -----------------------------------------------------------------------
    // images_for
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_title_descending() {
        let images = resolver()
            .images_for("Summer", ImageOrdering::ByTitleDesc)
            .await
            .unwrap();
        assert_eq!(titles(&images), vec!["Zebra", "Mango", "Apple"]);
    }

    #[tokio::test]
    async fn test_newest_first() {
        let images = resolver()
            .images_for("Summer", ImageOrdering::ByCreatedDesc)
            .await
            .unwrap();
        assert_eq!(titles(&images), vec!["Apple", "Mango", "Zebra"]);
    }

    #[tokio::test]
    async fn test_exact_collection_match() {
        let images = resolver()
            .images_for("summer", ImageOrdering::ByTitleDesc)
            .await
            .unwrap();
        assert!(images.is_empty());
    }

    #[tokio::test]
    async fn test_lookup_failure_is_reported() {
        let resolver = GalleryResolver::new(Arc::new(BrokenImages::default()));
        let result = resolver.images_for("Summer", ImageOrdering::ByTitleDesc).await;
        assert!(matches!(result, Err(AppError::Database(_))));
    }

    #[test]
    fn test_title_sort_is_lexicographic() {
        let mut images = vec![
            image("[0002] Dog", "S", 0),
            image("[0010] Cat", "S", 0),
            image("b", "S", 0),
            image("B", "S", 0),
        ];
        sort_images(&mut images, ImageOrdering::ByTitleDesc);
        assert_eq!(titles(&images), vec!["b", "[0010] Cat", "[0002] Dog", "B"]);
    }

    #[test]
    fn test_sort_is_stable_for_ties() {
        let mut images = vec![image("Same", "S", 0), image("Same", "S", 0)];
        let ids: Vec<Uuid> = images.iter().map(|i| i.id).collect();
        sort_images(&mut images, ImageOrdering::ByTitleDesc);
        assert_eq!(images.iter().map(|i| i.id).collect::<Vec<_>>(), ids);
    }

    // -----------------------------------------------------------------------
    // paginate
    // -----------------------------------------------------------------------

    fn fifty() -> Vec<u32> {
        (1..=50).collect()
    }

    #[test]
    fn test_last_partial_page() {
        let page = paginate(fifty(), 24, Some("3"));
        assert_eq!(page.items, vec![49, 50]);
        assert_eq!(page.number, 3);
        assert_eq!(page.num_pages, 3);
        assert_eq!(page.count, 50);
        assert!(!page.has_next);
        assert!(page.has_previous);
    }

    #[test]
    fn test_middle_page() {
        let page = paginate(fifty(), 24, Some("2"));
        assert_eq!(page.items.first(), Some(&25));
        assert_eq!(page.items.len(), 24);
        assert!(page.has_next && page.has_previous);
    }

    #[test]
    fn test_fallbacks_to_first_page() {
        let cases: HashMap<&str, Option<&str>> = HashMap::from([
            ("absent", None),
            ("non-numeric", Some("abc")),
            ("zero", Some("0")),
            ("negative", Some("-2")),
            ("empty", Some("")),
            ("fractional", Some("1.5")),
        ]);
        for (label, raw) in cases {
            let page = paginate(fifty(), 24, raw);
            assert_eq!(page.number, 1, "{label}");
            assert_eq!(page.items.first(), Some(&1), "{label}");
        }
    }

    #[test]
    fn test_past_end_gives_last_page() {
        for raw in ["4", "99", "9223372036854775807"] {
            let page = paginate(fifty(), 24, Some(raw));
            assert_eq!(page.number, 3, "{raw}");
            assert_eq!(page.items, vec![49, 50]);
        }
    }

    #[test]
    fn test_whitespace_around_number() {
        assert_eq!(paginate(fifty(), 24, Some(" 2 ")).number, 2);
    }

    #[test]
    fn test_empty_list_has_one_empty_page() {
        let page = paginate(Vec::<u32>::new(), 24, Some("5"));
        assert_eq!(page.number, 1);
        assert_eq!(page.num_pages, 1);
        assert!(page.items.is_empty());
        assert!(!page.has_next && !page.has_previous);
    }

    #[test]
    fn test_exact_multiple_of_page_size() {
        let page = paginate((1..=48).collect::<Vec<u32>>(), 24, Some("99"));
        assert_eq!(page.num_pages, 2);
        assert_eq!(page.items.len(), 24);
    }

    #[test]
    fn test_zero_page_size_treated_as_one() {
        let page = paginate(vec![1, 2, 3], 0, Some("2"));
        assert_eq!(page.per_page, 1);
        assert_eq!(page.items, vec![2]);
        assert_eq!(page.num_pages, 3);
    }

    #[test]
    fn test_map_keeps_metadata() {
        let page = paginate(fifty(), 24, Some("3")).map(|n| n.to_string());
        assert_eq!(page.items, vec!["49".to_string(), "50".to_string()]);
        assert_eq!(page.num_pages, 3);
    }
}
