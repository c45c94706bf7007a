//! Gallery page API handlers.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

use crate::api::SharedState;
use crate::error::Result;
use crate::models::image::{GalleryImageView, GalleryPage, ImageAsset};
use crate::services::gallery_service::{paginate, Page};
use crate::services::template_helpers::{hide_num_order, original_url};

#[derive(OpenApi)]
#[openapi(
    paths(get_gallery),
    components(schemas(GalleryResponse, GalleryPage, GalleryImageView))
)]
pub struct GalleriesApiDoc;

pub fn router() -> Router<SharedState> {
    Router::new().route("/:slug", get(get_gallery))
}

#[derive(Debug, Deserialize)]
pub struct GalleryQuery {
    /// Raw page number; anything unusable falls back to a valid page.
    pub page: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GalleryResponse {
    pub gallery: GalleryPage,
    #[schema(value_type = Object)]
    pub images: Page<GalleryImageView>,
}

/// GET /api/v1/galleries/:slug
#[utoipa::path(
    get,
    path = "/{slug}",
    context_path = "/api/v1/galleries",
    tag = "galleries",
    operation_id = "get_gallery",
    params(
        ("slug" = String, Path, description = "Gallery page slug"),
        ("page" = Option<String>, Query, description = "1-based page number"),
    ),
    responses(
        (status = 200, description = "Gallery with one page of images", body = GalleryResponse),
        (status = 404, description = "Gallery not found", body = crate::api::openapi::ErrorResponse),
    ),
)]
pub async fn get_gallery(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
    Query(query): Query<GalleryQuery>,
) -> Result<Json<GalleryResponse>> {
    let gallery = state.images.get_gallery(&slug).await?;

    let images = match gallery.collection_name.as_deref() {
        // Lookup failures are logged by the resolver; show an empty gallery.
        Some(collection) => state
            .gallery_resolver()
            .images_for(collection, gallery.order_images_by)
            .await
            .unwrap_or_default(),
        None => Vec::new(),
    };

    let page_size = usize::try_from(gallery.images_per_page).unwrap_or(1);
    let media_url = state.config.media_url.as_str();
    let images = paginate(images, page_size, query.page.as_deref())
        .map(|image| image_view(media_url, image));

    Ok(Json(GalleryResponse { gallery, images }))
}

fn image_view(media_url: &str, image: ImageAsset) -> GalleryImageView {
    GalleryImageView {
        id: image.id,
        title: hide_num_order(&image.title),
        url: original_url(media_url, &image.file),
        created_at: image.created_at,
    }
}
