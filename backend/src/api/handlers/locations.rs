//! Location markers for the map widget.

use axum::{
    extract::State,
    http::header::CONTENT_TYPE,
    response::IntoResponse,
    routing::get,
    Router,
};
use utoipa::OpenApi;

use crate::api::SharedState;
use crate::error::Result;
use crate::models::location::LocationMarker;
use crate::services::location_service::LocationService;
use crate::services::template_helpers::location_markers_json;

#[derive(OpenApi)]
#[openapi(paths(list_locations), components(schemas(LocationMarker)))]
pub struct LocationsApiDoc;

pub fn router() -> Router<SharedState> {
    Router::new().route("/", get(list_locations))
}

/// GET /api/v1/locations
#[utoipa::path(
    get,
    path = "",
    context_path = "/api/v1/locations",
    tag = "locations",
    operation_id = "list_locations",
    responses((status = 200, description = "All location markers", body = [LocationMarker])),
)]
pub async fn list_locations(State(state): State<SharedState>) -> Result<impl IntoResponse> {
    let markers = LocationService::new(state.db.clone()).list().await?;
    let body = location_markers_json(&markers)?;
    Ok(([(CONTENT_TYPE, "application/json")], body))
}
