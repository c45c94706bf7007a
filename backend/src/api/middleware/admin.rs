//! Bearer-token guard for admin routes.

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::api::SharedState;
use crate::error::AppError;

/// Rejects requests without `Authorization: Bearer <ADMIN_TOKEN>`.
/// With no token configured, every admin request is rejected.
pub async fn admin_guard(
    State(state): State<SharedState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    if token_matches(state.config.admin_token.as_deref(), presented) {
        return next.run(request).await;
    }

    tracing::warn!(
        path = %request.uri().path(),
        configured = state.config.admin_token.is_some(),
        "Rejected admin request"
    );
    AppError::Unauthorized("Admin token required".to_string()).into_response()
}

fn token_matches(expected: Option<&str>, presented: Option<&str>) -> bool {
    match (expected, presented) {
        // Digests have a fixed length, so the comparison leaks neither the
        // matching prefix nor the configured token's length.
        (Some(expected), Some(presented)) => {
            let expected = Sha256::digest(expected.as_bytes());
            let presented = Sha256::digest(presented.as_bytes());
            expected.as_slice().ct_eq(presented.as_slice()).into()
        }
        _ => false,
    }
}
