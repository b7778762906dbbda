//! Admin key check for review routes

use crate::handlers::ApiError;
use crate::state::AppState;
use axum::{
    Json, async_trait,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use portal_core::types::ErrorResponse;
use std::sync::Arc;
use tracing::warn;

/// Header carrying the admin key
pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// Proof that the request may use admin routes
///
/// When no `api.admin_key` is configured every request passes.
#[derive(Debug, Clone, Copy)]
pub struct AdminKey;

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminKey {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.config.api.admin_key.as_deref() else {
            return Ok(Self);
        };

        let presented = parts
            .headers
            .get(ADMIN_KEY_HEADER)
            .and_then(|value| value.to_str().ok());

        match presented {
            Some(key) if keys_match(key.as_bytes(), expected.as_bytes()) => Ok(Self),
            Some(_) => {
                warn!(path = %parts.uri.path(), "Rejected admin request with wrong key");
                Err(unauthorized())
            }
            None => {
                warn!(path = %parts.uri.path(), "Rejected admin request without key");
                Err(unauthorized())
            }
        }
    }
}

fn unauthorized() -> ApiError {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new("Valid admin key required", "UNAUTHORIZED")),
    )
}

/// Compare without stopping at the first differing byte
fn keys_match(presented: &[u8], expected: &[u8]) -> bool {
    presented.len() == expected.len()
        && presented
            .iter()
            .zip(expected)
            .fold(0_u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}
