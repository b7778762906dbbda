//! API route definitions

use crate::{extractors::AdminKey, handlers, state::AppState};
use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    routing::{get, post},
};
use portal_core::types::ErrorResponse;
use std::sync::Arc;

/// Public submission and tracking routes
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/complaints",
            post(handlers::complaints::submit_complaint),
        )
        .route(
            "/api/complaints/track/:tracking_id",
            get(handlers::complaints::track_complaint),
        )
}

/// Build health check routes (no admin key required)
pub fn health_routes() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(handlers::health::health_check))
}

/// Review routes, guarded by the admin key when one is configured
pub fn admin_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/admin/complaints",
            get(handlers::admin::list_complaints),
        )
        .route(
            "/api/admin/complaints/search",
            get(handlers::admin::search_complaints),
        )
        .route(
            "/api/admin/complaints/:id",
            get(handlers::admin::get_complaint).patch(handlers::admin::update_complaint),
        )
        .route(
            "/api/admin/complaints/:id/notes",
            get(handlers::admin::list_notes).post(handlers::admin::add_note),
        )
        .route("/api/admin/stats", get(handlers::admin::get_statistics))
        .route(
            "/api/admin/stats/snapshot",
            post(handlers::admin::create_snapshot),
        )
        .route_layer(middleware::from_extractor_with_state::<AdminKey, _>(state))
}

/// Combine all routes into a single router
pub fn build_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .merge(health_routes())
        .merge(api_routes())
        .merge(admin_routes(state))
        .fallback(not_found_handler)
}

/// Handle 404 Not Found errors
async fn not_found_handler() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new(
            "The requested endpoint does not exist",
            "ROUTE_NOT_FOUND",
        )),
    )
}
