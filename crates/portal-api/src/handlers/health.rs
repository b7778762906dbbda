//! Health check endpoint for monitoring

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Timestamp of the check
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Whether the complaint store answered
    pub database_connected: bool,
    /// Store round trip in milliseconds
    pub response_time_ms: u64,
}

/// Report service health, returning 503 when the store is unreachable
///
/// # Example Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "timestamp": "2024-03-15T14:25:30Z",
///   "database_connected": true,
///   "response_time_ms": 3
/// }
/// ```
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HealthResponse>, StatusCode> {
    let start_time = std::time::Instant::now();

    if let Err(e) = state.service.store().health_check().await {
        error!(error = %e, "Store health check failed");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    let response_time_ms = u64::try_from(start_time.elapsed().as_millis()).unwrap_or(u64::MAX);
    debug!(response_time_ms, "Health check completed");

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        database_connected: true,
        response_time_ms,
    }))
}
