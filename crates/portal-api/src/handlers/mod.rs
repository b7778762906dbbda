//! HTTP request handlers

pub mod admin;
pub mod complaints;
pub mod health;

use axum::{Json, http::StatusCode};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use portal_core::Error;
use portal_core::types::ErrorResponse;
use tracing::error;
use validator::ValidationErrors;

/// Error half of every handler result
pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Result type returned by handlers
pub type ApiResult<T> = Result<T, ApiError>;

pub(crate) fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new(message, "BAD_REQUEST")),
    )
}

pub(crate) fn not_found(what: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new(format!("{what} not found"), "NOT_FOUND")),
    )
}

pub(crate) fn validation_failed(errors: &ValidationErrors) -> ApiError {
    let details = serde_json::to_value(errors).unwrap_or_default();
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::with_details(
            "Validation failed",
            "VALIDATION_ERROR",
            details,
        )),
    )
}

/// Map a service error to a response, hiding internal detail
pub(crate) fn service_error(err: &Error) -> ApiError {
    match err {
        Error::Validation { field, message } => {
            let mut details = serde_json::Map::new();
            details.insert(field.clone(), serde_json::json!([message]));
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::with_details(
                    "Validation failed",
                    "VALIDATION_ERROR",
                    details.into(),
                )),
            )
        }
        Error::NotFound { resource } => not_found(resource),
        other => {
            error!(error = %other, "Request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(
                    "An internal error occurred. Please try again later.",
                    "INTERNAL_ERROR",
                )),
            )
        }
    }
}

/// Parse a timestamp from RFC 3339, `YYYY-MM-DDTHH:MM[:SS]` or a bare date
///
/// Naive values are taken as UTC. A bare date resolves to the start of the
/// day, or to its last instant when `end_of_day` is set.
pub(crate) fn parse_timestamp(value: &str, end_of_day: bool) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Some(parsed.and_utc());
        }
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()?;
    let time = if end_of_day {
        NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999)?
    } else {
        NaiveTime::MIN
    };
    Some(date.and_time(time).and_utc())
}
