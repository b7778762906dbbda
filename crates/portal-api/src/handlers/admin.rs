//! Administrative complaint review endpoints

use super::{ApiResult, bad_request, not_found, parse_timestamp, service_error};
use crate::extractors::{JsonBody, ValidatedJson};
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use portal_core::types::{
    Complaint, ComplaintId, ComplaintNote, ComplaintPublic, ComplaintSearch, ComplaintStatistic,
    ComplaintStatistics, ComplaintUpdate, MediaAttachment, NoteDraft,
};
use portal_service::DEFAULT_LIST_LIMIT;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

/// Query parameters for listing complaints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    /// Maximum number of complaints, 100 when absent
    pub limit: Option<i64>,
}

/// Query parameters for searching complaints
///
/// Every filter is optional and blank values are ignored. Dates accept
/// RFC 3339 timestamps or bare `YYYY-MM-DD` dates; a bare `date_to` covers
/// the whole day.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    /// Category token
    pub category: Option<String>,
    /// Status token
    pub status: Option<String>,
    /// Urgency token
    pub urgency: Option<String>,
    /// Tracking code fragment
    pub tracking_id: Option<String>,
    /// Incident location fragment
    pub location: Option<String>,
    /// Earliest creation time
    pub date_from: Option<String>,
    /// Latest creation time
    pub date_to: Option<String>,
}

impl SearchParams {
    fn into_search(self) -> ApiResult<ComplaintSearch> {
        Ok(ComplaintSearch {
            category: token_filter(self.category.as_deref())?,
            status: token_filter(self.status.as_deref())?,
            urgency: token_filter(self.urgency.as_deref())?,
            tracking_id: text_filter(self.tracking_id),
            location: text_filter(self.location),
            date_from: date_filter("date_from", self.date_from.as_deref(), false)?,
            date_to: date_filter("date_to", self.date_to.as_deref(), true)?,
        })
    }
}

fn token_filter<T>(value: Option<&str>) -> ApiResult<Option<T>>
where
    T: FromStr<Err = portal_core::Error>,
{
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::parse::<T>)
        .transpose()
        .map_err(|e| service_error(&e))
}

fn text_filter(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn date_filter(
    name: &str,
    value: Option<&str>,
    end_of_day: bool,
) -> ApiResult<Option<DateTime<Utc>>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => parse_timestamp(raw, end_of_day)
            .map(Some)
            .ok_or_else(|| bad_request(format!("Invalid {name}: '{raw}'"))),
    }
}

/// A complaint with its attachments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplaintDetail {
    /// Full complaint record
    #[serde(flatten)]
    pub complaint: Complaint,
    /// Stored attachments, oldest first
    pub attachments: Vec<MediaAttachment>,
}

/// Period covered by a statistics snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRequest {
    /// Inclusive start
    pub period_start: DateTime<Utc>,
    /// Exclusive end
    pub period_end: DateTime<Utc>,
}

/// Newest complaints first
pub async fn list_complaints(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<ComplaintPublic>>> {
    let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    state
        .service
        .list(limit)
        .await
        .map(Json)
        .map_err(|e| service_error(&e))
}

/// Filtered complaints, newest first, at most 50
pub async fn search_complaints(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<ComplaintPublic>>> {
    let search = params.into_search()?;
    state
        .service
        .search(&search)
        .await
        .map(Json)
        .map_err(|e| service_error(&e))
}

/// Full complaint record with attachments
pub async fn get_complaint(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ComplaintId>,
) -> ApiResult<Json<ComplaintDetail>> {
    let complaint = state
        .service
        .get_complaint(id)
        .await
        .map_err(|e| service_error(&e))?
        .ok_or_else(|| not_found("Complaint"))?;
    let attachments = state
        .service
        .list_attachments(id)
        .await
        .map_err(|e| service_error(&e))?;

    Ok(Json(ComplaintDetail {
        complaint,
        attachments,
    }))
}

/// Change status, category or urgency
pub async fn update_complaint(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ComplaintId>,
    JsonBody(update): JsonBody<ComplaintUpdate>,
) -> ApiResult<Json<Complaint>> {
    if update.is_empty() {
        return Err(bad_request(
            "At least one of status, category or urgency is required",
        ));
    }

    state
        .service
        .update_complaint(id, update)
        .await
        .map_err(|e| service_error(&e))?
        .map(Json)
        .ok_or_else(|| not_found("Complaint"))
}

/// Reviewer notes, oldest first
pub async fn list_notes(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ComplaintId>,
) -> ApiResult<Json<Vec<ComplaintNote>>> {
    if state
        .service
        .get_complaint(id)
        .await
        .map_err(|e| service_error(&e))?
        .is_none()
    {
        return Err(not_found("Complaint"));
    }

    state
        .service
        .list_notes(id)
        .await
        .map(Json)
        .map_err(|e| service_error(&e))
}

/// Attach a reviewer note
pub async fn add_note(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ComplaintId>,
    ValidatedJson(note): ValidatedJson<NoteDraft>,
) -> ApiResult<(StatusCode, Json<ComplaintNote>)> {
    let stored = state
        .service
        .add_note(id, &note)
        .await
        .map_err(|e| service_error(&e))?
        .ok_or_else(|| not_found("Complaint"))?;

    info!(complaint_id = id, note_id = stored.id, "Note added");
    Ok((StatusCode::CREATED, Json(stored)))
}

/// Aggregate counts computed now
pub async fn get_statistics(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ComplaintStatistics>> {
    state
        .service
        .statistics()
        .await
        .map(Json)
        .map_err(|e| service_error(&e))
}

/// Persist counts for complaints created in `[period_start, period_end)`
pub async fn create_snapshot(
    State(state): State<Arc<AppState>>,
    JsonBody(request): JsonBody<SnapshotRequest>,
) -> ApiResult<(StatusCode, Json<ComplaintStatistic>)> {
    let snapshot = state
        .service
        .snapshot_statistics(request.period_start, request.period_end)
        .await
        .map_err(|e| service_error(&e))?;

    Ok((StatusCode::CREATED, Json(snapshot)))
}
