//! Public complaint submission and tracking

use super::{ApiResult, bad_request, not_found, parse_timestamp, service_error, validation_failed};
use crate::state::AppState;
use axum::{
    Json,
    body::Bytes,
    extract::{ConnectInfo, Multipart, Path, State, multipart::MultipartRejection},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use portal_core::types::{ComplaintDraft, ComplaintPublic};
use portal_core::utils::normalize_tracking_id;
use portal_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use validator::Validate;

/// Multipart field name carrying attachment files
pub const MEDIA_FIELD: &str = "media";

/// Content type assumed for file parts that do not declare one
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Response to a successful submission
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmitResponse {
    /// Code the submitter uses to follow up
    pub tracking_id: String,
    /// Attachments stored
    pub attachments_accepted: usize,
    /// Attachments refused or lost
    pub attachments_rejected: usize,
}

#[derive(Debug)]
struct UploadedFile {
    filename: String,
    mime_type: String,
    content: Bytes,
}

#[derive(Debug, Default)]
struct Submission {
    draft: ComplaintDraft,
    files: Vec<UploadedFile>,
}

/// Accept a complaint submitted as `multipart/form-data`
///
/// Text fields map onto the complaint draft; every `media` part is offered to
/// the attachment store. The complaint is kept even when some attachments are
/// refused, and the response reports how many were accepted.
///
/// # Responses
///
/// * `201 CREATED` - complaint stored, tracking code returned
/// * `400 BAD_REQUEST` - malformed form data or failed validation
/// * `500 INTERNAL_SERVER_ERROR` - the complaint could not be stored
pub async fn submit_complaint(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> ApiResult<(StatusCode, Json<SubmitResponse>)> {
    let mut multipart = multipart.map_err(|rejection| {
        warn!(error = %rejection, "Rejected submission without multipart body");
        bad_request("Request must be multipart/form-data")
    })?;

    let submission = read_submission(&mut multipart).await?;
    let draft = submission.draft.normalized();
    if let Err(errors) = draft.validate() {
        warn!("Rejected complaint submission failing validation");
        return Err(validation_failed(&errors));
    }

    let client_address = connect_info.map(|ConnectInfo(addr)| addr.ip().to_string());
    let (complaint, tracking_id) = state
        .service
        .create(draft, client_address)
        .await
        .map_err(|e| service_error(&e))?;

    let mut accepted = 0;
    let mut rejected = 0;
    for file in &submission.files {
        match state
            .service
            .add_attachment(complaint.id, &file.filename, &file.content, &file.mime_type)
            .await
        {
            Ok(Some(_)) => accepted += 1,
            Ok(None) => rejected += 1,
            Err(e) => {
                error!(tracking_id = %tracking_id, error = %e, "Attachment could not be stored");
                rejected += 1;
            }
        }
    }

    info!(
        tracking_id = %tracking_id,
        attachments_accepted = accepted,
        attachments_rejected = rejected,
        "Complaint submission completed"
    );

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            tracking_id,
            attachments_accepted: accepted,
            attachments_rejected: rejected,
        }),
    ))
}

async fn read_submission(multipart: &mut Multipart) -> ApiResult<Submission> {
    let mut submission = Submission::default();
    let mut incident_date = None;
    let mut incident_time = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!(error = %e, "Error parsing multipart data");
        bad_request(format!("Invalid multipart data: {e}"))
    })? {
        let name = field.name().unwrap_or_default().to_string();

        if name == MEDIA_FIELD {
            let filename = field.file_name().unwrap_or_default().to_string();
            let mime_type = field
                .content_type()
                .unwrap_or(FALLBACK_CONTENT_TYPE)
                .to_string();
            let content = field
                .bytes()
                .await
                .map_err(|e| bad_request(format!("Failed to read file data: {e}")))?;

            // Browsers send an empty part when no file was chosen
            if filename.is_empty() && content.is_empty() {
                continue;
            }
            submission.files.push(UploadedFile {
                filename,
                mime_type,
                content,
            });
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| bad_request(format!("Failed to read field '{name}': {e}")))?;
        let draft = &mut submission.draft;

        match name.as_str() {
            "title" => draft.title = value,
            "description" => draft.description = value,
            "category" => draft.category = parse_choice(&value).map_err(|e| service_error(&e))?,
            "urgency" => draft.urgency = parse_choice(&value).map_err(|e| service_error(&e))?,
            "incident_date" => incident_date = Some(value),
            "incident_time" => incident_time = Some(value),
            "incident_location" => draft.incident_location = Some(value),
            "officer_name" => draft.officer_name = Some(value),
            "officer_badge_number" => draft.officer_badge_number = Some(value),
            "contact_email" => draft.contact_email = Some(value),
            "contact_phone" => draft.contact_phone = Some(value),
            other => debug!(field = other, "Ignoring unknown form field"),
        }
    }

    submission.draft.incident_date =
        incident_timestamp(incident_date.as_deref(), incident_time.as_deref())
            .map_err(|e| service_error(&e))?;

    Ok(submission)
}

/// Blank selects the default value
fn parse_choice<T>(value: &str) -> Result<T>
where
    T: FromStr<Err = Error> + Default,
{
    let value = value.trim();
    if value.is_empty() {
        Ok(T::default())
    } else {
        value.parse()
    }
}

/// Combine the form's date and optional `HH:MM` time fields
fn incident_timestamp(date: Option<&str>, time: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    let Some(date) = date.map(str::trim).filter(|d| !d.is_empty()) else {
        return Ok(None);
    };

    let combined = match time.map(str::trim).filter(|t| !t.is_empty()) {
        Some(time) => format!("{date}T{time}"),
        None => date.to_string(),
    };

    parse_timestamp(&combined, false)
        .map(Some)
        .ok_or_else(|| Error::validation("incident_date", format!("unrecognised date '{combined}'")))
}

/// Public status of a complaint by tracking code
///
/// The code is trimmed and uppercased before lookup, so `pc-1a2b3c4d` finds
/// `PC-1A2B3C4D`. Unknown codes yield 404.
pub async fn track_complaint(
    State(state): State<Arc<AppState>>,
    Path(tracking_id): Path<String>,
) -> ApiResult<Json<ComplaintPublic>> {
    let code = normalize_tracking_id(&tracking_id);

    match state.service.get_by_tracking_code(&code).await {
        Ok(Some(summary)) => Ok(Json(summary)),
        Ok(None) => {
            debug!(tracking_id = %code, "Tracking code not found");
            Err(not_found("Complaint"))
        }
        Err(e) => Err(service_error(&e)),
    }
}
