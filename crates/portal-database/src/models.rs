//! Database row models and their conversion into domain types

use chrono::{DateTime, Utc};
use portal_core::types::{
    Complaint, ComplaintNote, ComplaintStatistic, MediaAttachment,
};
use portal_core::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use std::collections::BTreeMap;

/// Row of the `complaints` table
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ComplaintDb {
    /// Primary key
    pub id: i64,
    /// Public tracking code
    pub tracking_id: String,
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// Category token
    pub category: String,
    /// Urgency token
    pub urgency: String,
    /// Incident time
    pub incident_date: Option<DateTime<Utc>>,
    /// Incident location
    pub incident_location: Option<String>,
    /// Officer badge number
    pub officer_badge_number: Option<String>,
    /// Officer name
    pub officer_name: Option<String>,
    /// Contact email
    pub contact_email: Option<String>,
    /// Contact phone
    pub contact_phone: Option<String>,
    /// Status token
    pub status: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
    /// Submitter address
    pub submitted_ip: Option<String>,
    /// Metadata object
    pub additional_metadata: serde_json::Value,
}

impl TryFrom<ComplaintDb> for Complaint {
    type Error = Error;

    fn try_from(row: ComplaintDb) -> Result<Self> {
        Ok(Self {
            id: row.id,
            category: row.category.parse()?,
            urgency: row.urgency.parse()?,
            status: row.status.parse()?,
            tracking_id: row.tracking_id,
            title: row.title,
            description: row.description,
            incident_date: row.incident_date,
            incident_location: row.incident_location,
            officer_badge_number: row.officer_badge_number,
            officer_name: row.officer_name,
            contact_email: row.contact_email,
            contact_phone: row.contact_phone,
            created_at: row.created_at,
            updated_at: row.updated_at,
            submitted_ip: row.submitted_ip,
            additional_metadata: row.additional_metadata,
        })
    }
}

/// Row of the `media_attachments` table
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MediaAttachmentDb {
    /// Primary key
    pub id: i64,
    /// Owning complaint
    pub complaint_id: i64,
    /// Stored file name
    pub filename: String,
    /// Submitted file name
    pub original_filename: String,
    /// Path on disk
    pub file_path: String,
    /// Size in bytes
    pub file_size: i64,
    /// MIME type
    pub mime_type: String,
    /// Media type token
    pub media_type: String,
    /// SHA-256 hex digest
    pub file_hash: String,
    /// Upload timestamp
    pub uploaded_at: DateTime<Utc>,
    /// Stored flag
    pub is_processed: bool,
}

impl TryFrom<MediaAttachmentDb> for MediaAttachment {
    type Error = Error;

    fn try_from(row: MediaAttachmentDb) -> Result<Self> {
        Ok(Self {
            id: row.id,
            complaint_id: row.complaint_id,
            media_type: row.media_type.parse()?,
            filename: row.filename,
            original_filename: row.original_filename,
            file_path: row.file_path,
            file_size: row.file_size,
            mime_type: row.mime_type,
            file_hash: row.file_hash,
            uploaded_at: row.uploaded_at,
            is_processed: row.is_processed,
        })
    }
}

/// Row of the `complaint_notes` table
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ComplaintNoteDb {
    /// Primary key
    pub id: i64,
    /// Owning complaint
    pub complaint_id: i64,
    /// Note text
    pub note: String,
    /// Reviewer identifier
    pub created_by: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl From<ComplaintNoteDb> for ComplaintNote {
    fn from(row: ComplaintNoteDb) -> Self {
        Self {
            id: row.id,
            complaint_id: row.complaint_id,
            note: row.note,
            created_by: row.created_by,
            created_at: row.created_at,
        }
    }
}

/// Row of the `complaint_statistics` table
#[derive(Debug, Clone, FromRow)]
pub struct ComplaintStatisticDb {
    /// Primary key
    pub id: i64,
    /// Period start
    pub period_start: DateTime<Utc>,
    /// Period end
    pub period_end: DateTime<Utc>,
    /// Complaint count
    pub total_complaints: i64,
    /// Per-category counts
    pub by_category: Json<BTreeMap<String, i64>>,
    /// Per-status counts
    pub by_status: Json<BTreeMap<String, i64>>,
    /// Per-urgency counts
    pub by_urgency: Json<BTreeMap<String, i64>>,
    /// Snapshot time
    pub generated_at: DateTime<Utc>,
}

impl From<ComplaintStatisticDb> for ComplaintStatistic {
    fn from(row: ComplaintStatisticDb) -> Self {
        Self {
            id: row.id,
            period_start: row.period_start,
            period_end: row.period_end,
            total_complaints: row.total_complaints,
            by_category: row.by_category.0,
            by_status: row.by_status.0,
            by_urgency: row.by_urgency.0,
            generated_at: row.generated_at,
        }
    }
}
