//! Core data types for the complaint portal

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Database identifier of a complaint
pub type ComplaintId = i64;

/// Review status of a complaint
///
/// Administrators may move a complaint between any two states.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintStatus {
    /// Awaiting review
    #[default]
    Pending,
    /// Being reviewed
    UnderReview,
    /// Closed with a resolution
    Resolved,
    /// Closed without action
    Dismissed,
}

impl ComplaintStatus {
    /// Every status, in display order
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::UnderReview,
        Self::Resolved,
        Self::Dismissed,
    ];

    /// Storage and wire token
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::UnderReview => "under_review",
            Self::Resolved => "resolved",
            Self::Dismissed => "dismissed",
        }
    }
}

/// Nature of the alleged misconduct
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintCategory {
    /// Use of excessive force
    ExcessiveForce,
    /// General misconduct
    Misconduct,
    /// Discriminatory treatment
    Discrimination,
    /// Corruption or bribery
    Corruption,
    /// Harassment
    Harassment,
    /// Abuse of power
    AbuseOfPower,
    /// Anything else
    #[default]
    Other,
}

impl ComplaintCategory {
    /// Every category, in display order
    pub const ALL: [Self; 7] = [
        Self::ExcessiveForce,
        Self::Misconduct,
        Self::Discrimination,
        Self::Corruption,
        Self::Harassment,
        Self::AbuseOfPower,
        Self::Other,
    ];

    /// Storage and wire token
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ExcessiveForce => "excessive_force",
            Self::Misconduct => "misconduct",
            Self::Discrimination => "discrimination",
            Self::Corruption => "corruption",
            Self::Harassment => "harassment",
            Self::AbuseOfPower => "abuse_of_power",
            Self::Other => "other",
        }
    }
}

/// Submitter-assessed urgency
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintUrgency {
    /// Low
    Low,
    /// Medium
    #[default]
    Medium,
    /// High
    High,
    /// Critical
    Critical,
}

impl ComplaintUrgency {
    /// Every urgency level, lowest first
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    /// Storage and wire token
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// Coarse classification of an attachment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    /// `image/*`
    Image,
    /// `video/*`
    Video,
    /// `audio/*`
    Audio,
    /// Everything else
    Document,
}

impl MediaType {
    /// Every media type
    pub const ALL: [Self; 4] = [Self::Image, Self::Video, Self::Audio, Self::Document];

    /// Classify a MIME type by its top-level prefix
    #[must_use]
    pub fn from_mime(mime_type: &str) -> Self {
        if mime_type.starts_with("image/") {
            Self::Image
        } else if mime_type.starts_with("video/") {
            Self::Video
        } else if mime_type.starts_with("audio/") {
            Self::Audio
        } else {
            Self::Document
        }
    }

    /// Storage and wire token
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Document => "document",
        }
    }
}

macro_rules! impl_token_conversions {
    ($($ty:ident => $field:literal),+ $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }

            impl FromStr for $ty {
                type Err = Error;

                fn from_str(s: &str) -> Result<Self> {
                    Self::ALL
                        .into_iter()
                        .find(|candidate| candidate.as_str() == s)
                        .ok_or_else(|| Error::validation($field, format!("unknown value '{s}'")))
                }
            }
        )+
    };
}

impl_token_conversions!(
    ComplaintStatus => "status",
    ComplaintCategory => "category",
    ComplaintUrgency => "urgency",
    MediaType => "media_type",
);

/// A stored complaint with every field an administrator may see
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Complaint {
    /// Store-assigned identifier, never exposed publicly
    pub id: ComplaintId,

    /// Public tracking code (`PC-XXXXXXXX`)
    pub tracking_id: String,

    /// Short summary
    pub title: String,

    /// Full account of the incident
    pub description: String,

    /// Category of misconduct
    pub category: ComplaintCategory,

    /// Submitter-assessed urgency
    pub urgency: ComplaintUrgency,

    /// When the incident happened
    pub incident_date: Option<DateTime<Utc>>,

    /// Where the incident happened
    pub incident_location: Option<String>,

    /// Officer badge number
    pub officer_badge_number: Option<String>,

    /// Officer name
    pub officer_name: Option<String>,

    /// Optional contact email
    pub contact_email: Option<String>,

    /// Optional contact phone
    pub contact_phone: Option<String>,

    /// Review status
    pub status: ComplaintStatus,

    /// Submission time
    pub created_at: DateTime<Utc>,

    /// Last modification time
    pub updated_at: DateTime<Utc>,

    /// Network address of the submitter
    pub submitted_ip: Option<String>,

    /// Free-form metadata object
    pub additional_metadata: serde_json::Value,
}

impl Complaint {
    /// Project onto the fields that are safe to show the public
    #[must_use]
    pub fn to_public(&self) -> ComplaintPublic {
        ComplaintPublic {
            tracking_id: self.tracking_id.clone(),
            title: self.title.clone(),
            category: self.category,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Public projection of a complaint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComplaintPublic {
    /// Tracking code
    pub tracking_id: String,
    /// Title
    pub title: String,
    /// Category
    pub category: ComplaintCategory,
    /// Review status
    pub status: ComplaintStatus,
    /// Submission time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl From<&Complaint> for ComplaintPublic {
    fn from(complaint: &Complaint) -> Self {
        complaint.to_public()
    }
}

/// Submitted complaint before it is stored
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, PartialEq)]
pub struct ComplaintDraft {
    /// Short summary
    #[validate(length(min = 5, max = 200, message = "Title must be between 5 and 200 characters"))]
    pub title: String,

    /// Full account of the incident
    #[validate(length(
        min = 10,
        max = 5000,
        message = "Description must be between 10 and 5000 characters"
    ))]
    pub description: String,

    /// Category of misconduct
    #[serde(default)]
    pub category: ComplaintCategory,

    /// Submitter-assessed urgency
    #[serde(default)]
    pub urgency: ComplaintUrgency,

    /// When the incident happened
    #[serde(default)]
    pub incident_date: Option<DateTime<Utc>>,

    /// Where the incident happened
    #[serde(default)]
    #[validate(length(max = 500))]
    pub incident_location: Option<String>,

    /// Officer badge number
    #[serde(default)]
    #[validate(length(max = 50))]
    pub officer_badge_number: Option<String>,

    /// Officer name
    #[serde(default)]
    #[validate(length(max = 200))]
    pub officer_name: Option<String>,

    /// Optional contact email
    #[serde(default)]
    #[validate(length(max = 255))]
    pub contact_email: Option<String>,

    /// Optional contact phone
    #[serde(default)]
    #[validate(length(max = 20))]
    pub contact_phone: Option<String>,
}

impl ComplaintDraft {
    /// Trim every text field and drop optional fields left blank
    #[must_use]
    pub fn normalized(self) -> Self {
        fn blank_to_none(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        Self {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            incident_location: blank_to_none(self.incident_location),
            officer_badge_number: blank_to_none(self.officer_badge_number),
            officer_name: blank_to_none(self.officer_name),
            contact_email: blank_to_none(self.contact_email),
            contact_phone: blank_to_none(self.contact_phone),
            ..self
        }
    }
}

/// Everything the store needs to insert a complaint row
#[derive(Debug, Clone, PartialEq)]
pub struct NewComplaint {
    /// Freshly generated tracking code
    pub tracking_id: String,
    /// Validated submission
    pub draft: ComplaintDraft,
    /// Network address of the submitter
    pub submitted_ip: Option<String>,
    /// Submission time, used for both timestamps
    pub submitted_at: DateTime<Utc>,
}

/// Administrative changes to a complaint
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComplaintUpdate {
    /// New review status
    #[serde(default)]
    pub status: Option<ComplaintStatus>,
    /// New category
    #[serde(default)]
    pub category: Option<ComplaintCategory>,
    /// New urgency
    #[serde(default)]
    pub urgency: Option<ComplaintUrgency>,
}

impl ComplaintUpdate {
    /// Whether the update changes nothing
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.status.is_none() && self.category.is_none() && self.urgency.is_none()
    }
}

/// Filters for the administrative search
///
/// Every filter is optional and they combine with AND. Text filters match
/// case-insensitively on a substring; blank text filters are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComplaintSearch {
    /// Exact category
    #[serde(default)]
    pub category: Option<ComplaintCategory>,
    /// Exact status
    #[serde(default)]
    pub status: Option<ComplaintStatus>,
    /// Exact urgency
    #[serde(default)]
    pub urgency: Option<ComplaintUrgency>,
    /// Substring of the tracking code
    #[serde(default)]
    pub tracking_id: Option<String>,
    /// Substring of the incident location
    #[serde(default)]
    pub location: Option<String>,
    /// Earliest submission time, inclusive
    #[serde(default)]
    pub date_from: Option<DateTime<Utc>>,
    /// Latest submission time, inclusive
    #[serde(default)]
    pub date_to: Option<DateTime<Utc>>,
}

impl ComplaintSearch {
    /// Maximum number of results a search returns
    pub const LIMIT: i64 = 50;

    /// Tracking-code filter, uppercased, if non-blank
    #[must_use]
    pub fn tracking_pattern(&self) -> Option<String> {
        non_blank(self.tracking_id.as_deref()).map(str::to_uppercase)
    }

    /// Location filter, lowercased, if non-blank
    #[must_use]
    pub fn location_pattern(&self) -> Option<String> {
        non_blank(self.location.as_deref()).map(str::to_lowercase)
    }

    /// Whether `complaint` passes every filter
    #[must_use]
    pub fn matches(&self, complaint: &Complaint) -> bool {
        if self.category.is_some_and(|c| c != complaint.category)
            || self.status.is_some_and(|s| s != complaint.status)
            || self.urgency.is_some_and(|u| u != complaint.urgency)
            || self.date_from.is_some_and(|from| complaint.created_at < from)
            || self.date_to.is_some_and(|to| complaint.created_at > to)
        {
            return false;
        }

        if let Some(pattern) = self.tracking_pattern()
            && !complaint.tracking_id.to_uppercase().contains(&pattern)
        {
            return false;
        }

        if let Some(pattern) = self.location_pattern() {
            return complaint
                .incident_location
                .as_deref()
                .is_some_and(|loc| loc.to_lowercase().contains(&pattern));
        }

        true
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Live aggregate counts over every complaint
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComplaintStatistics {
    /// Number of complaints
    pub total_complaints: i64,
    /// Complaints with status `pending`
    pub pending_complaints: i64,
    /// Complaints with status `resolved`
    pub resolved_complaints: i64,
    /// Count per category token, zero entries included
    pub by_category: BTreeMap<String, i64>,
    /// Count per status token, zero entries included
    pub by_status: BTreeMap<String, i64>,
    /// Count per urgency token, zero entries included
    pub by_urgency: BTreeMap<String, i64>,
    /// Complaints submitted in the last 30 days
    pub recent_complaints: i64,
}

/// Per-token tallies for a set of complaints, zero entries included
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breakdown {
    /// Count per category token
    pub by_category: BTreeMap<String, i64>,
    /// Count per status token
    pub by_status: BTreeMap<String, i64>,
    /// Count per urgency token
    pub by_urgency: BTreeMap<String, i64>,
}

impl Default for Breakdown {
    fn default() -> Self {
        Self {
            by_category: ComplaintCategory::ALL
                .iter()
                .map(|c| (c.as_str().to_string(), 0))
                .collect(),
            by_status: ComplaintStatus::ALL
                .iter()
                .map(|s| (s.as_str().to_string(), 0))
                .collect(),
            by_urgency: ComplaintUrgency::ALL
                .iter()
                .map(|u| (u.as_str().to_string(), 0))
                .collect(),
        }
    }
}

impl Breakdown {
    /// Count one complaint
    pub fn record(
        &mut self,
        category: ComplaintCategory,
        status: ComplaintStatus,
        urgency: ComplaintUrgency,
    ) {
        *self.by_category.entry(category.as_str().to_string()).or_default() += 1;
        *self.by_status.entry(status.as_str().to_string()).or_default() += 1;
        *self.by_urgency.entry(urgency.as_str().to_string()).or_default() += 1;
    }

    /// Add `count` complaints under a category token
    pub fn add_category(&mut self, token: &str, count: i64) {
        *self.by_category.entry(token.to_string()).or_default() += count;
    }

    /// Add `count` complaints under a status token
    pub fn add_status(&mut self, token: &str, count: i64) {
        *self.by_status.entry(token.to_string()).or_default() += count;
    }

    /// Add `count` complaints under an urgency token
    pub fn add_urgency(&mut self, token: &str, count: i64) {
        *self.by_urgency.entry(token.to_string()).or_default() += count;
    }

    /// Total number of complaints counted
    #[must_use]
    pub fn total(&self) -> i64 {
        self.by_status.values().sum()
    }

    /// Count recorded for one status
    #[must_use]
    pub fn status_count(&self, status: ComplaintStatus) -> i64 {
        self.by_status.get(status.as_str()).copied().unwrap_or(0)
    }
}

/// A file attached to a complaint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaAttachment {
    /// Store-assigned identifier
    pub id: i64,
    /// Owning complaint
    pub complaint_id: ComplaintId,
    /// Stored file name (`{token}_{original}`)
    pub filename: String,
    /// Name supplied by the submitter
    pub original_filename: String,
    /// Location on disk
    pub file_path: String,
    /// Size in bytes
    pub file_size: i64,
    /// Declared MIME type
    pub mime_type: String,
    /// Classification derived from the MIME type
    pub media_type: MediaType,
    /// Lowercase hex SHA-256 of the content
    pub file_hash: String,
    /// When the file was stored
    pub uploaded_at: DateTime<Utc>,
    /// Set once the file is on disk
    pub is_processed: bool,
}

/// Attachment row awaiting insertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttachment {
    /// Owning complaint
    pub complaint_id: ComplaintId,
    /// Stored file name
    pub filename: String,
    /// Name supplied by the submitter
    pub original_filename: String,
    /// Location on disk
    pub file_path: String,
    /// Size in bytes
    pub file_size: i64,
    /// Declared MIME type
    pub mime_type: String,
    /// Classification derived from the MIME type
    pub media_type: MediaType,
    /// Lowercase hex SHA-256 of the content
    pub file_hash: String,
    /// When the file was stored
    pub uploaded_at: DateTime<Utc>,
}

/// Internal reviewer note
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComplaintNote {
    /// Store-assigned identifier
    pub id: i64,
    /// Owning complaint
    pub complaint_id: ComplaintId,
    /// Note text
    pub note: String,
    /// Reviewer identifier
    pub created_by: String,
    /// When the note was written
    pub created_at: DateTime<Utc>,
}

/// Note submitted by a reviewer
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq, Eq)]
pub struct NoteDraft {
    /// Note text
    #[validate(length(min = 1, max = 2000))]
    pub note: String,
    /// Reviewer identifier
    #[validate(length(min = 1, max = 100))]
    pub created_by: String,
}

/// Persisted aggregate over a reporting period
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComplaintStatistic {
    /// Store-assigned identifier
    pub id: i64,
    /// Inclusive start of the period
    pub period_start: DateTime<Utc>,
    /// Exclusive end of the period
    pub period_end: DateTime<Utc>,
    /// Complaints submitted in the period
    pub total_complaints: i64,
    /// Count per category token
    pub by_category: BTreeMap<String, i64>,
    /// Count per status token
    pub by_status: BTreeMap<String, i64>,
    /// Count per urgency token
    pub by_urgency: BTreeMap<String, i64>,
    /// When the snapshot was taken
    pub generated_at: DateTime<Utc>,
}

/// Snapshot awaiting insertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStatistic {
    /// Inclusive start of the period
    pub period_start: DateTime<Utc>,
    /// Exclusive end of the period
    pub period_end: DateTime<Utc>,
    /// Tallies for the period
    pub breakdown: Breakdown,
    /// When the snapshot was taken
    pub generated_at: DateTime<Utc>,
}

/// Error response structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,

    /// Error code
    pub code: String,

    /// Optional additional details
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            details: None,
        }
    }

    /// Create an error response with details
    pub fn with_details(
        error: impl Into<String>,
        code: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            details: Some(details),
        }
    }
}
