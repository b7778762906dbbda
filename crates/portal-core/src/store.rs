//! Persistence seam between the complaint service and its backing store

use crate::Result;
use crate::types::{
    Breakdown, Complaint, ComplaintId, ComplaintNote, ComplaintSearch, ComplaintStatistic,
    ComplaintUpdate, MediaAttachment, NewAttachment, NewComplaint, NewStatistic, NoteDraft,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Storage operations the complaint service relies on
///
/// Each call is its own unit of work. Implementations must reject a second
/// complaint with an existing tracking code with [`crate::Error::Conflict`].
#[async_trait]
pub trait ComplaintStore: Send + Sync + std::fmt::Debug {
    /// Verify the store is reachable
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot serve requests.
    async fn health_check(&self) -> Result<()>;

    /// Whether a complaint already holds `tracking_id`
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    async fn tracking_id_exists(&self, tracking_id: &str) -> Result<bool>;

    /// Insert a complaint with status `pending`
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Conflict`] when the tracking code is taken, or
    /// another error if the write fails.
    async fn insert_complaint(&self, complaint: &NewComplaint) -> Result<Complaint>;

    /// Fetch a complaint by id
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    async fn get_complaint(&self, id: ComplaintId) -> Result<Option<Complaint>>;

    /// Fetch a complaint by exact tracking code
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    async fn find_by_tracking_id(&self, tracking_id: &str) -> Result<Option<Complaint>>;

    /// Newest complaints first, at most `limit`
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    async fn list_complaints(&self, limit: i64) -> Result<Vec<Complaint>>;

    /// Complaints matching `search`, newest first, at most `limit`
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    async fn search_complaints(&self, search: &ComplaintSearch, limit: i64)
    -> Result<Vec<Complaint>>;

    /// Apply `update` and stamp `updated_at`; `None` when the complaint is missing
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    async fn update_complaint(
        &self,
        id: ComplaintId,
        update: &ComplaintUpdate,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Complaint>>;

    /// Tally complaints created in `[since, until)`; open bounds when `None`
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    async fn breakdown(
        &self,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Breakdown>;

    /// Insert an attachment row
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails, including when the complaint is missing.
    async fn insert_attachment(&self, attachment: &NewAttachment) -> Result<MediaAttachment>;

    /// Attachments of a complaint, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    async fn list_attachments(&self, complaint_id: ComplaintId) -> Result<Vec<MediaAttachment>>;

    /// Insert a reviewer note
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails, including when the complaint is missing.
    async fn insert_note(
        &self,
        complaint_id: ComplaintId,
        note: &NoteDraft,
        created_at: DateTime<Utc>,
    ) -> Result<ComplaintNote>;

    /// Notes of a complaint, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    async fn list_notes(&self, complaint_id: ComplaintId) -> Result<Vec<ComplaintNote>>;

    /// Persist a statistics snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    async fn insert_statistic(&self, statistic: &NewStatistic) -> Result<ComplaintStatistic>;
}
