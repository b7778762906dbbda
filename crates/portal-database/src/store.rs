//! PostgreSQL-backed [`ComplaintStore`]

use crate::queries::{AttachmentQueries, ComplaintQueries, NoteQueries, StatisticQueries};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use portal_core::types::{
    Breakdown, Complaint, ComplaintId, ComplaintNote, ComplaintSearch, ComplaintStatistic,
    ComplaintUpdate, MediaAttachment, NewAttachment, NewComplaint, NewStatistic, NoteDraft,
};
use portal_core::{ComplaintStore, Error, Result};
use sqlx::PgPool;

/// Store that keeps complaints in PostgreSQL
#[derive(Debug, Clone)]
pub struct PgComplaintStore {
    pool: PgPool,
}

impl PgComplaintStore {
    /// Create a store over an existing pool
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the connection pool
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ComplaintStore for PgComplaintStore {
    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Health check failed: {e}")))?;
        Ok(())
    }

    async fn tracking_id_exists(&self, tracking_id: &str) -> Result<bool> {
        ComplaintQueries::tracking_id_exists(&self.pool, tracking_id).await
    }

    async fn insert_complaint(&self, complaint: &NewComplaint) -> Result<Complaint> {
        ComplaintQueries::insert(&self.pool, complaint)
            .await?
            .try_into()
    }

    async fn get_complaint(&self, id: ComplaintId) -> Result<Option<Complaint>> {
        ComplaintQueries::find_by_id(&self.pool, id)
            .await?
            .map(Complaint::try_from)
            .transpose()
    }

    async fn find_by_tracking_id(&self, tracking_id: &str) -> Result<Option<Complaint>> {
        ComplaintQueries::find_by_tracking_id(&self.pool, tracking_id)
            .await?
            .map(Complaint::try_from)
            .transpose()
    }

    async fn list_complaints(&self, limit: i64) -> Result<Vec<Complaint>> {
        ComplaintQueries::list_recent(&self.pool, limit)
            .await?
            .into_iter()
            .map(Complaint::try_from)
            .collect()
    }

    async fn search_complaints(
        &self,
        search: &ComplaintSearch,
        limit: i64,
    ) -> Result<Vec<Complaint>> {
        ComplaintQueries::search(&self.pool, search, limit)
            .await?
            .into_iter()
            .map(Complaint::try_from)
            .collect()
    }

    async fn update_complaint(
        &self,
        id: ComplaintId,
        update: &ComplaintUpdate,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Complaint>> {
        ComplaintQueries::update(&self.pool, id, update, updated_at)
            .await?
            .map(Complaint::try_from)
            .transpose()
    }

    async fn breakdown(
        &self,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Breakdown> {
        ComplaintQueries::breakdown(&self.pool, since, until).await
    }

    async fn insert_attachment(&self, attachment: &NewAttachment) -> Result<MediaAttachment> {
        AttachmentQueries::insert(&self.pool, attachment)
            .await?
            .try_into()
    }

    async fn list_attachments(&self, complaint_id: ComplaintId) -> Result<Vec<MediaAttachment>> {
        AttachmentQueries::find_by_complaint(&self.pool, complaint_id)
            .await?
            .into_iter()
            .map(MediaAttachment::try_from)
            .collect()
    }

    async fn insert_note(
        &self,
        complaint_id: ComplaintId,
        note: &NoteDraft,
        created_at: DateTime<Utc>,
    ) -> Result<ComplaintNote> {
        NoteQueries::insert(&self.pool, complaint_id, note, created_at)
            .await
            .map(ComplaintNote::from)
    }

    async fn list_notes(&self, complaint_id: ComplaintId) -> Result<Vec<ComplaintNote>> {
        Ok(NoteQueries::find_by_complaint(&self.pool, complaint_id)
            .await?
            .into_iter()
            .map(ComplaintNote::from)
            .collect())
    }

    async fn insert_statistic(&self, statistic: &NewStatistic) -> Result<ComplaintStatistic> {
        StatisticQueries::insert(&self.pool, statistic)
            .await
            .map(ComplaintStatistic::from)
    }
}
