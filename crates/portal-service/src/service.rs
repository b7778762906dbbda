//! Complaint intake, tracking and reporting

use crate::storage::AttachmentStorage;
use chrono::{DateTime, Duration, Utc};
use portal_core::types::{
    Complaint, ComplaintDraft, ComplaintId, ComplaintNote, ComplaintPublic, ComplaintSearch,
    ComplaintStatistic, ComplaintStatistics, ComplaintStatus, ComplaintUpdate, MediaAttachment,
    MediaType, NewAttachment, NewComplaint, NewStatistic, NoteDraft,
};
use portal_core::utils::{
    MAX_ATTACHMENT_SIZE, generate_storage_filename, generate_tracking_id, hash_content,
    is_allowed_mime_type,
};
use portal_core::{ComplaintStore, Error, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Number of complaints returned by [`ComplaintService::list`] when no limit is given
pub const DEFAULT_LIST_LIMIT: i64 = 100;

/// Window counted by `recent_complaints` in [`ComplaintStatistics`]
pub const RECENT_WINDOW_DAYS: i64 = 30;

const MAX_ORIGINAL_NAME_CHARS: usize = 255;

type TrackingIdGenerator = Arc<dyn Fn() -> String + Send + Sync>;

/// Application service over a [`ComplaintStore`] and an [`AttachmentStorage`]
#[derive(Clone)]
pub struct ComplaintService {
    store: Arc<dyn ComplaintStore>,
    storage: Arc<dyn AttachmentStorage>,
    tracking_ids: TrackingIdGenerator,
}

impl std::fmt::Debug for ComplaintService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComplaintService")
            .field("store", &self.store)
            .field("storage", &self.storage)
            .finish_non_exhaustive()
    }
}

impl ComplaintService {
    /// Create a service with random `PC-XXXXXXXX` tracking codes
    #[must_use]
    pub fn new(store: Arc<dyn ComplaintStore>, storage: Arc<dyn AttachmentStorage>) -> Self {
        Self {
            store,
            storage,
            tracking_ids: Arc::new(generate_tracking_id),
        }
    }

    /// Replace the tracking code source
    #[must_use]
    pub fn with_tracking_id_generator(
        mut self,
        generator: impl Fn() -> String + Send + Sync + 'static,
    ) -> Self {
        self.tracking_ids = Arc::new(generator);
        self
    }

    /// The backing store
    #[must_use]
    pub fn store(&self) -> &Arc<dyn ComplaintStore> {
        &self.store
    }

    /// Store a new complaint and return it with its tracking code
    ///
    /// `draft` must already be validated. Tracking codes are regenerated until
    /// one is free; a uniqueness conflict on insert also triggers a retry.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails for any reason other than a
    /// tracking code collision.
    pub async fn create(
        &self,
        draft: ComplaintDraft,
        client_address: Option<String>,
    ) -> Result<(Complaint, String)> {
        let mut pending = NewComplaint {
            tracking_id: String::new(),
            draft,
            submitted_ip: client_address,
            submitted_at: Utc::now(),
        };

        loop {
            pending.tracking_id = self.unused_tracking_id().await?;

            match self.store.insert_complaint(&pending).await {
                Ok(complaint) => {
                    info!(
                        tracking_id = %complaint.tracking_id,
                        category = %complaint.category,
                        "Complaint submitted"
                    );
                    let tracking_id = complaint.tracking_id.clone();
                    return Ok((complaint, tracking_id));
                }
                Err(e) if e.is_conflict() => {
                    warn!(
                        tracking_id = %pending.tracking_id,
                        "Tracking code taken at insert, regenerating"
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn unused_tracking_id(&self) -> Result<String> {
        loop {
            let candidate = (self.tracking_ids)();
            if !self.store.tracking_id_exists(&candidate).await? {
                return Ok(candidate);
            }
            warn!(tracking_id = %candidate, "Tracking code collision, regenerating");
        }
    }

    /// Store an attachment for a complaint
    ///
    /// Returns `Ok(None)` when the content is empty or larger than 50 MiB, the
    /// MIME type is not allowed, or the complaint does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the row cannot be
    /// stored. A written file is removed again when the row insert fails.
    pub async fn add_attachment(
        &self,
        complaint_id: ComplaintId,
        filename: &str,
        content: &[u8],
        mime_type: &str,
    ) -> Result<Option<MediaAttachment>> {
        if content.is_empty() {
            warn!(complaint_id, "Rejected empty attachment");
            return Ok(None);
        }
        if content.len() > MAX_ATTACHMENT_SIZE {
            warn!(complaint_id, size = content.len(), "Rejected oversized attachment");
            return Ok(None);
        }
        if !is_allowed_mime_type(mime_type) {
            warn!(complaint_id, mime_type, "Rejected attachment with disallowed MIME type");
            return Ok(None);
        }
        if self.store.get_complaint(complaint_id).await?.is_none() {
            warn!(complaint_id, "Rejected attachment for unknown complaint");
            return Ok(None);
        }

        let file_size = i64::try_from(content.len())
            .map_err(|_| Error::validation("content", "attachment too large"))?;
        let stored_name = generate_storage_filename(filename);
        let relative = PathBuf::from(complaint_id.to_string()).join(&stored_name);
        let file_hash = hash_content(content);

        let file_path = self.storage.write(&relative, content).await?;

        let attachment = NewAttachment {
            complaint_id,
            filename: stored_name,
            original_filename: filename.chars().take(MAX_ORIGINAL_NAME_CHARS).collect(),
            file_path: file_path.to_string_lossy().into_owned(),
            file_size,
            mime_type: mime_type.to_string(),
            media_type: MediaType::from_mime(mime_type),
            file_hash,
            uploaded_at: Utc::now(),
        };

        match self.store.insert_attachment(&attachment).await {
            Ok(stored) => {
                info!(
                    complaint_id,
                    attachment_id = stored.id,
                    media_type = %stored.media_type,
                    size = stored.file_size,
                    "Attachment stored"
                );
                Ok(Some(stored))
            }
            Err(e) => {
                if let Err(cleanup) = self.storage.delete(&file_path).await {
                    warn!(
                        path = %file_path.display(),
                        error = %cleanup,
                        "Failed to remove attachment file after insert failure"
                    );
                }
                Err(e)
            }
        }
    }

    /// Public summary for an exact tracking code
    ///
    /// # Errors
    ///
    /// Returns an error if the store lookup fails.
    pub async fn get_by_tracking_code(&self, code: &str) -> Result<Option<ComplaintPublic>> {
        Ok(self
            .store
            .find_by_tracking_id(code)
            .await?
            .as_ref()
            .map(Complaint::to_public))
    }

    /// Newest complaints first, at most `limit`
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub async fn list(&self, limit: i64) -> Result<Vec<ComplaintPublic>> {
        if limit <= 0 {
            return Ok(Vec::new());
        }
        Ok(to_public(&self.store.list_complaints(limit).await?))
    }

    /// Filtered complaints, newest first, at most [`ComplaintSearch::LIMIT`]
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub async fn search(&self, search: &ComplaintSearch) -> Result<Vec<ComplaintPublic>> {
        Ok(to_public(
            &self
                .store
                .search_complaints(search, ComplaintSearch::LIMIT)
                .await?,
        ))
    }

    /// Aggregate counts over every complaint, computed now
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub async fn statistics(&self) -> Result<ComplaintStatistics> {
        let all = self.store.breakdown(None, None).await?;
        let since = Utc::now() - Duration::days(RECENT_WINDOW_DAYS);
        let recent = self.store.breakdown(Some(since), None).await?;

        Ok(ComplaintStatistics {
            total_complaints: all.total(),
            pending_complaints: all.status_count(ComplaintStatus::Pending),
            resolved_complaints: all.status_count(ComplaintStatus::Resolved),
            recent_complaints: recent.total(),
            by_category: all.by_category,
            by_status: all.by_status,
            by_urgency: all.by_urgency,
        })
    }

    /// Full complaint record
    ///
    /// # Errors
    ///
    /// Returns an error if the store lookup fails.
    pub async fn get_complaint(&self, id: ComplaintId) -> Result<Option<Complaint>> {
        self.store.get_complaint(id).await
    }

    /// Change status, category or urgency; `None` when the complaint does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails.
    pub async fn update_complaint(
        &self,
        id: ComplaintId,
        update: ComplaintUpdate,
    ) -> Result<Option<Complaint>> {
        let updated = self.store.update_complaint(id, &update, Utc::now()).await?;
        if let Some(complaint) = &updated {
            info!(
                tracking_id = %complaint.tracking_id,
                status = %complaint.status,
                "Complaint updated"
            );
        }
        Ok(updated)
    }

    /// Attachments of a complaint, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub async fn list_attachments(&self, id: ComplaintId) -> Result<Vec<MediaAttachment>> {
        self.store.list_attachments(id).await
    }

    /// Add a reviewer note; `None` when the complaint does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails.
    pub async fn add_note(&self, id: ComplaintId, note: &NoteDraft) -> Result<Option<ComplaintNote>> {
        if self.store.get_complaint(id).await?.is_none() {
            return Ok(None);
        }

        match self.store.insert_note(id, note, Utc::now()).await {
            Ok(stored) => Ok(Some(stored)),
            Err(Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Reviewer notes of a complaint, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub async fn list_notes(&self, id: ComplaintId) -> Result<Vec<ComplaintNote>> {
        self.store.list_notes(id).await
    }

    /// Count complaints created in `[period_start, period_end)` and persist the tallies
    ///
    /// # Errors
    ///
    /// Returns a validation error if the period is empty, or a store error.
    pub async fn snapshot_statistics(
        &self,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> Result<ComplaintStatistic> {
        if period_end <= period_start {
            return Err(Error::validation(
                "period_end",
                "must be later than period_start",
            ));
        }

        let breakdown = self
            .store
            .breakdown(Some(period_start), Some(period_end))
            .await?;
        let snapshot = self
            .store
            .insert_statistic(&NewStatistic {
                period_start,
                period_end,
                breakdown,
                generated_at: Utc::now(),
            })
            .await?;

        info!(
            snapshot_id = snapshot.id,
            total = snapshot.total_complaints,
            "Statistics snapshot stored"
        );
        Ok(snapshot)
    }
}

fn to_public(complaints: &[Complaint]) -> Vec<ComplaintPublic> {
    complaints.iter().map(Complaint::to_public).collect()
}
