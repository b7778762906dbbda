//! In-process [`ComplaintStore`] for tests and local development
//!
//! Mirrors the constraints of the PostgreSQL schema: tracking codes are
//! unique and attachments or notes must reference an existing complaint.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use portal_core::types::{
    Breakdown, Complaint, ComplaintId, ComplaintNote, ComplaintSearch, ComplaintStatistic,
    ComplaintStatus, ComplaintUpdate, MediaAttachment, NewAttachment, NewComplaint, NewStatistic,
    NoteDraft,
};
use portal_core::{ComplaintStore, Error, Result};
use std::cmp::Reverse;

#[derive(Debug, Default)]
struct Tables {
    complaints: Vec<Complaint>,
    attachments: Vec<MediaAttachment>,
    notes: Vec<ComplaintNote>,
    statistics: Vec<ComplaintStatistic>,
    next_id: i64,
}

impl Tables {
    const fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn has_complaint(&self, id: ComplaintId) -> bool {
        self.complaints.iter().any(|c| c.id == id)
    }

    fn newest_first(&self, keep: impl Fn(&Complaint) -> bool, limit: i64) -> Vec<Complaint> {
        let mut rows: Vec<Complaint> = self.complaints.iter().filter(|c| keep(c)).cloned().collect();
        rows.sort_by_key(|c| Reverse((c.created_at, c.id)));
        rows.truncate(usize::try_from(limit).unwrap_or(0));
        rows
    }
}

/// Store that keeps everything in memory behind a lock
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored complaints
    #[must_use]
    pub fn complaint_count(&self) -> usize {
        self.tables.read().complaints.len()
    }

    /// Number of stored attachment rows
    #[must_use]
    pub fn attachment_count(&self) -> usize {
        self.tables.read().attachments.len()
    }
}

#[async_trait]
impl ComplaintStore for MemoryStore {
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }

    async fn tracking_id_exists(&self, tracking_id: &str) -> Result<bool> {
        Ok(self
            .tables
            .read()
            .complaints
            .iter()
            .any(|c| c.tracking_id == tracking_id))
    }

    async fn insert_complaint(&self, complaint: &NewComplaint) -> Result<Complaint> {
        let mut tables = self.tables.write();
        if tables
            .complaints
            .iter()
            .any(|c| c.tracking_id == complaint.tracking_id)
        {
            return Err(Error::Conflict {
                resource: format!("tracking_id {}", complaint.tracking_id),
            });
        }

        let draft = complaint.draft.clone();
        let stored = Complaint {
            id: tables.allocate_id(),
            tracking_id: complaint.tracking_id.clone(),
            title: draft.title,
            description: draft.description,
            category: draft.category,
            urgency: draft.urgency,
            incident_date: draft.incident_date,
            incident_location: draft.incident_location,
            officer_badge_number: draft.officer_badge_number,
            officer_name: draft.officer_name,
            contact_email: draft.contact_email,
            contact_phone: draft.contact_phone,
            status: ComplaintStatus::Pending,
            created_at: complaint.submitted_at,
            updated_at: complaint.submitted_at,
            submitted_ip: complaint.submitted_ip.clone(),
            additional_metadata: serde_json::json!({}),
        };
        tables.complaints.push(stored.clone());
        Ok(stored)
    }

    async fn get_complaint(&self, id: ComplaintId) -> Result<Option<Complaint>> {
        Ok(self
            .tables
            .read()
            .complaints
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn find_by_tracking_id(&self, tracking_id: &str) -> Result<Option<Complaint>> {
        Ok(self
            .tables
            .read()
            .complaints
            .iter()
            .find(|c| c.tracking_id == tracking_id)
            .cloned())
    }

    async fn list_complaints(&self, limit: i64) -> Result<Vec<Complaint>> {
        Ok(self.tables.read().newest_first(|_| true, limit))
    }

    async fn search_complaints(
        &self,
        search: &ComplaintSearch,
        limit: i64,
    ) -> Result<Vec<Complaint>> {
        Ok(self
            .tables
            .read()
            .newest_first(|c| search.matches(c), limit))
    }

    async fn update_complaint(
        &self,
        id: ComplaintId,
        update: &ComplaintUpdate,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Complaint>> {
        let mut tables = self.tables.write();
        let Some(complaint) = tables.complaints.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };

        if let Some(status) = update.status {
            complaint.status = status;
        }
        if let Some(category) = update.category {
            complaint.category = category;
        }
        if let Some(urgency) = update.urgency {
            complaint.urgency = urgency;
        }
        complaint.updated_at = updated_at;

        Ok(Some(complaint.clone()))
    }

    async fn breakdown(
        &self,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Breakdown> {
        let tables = self.tables.read();
        let mut breakdown = Breakdown::default();
        tables
            .complaints
            .iter()
            .filter(|c| since.is_none_or(|s| c.created_at >= s))
            .filter(|c| until.is_none_or(|u| c.created_at < u))
            .for_each(|c| breakdown.record(c.category, c.status, c.urgency));
        Ok(breakdown)
    }

    async fn insert_attachment(&self, attachment: &NewAttachment) -> Result<MediaAttachment> {
        let mut tables = self.tables.write();
        if !tables.has_complaint(attachment.complaint_id) {
            return Err(Error::NotFound {
                resource: format!("complaint {}", attachment.complaint_id),
            });
        }

        let stored = MediaAttachment {
            id: tables.allocate_id(),
            complaint_id: attachment.complaint_id,
            filename: attachment.filename.clone(),
            original_filename: attachment.original_filename.clone(),
            file_path: attachment.file_path.clone(),
            file_size: attachment.file_size,
            mime_type: attachment.mime_type.clone(),
            media_type: attachment.media_type,
            file_hash: attachment.file_hash.clone(),
            uploaded_at: attachment.uploaded_at,
            is_processed: true,
        };
        tables.attachments.push(stored.clone());
        Ok(stored)
    }

    async fn list_attachments(&self, complaint_id: ComplaintId) -> Result<Vec<MediaAttachment>> {
        Ok(self
            .tables
            .read()
            .attachments
            .iter()
            .filter(|a| a.complaint_id == complaint_id)
            .cloned()
            .collect())
    }

    async fn insert_note(
        &self,
        complaint_id: ComplaintId,
        note: &NoteDraft,
        created_at: DateTime<Utc>,
    ) -> Result<ComplaintNote> {
        let mut tables = self.tables.write();
        if !tables.has_complaint(complaint_id) {
            return Err(Error::NotFound {
                resource: format!("complaint {complaint_id}"),
            });
        }

        let stored = ComplaintNote {
            id: tables.allocate_id(),
            complaint_id,
            note: note.note.clone(),
            created_by: note.created_by.clone(),
            created_at,
        };
        tables.notes.push(stored.clone());
        Ok(stored)
    }

    async fn list_notes(&self, complaint_id: ComplaintId) -> Result<Vec<ComplaintNote>> {
        Ok(self
            .tables
            .read()
            .notes
            .iter()
            .filter(|n| n.complaint_id == complaint_id)
            .cloned()
            .collect())
    }

    async fn insert_statistic(&self, statistic: &NewStatistic) -> Result<ComplaintStatistic> {
        let mut tables = self.tables.write();
        let breakdown = &statistic.breakdown;
        let stored = ComplaintStatistic {
            id: tables.allocate_id(),
            period_start: statistic.period_start,
            period_end: statistic.period_end,
            total_complaints: breakdown.total(),
            by_category: breakdown.by_category.clone(),
            by_status: breakdown.by_status.clone(),
            by_urgency: breakdown.by_urgency.clone(),
            generated_at: statistic.generated_at,
        };
        tables.statistics.push(stored.clone());
        Ok(stored)
    }
}
