//! Behavioural tests for `ComplaintService` over the in-memory store

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use portal_core::types::{
    Breakdown, Complaint, ComplaintCategory, ComplaintDraft, ComplaintId, ComplaintNote,
    ComplaintSearch, ComplaintStatistic, ComplaintStatus, ComplaintUpdate, ComplaintUrgency,
    MediaAttachment, MediaType, NewAttachment, NewComplaint, NewStatistic, NoteDraft,
};
use portal_core::utils::{MAX_ATTACHMENT_SIZE, hash_content, is_tracking_id};
use portal_core::{ComplaintStore, Error, Result};
use portal_database::MemoryStore;
use portal_service::{AttachmentStorage, ComplaintService, FilesystemStorage};
use pretty_assertions::assert_eq;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

fn draft(title: &str, category: ComplaintCategory) -> ComplaintDraft {
    ComplaintDraft {
        title: title.to_string(),
        description: "Detailed description of what happened.".to_string(),
        category,
        ..ComplaintDraft::default()
    }
}

fn service_over(store: Arc<dyn ComplaintStore>, temp_dir: &TempDir) -> ComplaintService {
    let storage = Arc::new(FilesystemStorage::new(temp_dir.path().join("uploads")));
    ComplaintService::new(store, storage)
}

fn memory_service(temp_dir: &TempDir) -> (ComplaintService, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (service_over(store.clone(), temp_dir), store)
}

fn files_under(dir: &Path) -> Vec<PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
        Err(_) => Vec::new(),
    }
}

/// Yields the given codes in order, then falls back to fresh random ones
fn scripted_codes(codes: &[&str]) -> impl Fn() -> String + Send + Sync + 'static {
    let queue = Mutex::new(codes.iter().map(ToString::to_string).collect::<VecDeque<_>>());
    move || {
        queue
            .lock()
            .pop_front()
            .unwrap_or_else(portal_core::utils::generate_tracking_id)
    }
}

/// Wraps `MemoryStore` with switchable faults
#[derive(Debug, Default)]
struct FaultyStore {
    inner: MemoryStore,
    fail_attachment_insert: bool,
    hide_taken_codes: bool,
}

#[async_trait]
impl ComplaintStore for FaultyStore {
    async fn health_check(&self) -> Result<()> {
        self.inner.health_check().await
    }

    async fn tracking_id_exists(&self, tracking_id: &str) -> Result<bool> {
        if self.hide_taken_codes {
            return Ok(false);
        }
        self.inner.tracking_id_exists(tracking_id).await
    }

    async fn insert_complaint(&self, complaint: &NewComplaint) -> Result<Complaint> {
        self.inner.insert_complaint(complaint).await
    }

    async fn get_complaint(&self, id: ComplaintId) -> Result<Option<Complaint>> {
        self.inner.get_complaint(id).await
    }

    async fn find_by_tracking_id(&self, tracking_id: &str) -> Result<Option<Complaint>> {
        self.inner.find_by_tracking_id(tracking_id).await
    }

    async fn list_complaints(&self, limit: i64) -> Result<Vec<Complaint>> {
        self.inner.list_complaints(limit).await
    }

    async fn search_complaints(&self, search: &ComplaintSearch, limit: i64) -> Result<Vec<Complaint>> {
        self.inner.search_complaints(search, limit).await
    }

    async fn update_complaint(
        &self,
        id: ComplaintId,
        update: &ComplaintUpdate,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Complaint>> {
        self.inner.update_complaint(id, update, updated_at).await
    }

    async fn breakdown(
        &self,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Breakdown> {
        self.inner.breakdown(since, until).await
    }

    async fn insert_attachment(&self, attachment: &NewAttachment) -> Result<MediaAttachment> {
        if self.fail_attachment_insert {
            return Err(Error::Database("connection reset".to_string()));
        }
        self.inner.insert_attachment(attachment).await
    }

    async fn list_attachments(&self, complaint_id: ComplaintId) -> Result<Vec<MediaAttachment>> {
        self.inner.list_attachments(complaint_id).await
    }

    async fn insert_note(
        &self,
        complaint_id: ComplaintId,
        note: &NoteDraft,
        created_at: DateTime<Utc>,
    ) -> Result<ComplaintNote> {
        self.inner.insert_note(complaint_id, note, created_at).await
    }

    async fn list_notes(&self, complaint_id: ComplaintId) -> Result<Vec<ComplaintNote>> {
        self.inner.list_notes(complaint_id).await
    }

    async fn insert_statistic(&self, statistic: &NewStatistic) -> Result<ComplaintStatistic> {
        self.inner.insert_statistic(statistic).await
    }
}

#[tokio::test]
async fn create_assigns_pending_status_and_tracking_code() {
    let temp_dir = TempDir::new().unwrap();
    let (service, _) = memory_service(&temp_dir);

    let (complaint, tracking_id) = service
        .create(
            draft("Short", ComplaintCategory::Misconduct),
            Some("192.0.2.10".to_string()),
        )
        .await
        .unwrap();

    assert!(is_tracking_id(&tracking_id), "unexpected code {tracking_id}");
    assert_eq!(complaint.tracking_id, tracking_id);
    assert_eq!(complaint.status, ComplaintStatus::Pending);
    assert_eq!(complaint.urgency, ComplaintUrgency::Medium);
    assert_eq!(complaint.created_at, complaint.updated_at);
    assert_eq!(complaint.submitted_ip.as_deref(), Some("192.0.2.10"));
    assert_eq!(complaint.additional_metadata, serde_json::json!({}));
}

#[tokio::test]
async fn sequential_complaints_get_distinct_codes() {
    let temp_dir = TempDir::new().unwrap();
    let (service, store) = memory_service(&temp_dir);

    let mut codes = std::collections::HashSet::new();
    for i in 0..25 {
        let (_, code) = service
            .create(draft(&format!("Complaint {i}"), ComplaintCategory::Other), None)
            .await
            .unwrap();
        codes.insert(code);
    }

    assert_eq!(codes.len(), 25);
    assert_eq!(store.complaint_count(), 25);
}

#[tokio::test]
async fn create_regenerates_codes_already_in_use() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(MemoryStore::new());
    let service = service_over(store.clone(), &temp_dir)
        .with_tracking_id_generator(scripted_codes(&["PC-AAAAAAAA", "PC-AAAAAAAA", "PC-BBBBBBBB"]));

    let (_, first) = service
        .create(draft("First one", ComplaintCategory::Other), None)
        .await
        .unwrap();
    let (_, second) = service
        .create(draft("Second one", ComplaintCategory::Other), None)
        .await
        .unwrap();

    assert_eq!(first, "PC-AAAAAAAA");
    assert_eq!(second, "PC-BBBBBBBB");
}

#[tokio::test]
async fn create_retries_when_insert_reports_conflict() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(FaultyStore {
        hide_taken_codes: true,
        ..FaultyStore::default()
    });
    let service = service_over(store.clone(), &temp_dir)
        .with_tracking_id_generator(scripted_codes(&["PC-11111111", "PC-11111111", "PC-22222222"]));

    service
        .create(draft("First one", ComplaintCategory::Other), None)
        .await
        .unwrap();
    let (_, second) = service
        .create(draft("Second one", ComplaintCategory::Other), None)
        .await
        .unwrap();

    assert_eq!(second, "PC-22222222");
    assert_eq!(store.inner.complaint_count(), 2);
}

#[tokio::test]
async fn attachment_is_written_hashed_and_recorded() {
    let temp_dir = TempDir::new().unwrap();
    let (service, _) = memory_service(&temp_dir);
    let (complaint, _) = service
        .create(draft("Short", ComplaintCategory::Misconduct), None)
        .await
        .unwrap();

    let attachment = service
        .add_attachment(complaint.id, "test.jpg", b"fake image content", "image/jpeg")
        .await
        .unwrap()
        .expect("attachment should be accepted");

    assert_eq!(attachment.file_size, 18);
    assert_eq!(attachment.media_type, MediaType::Image);
    assert_eq!(attachment.original_filename, "test.jpg");
    assert_eq!(attachment.file_hash, hash_content(b"fake image content"));
    assert_eq!(attachment.file_hash.len(), 64);
    assert!(attachment.is_processed);

    let (token, rest) = attachment.filename.split_once('_').unwrap();
    assert_eq!(token.len(), 32);
    assert_eq!(rest, "test.jpg");

    let expected_dir = temp_dir.path().join("uploads").join(complaint.id.to_string());
    let path = Path::new(&attachment.file_path);
    assert_eq!(path.parent().unwrap(), expected_dir);
    assert_eq!(std::fs::read(path).unwrap(), b"fake image content");

    let listed = service.list_attachments(complaint.id).await.unwrap();
    assert_eq!(listed, vec![attachment]);
}

#[tokio::test]
async fn attachment_rejections_return_none() {
    let temp_dir = TempDir::new().unwrap();
    let (service, store) = memory_service(&temp_dir);
    let (complaint, _) = service
        .create(draft("Short", ComplaintCategory::Other), None)
        .await
        .unwrap();

    let empty = service
        .add_attachment(complaint.id, "empty.txt", b"", "text/plain")
        .await
        .unwrap();
    assert!(empty.is_none());

    let svg = service
        .add_attachment(complaint.id, "drawing.svg", b"<svg/>", "image/svg+xml")
        .await
        .unwrap();
    assert!(svg.is_none());

    let unknown = service
        .add_attachment(complaint.id + 1000, "test.jpg", b"bytes", "image/jpeg")
        .await
        .unwrap();
    assert!(unknown.is_none());

    let oversized = vec![0_u8; MAX_ATTACHMENT_SIZE + 1];
    let too_big = service
        .add_attachment(complaint.id, "big.pdf", &oversized, "application/pdf")
        .await
        .unwrap();
    assert!(too_big.is_none());

    assert_eq!(store.attachment_count(), 0);
    assert!(files_under(&temp_dir.path().join("uploads").join(complaint.id.to_string())).is_empty());
}

#[tokio::test]
async fn attachment_exactly_at_size_cap_is_accepted() {
    let temp_dir = TempDir::new().unwrap();
    let (service, _) = memory_service(&temp_dir);
    let (complaint, _) = service
        .create(draft("Short", ComplaintCategory::Other), None)
        .await
        .unwrap();

    let at_cap = vec![7_u8; MAX_ATTACHMENT_SIZE];
    let stored = service
        .add_attachment(complaint.id, "clip.mp4", &at_cap, "video/mp4")
        .await
        .unwrap()
        .expect("exactly 50 MiB is allowed");

    assert_eq!(stored.file_size, 50 * 1024 * 1024);
    assert_eq!(stored.media_type, MediaType::Video);
}

#[tokio::test]
async fn failed_row_insert_removes_written_file() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(FaultyStore {
        fail_attachment_insert: true,
        ..FaultyStore::default()
    });
    let service = service_over(store.clone(), &temp_dir);
    let (complaint, _) = service
        .create(draft("Short", ComplaintCategory::Other), None)
        .await
        .unwrap();

    let err = service
        .add_attachment(complaint.id, "voice.ogg", b"ogg bytes", "audio/ogg")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Database(ref msg) if msg == "connection reset"));
    let complaint_dir = temp_dir.path().join("uploads").join(complaint.id.to_string());
    assert!(files_under(&complaint_dir).is_empty());
}

/// Writes through to disk but can never remove a file
#[derive(Debug)]
struct UndeletableStorage {
    inner: FilesystemStorage,
}

#[async_trait]
impl AttachmentStorage for UndeletableStorage {
    async fn write(&self, relative: &Path, data: &[u8]) -> Result<PathBuf> {
        self.inner.write(relative, data).await
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        Err(Error::Storage(format!("permission denied: {}", path.display())))
    }
}

#[tokio::test]
async fn failed_cleanup_still_reports_insert_error() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(FaultyStore {
        fail_attachment_insert: true,
        ..FaultyStore::default()
    });
    let storage = Arc::new(UndeletableStorage {
        inner: FilesystemStorage::new(temp_dir.path().join("uploads")),
    });
    let service = ComplaintService::new(store, storage);
    let (complaint, _) = service
        .create(draft("Short", ComplaintCategory::Other), None)
        .await
        .unwrap();

    let err = service
        .add_attachment(complaint.id, "voice.ogg", b"ogg bytes", "audio/ogg")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Database(ref msg) if msg == "connection reset"));
    let complaint_dir = temp_dir.path().join("uploads").join(complaint.id.to_string());
    assert_eq!(files_under(&complaint_dir).len(), 1);
}

#[tokio::test]
async fn non_ascii_filename_keeps_its_extension() {
    let temp_dir = TempDir::new().unwrap();
    let (service, _) = memory_service(&temp_dir);
    let (complaint, _) = service
        .create(draft("Short", ComplaintCategory::Other), None)
        .await
        .unwrap();

    let attachment = service
        .add_attachment(complaint.id, "é漢字.png", b"x", "image/png")
        .await
        .unwrap()
        .expect("attachment should be accepted");

    let (_, rest) = attachment.filename.split_once('_').unwrap();
    assert_eq!(rest, "é漢字.png");
    assert_eq!(attachment.original_filename, "é漢字.png");
    assert!(Path::new(&attachment.file_path).exists());
}

#[tokio::test]
async fn storage_failure_is_propagated() {
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"file in the way").unwrap();

    let store = Arc::new(MemoryStore::new());
    let service = ComplaintService::new(store.clone(), Arc::new(FilesystemStorage::new(&blocker)));
    let (complaint, _) = service
        .create(draft("Short", ComplaintCategory::Other), None)
        .await
        .unwrap();

    let result = service
        .add_attachment(complaint.id, "doc.pdf", b"%PDF-1.7", "application/pdf")
        .await;

    assert!(result.is_err());
    assert_eq!(store.attachment_count(), 0);
}

#[tokio::test]
async fn tracking_lookup_returns_public_summary() {
    let temp_dir = TempDir::new().unwrap();
    let (service, _) = memory_service(&temp_dir);
    let (complaint, code) = service
        .create(draft("Short", ComplaintCategory::Corruption), Some("203.0.113.1".to_string()))
        .await
        .unwrap();

    assert!(service.get_by_tracking_code("PC-00000000").await.unwrap().is_none());

    let summary = service.get_by_tracking_code(&code).await.unwrap().unwrap();
    assert_eq!(summary.tracking_id, code);
    assert_eq!(summary.title, "Short");
    assert_eq!(summary.category, ComplaintCategory::Corruption);
    assert_eq!(summary.status, ComplaintStatus::Pending);
    assert_eq!(summary.created_at, complaint.created_at);
}

#[tokio::test]
async fn search_by_category_is_filtered_and_newest_first() {
    let temp_dir = TempDir::new().unwrap();
    let (service, _) = memory_service(&temp_dir);

    let mut misconduct_codes = Vec::new();
    for (title, category) in [
        ("Misconduct one", ComplaintCategory::Misconduct),
        ("Harassment one", ComplaintCategory::Harassment),
        ("Misconduct two", ComplaintCategory::Misconduct),
    ] {
        let (_, code) = service.create(draft(title, category), None).await.unwrap();
        if category == ComplaintCategory::Misconduct {
            misconduct_codes.push(code);
        }
    }
    misconduct_codes.reverse();

    let results = service
        .search(&ComplaintSearch {
            category: Some(ComplaintCategory::Misconduct),
            ..ComplaintSearch::default()
        })
        .await
        .unwrap();

    assert!(results.iter().all(|c| c.category == ComplaintCategory::Misconduct));
    let codes: Vec<String> = results.into_iter().map(|c| c.tracking_id).collect();
    assert_eq!(codes, misconduct_codes);
}

#[tokio::test]
async fn search_is_capped_at_fifty() {
    let temp_dir = TempDir::new().unwrap();
    let (service, _) = memory_service(&temp_dir);

    for i in 0..55 {
        service
            .create(draft(&format!("Complaint {i}"), ComplaintCategory::Other), None)
            .await
            .unwrap();
    }

    let results = service.search(&ComplaintSearch::default()).await.unwrap();
    assert_eq!(results.len(), 50);

    let listed = service.list(portal_service::DEFAULT_LIST_LIMIT).await.unwrap();
    assert_eq!(listed.len(), 55);
    assert!(listed.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    assert!(service.list(0).await.unwrap().is_empty());
}

#[tokio::test]
async fn statistics_count_every_category() {
    let temp_dir = TempDir::new().unwrap();
    let (service, _) = memory_service(&temp_dir);

    for category in [
        ComplaintCategory::Misconduct,
        ComplaintCategory::Misconduct,
        ComplaintCategory::Harassment,
    ] {
        service.create(draft("Counted", category), None).await.unwrap();
    }

    let stats = service.statistics().await.unwrap();
    assert_eq!(stats.total_complaints, 3);
    assert_eq!(stats.pending_complaints, 3);
    assert_eq!(stats.resolved_complaints, 0);
    assert_eq!(stats.recent_complaints, 3);
    assert_eq!(stats.by_category["misconduct"], 2);
    assert_eq!(stats.by_category["harassment"], 1);
    assert_eq!(stats.by_category["other"], 0);
    assert_eq!(stats.by_category.len(), ComplaintCategory::ALL.len());
    assert_eq!(stats.by_urgency["medium"], 3);
}

#[tokio::test]
async fn admin_update_and_notes() {
    let temp_dir = TempDir::new().unwrap();
    let (service, _) = memory_service(&temp_dir);
    let (complaint, _) = service
        .create(draft("Needs review", ComplaintCategory::Other), None)
        .await
        .unwrap();

    let updated = service
        .update_complaint(
            complaint.id,
            ComplaintUpdate {
                status: Some(ComplaintStatus::Resolved),
                urgency: Some(ComplaintUrgency::High),
                ..ComplaintUpdate::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.status, ComplaintStatus::Resolved);
    assert_eq!(updated.urgency, ComplaintUrgency::High);
    assert_eq!(updated.category, ComplaintCategory::Other);
    assert!(updated.updated_at >= complaint.updated_at);

    let stats = service.statistics().await.unwrap();
    assert_eq!(stats.resolved_complaints, 1);
    assert_eq!(stats.pending_complaints, 0);

    assert!(
        service
            .update_complaint(complaint.id + 50, ComplaintUpdate::default())
            .await
            .unwrap()
            .is_none()
    );

    let note = NoteDraft {
        note: "Contacted the submitter".to_string(),
        created_by: "reviewer-1".to_string(),
    };
    let stored = service.add_note(complaint.id, &note).await.unwrap().unwrap();
    assert_eq!(stored.note, note.note);
    assert!(service.add_note(complaint.id + 50, &note).await.unwrap().is_none());
    assert_eq!(service.list_notes(complaint.id).await.unwrap(), vec![stored]);
}

#[tokio::test]
async fn snapshot_statistics_counts_period() {
    let temp_dir = TempDir::new().unwrap();
    let (service, _) = memory_service(&temp_dir);
    let start = Utc::now() - Duration::minutes(1);

    service
        .create(draft("Inside window", ComplaintCategory::Discrimination), None)
        .await
        .unwrap();

    let end = Utc::now() + Duration::minutes(1);
    let snapshot = service.snapshot_statistics(start, end).await.unwrap();
    assert_eq!(snapshot.total_complaints, 1);
    assert_eq!(snapshot.by_category["discrimination"], 1);
    assert_eq!(snapshot.by_status["pending"], 1);

    let err = service.snapshot_statistics(end, start).await.unwrap_err();
    assert!(matches!(err, Error::Validation { ref field, .. } if field == "period_end"));
}
