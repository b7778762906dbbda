//! Database query operations for the complaint portal

use crate::models::{ComplaintDb, ComplaintNoteDb, ComplaintStatisticDb, MediaAttachmentDb};
use chrono::{DateTime, Utc};
use portal_core::types::{
    Breakdown, ComplaintId, ComplaintSearch, ComplaintUpdate, NewAttachment, NewComplaint,
    NewStatistic, NoteDraft,
};
use portal_core::{Error, Result};
use sqlx::types::Json;
use sqlx::{PgPool, Row};

/// Translate a sqlx error, surfacing constraint violations as domain errors
fn map_db_error(e: sqlx::Error, resource: impl FnOnce() -> String) -> Error {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => Error::Conflict {
            resource: resource(),
        },
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => Error::NotFound {
            resource: resource(),
        },
        _ => Error::Database(e.to_string()),
    }
}

/// Complaint database operations
#[derive(Debug)]
pub struct ComplaintQueries;

impl ComplaintQueries {
    /// Insert a new complaint with status `pending`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conflict`] if the tracking code is already taken, or
    /// [`Error::Database`] if the query fails.
    pub async fn insert(pool: &PgPool, complaint: &NewComplaint) -> Result<ComplaintDb> {
        let query = r"
            INSERT INTO complaints (
                tracking_id, title, description, category, urgency,
                incident_date, incident_location, officer_badge_number, officer_name,
                contact_email, contact_phone, status, created_at, updated_at,
                submitted_ip, additional_metadata
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'pending', $12, $12, $13, '{}'::jsonb
            )
            RETURNING *
        ";

        let draft = &complaint.draft;
        sqlx::query_as::<_, ComplaintDb>(query)
            .bind(&complaint.tracking_id)
            .bind(&draft.title)
            .bind(&draft.description)
            .bind(draft.category.as_str())
            .bind(draft.urgency.as_str())
            .bind(draft.incident_date)
            .bind(&draft.incident_location)
            .bind(&draft.officer_badge_number)
            .bind(&draft.officer_name)
            .bind(&draft.contact_email)
            .bind(&draft.contact_phone)
            .bind(complaint.submitted_at)
            .bind(&complaint.submitted_ip)
            .fetch_one(pool)
            .await
            .map_err(|e| map_db_error(e, || format!("tracking_id {}", complaint.tracking_id)))
    }

    /// Whether any complaint holds `tracking_id`
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn tracking_id_exists(pool: &PgPool, tracking_id: &str) -> Result<bool> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM complaints WHERE tracking_id = $1) AS taken")
            .bind(tracking_id)
            .fetch_one(pool)
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(row.get("taken"))
    }

    /// Find complaint by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(pool: &PgPool, id: ComplaintId) -> Result<Option<ComplaintDb>> {
        sqlx::query_as::<_, ComplaintDb>("SELECT * FROM complaints WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    /// Find complaint by exact tracking code
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_tracking_id(pool: &PgPool, tracking_id: &str) -> Result<Option<ComplaintDb>> {
        sqlx::query_as::<_, ComplaintDb>("SELECT * FROM complaints WHERE tracking_id = $1")
            .bind(tracking_id)
            .fetch_optional(pool)
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    /// Newest complaints first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_recent(pool: &PgPool, limit: i64) -> Result<Vec<ComplaintDb>> {
        let query = r"
            SELECT * FROM complaints
            ORDER BY created_at DESC, id DESC
            LIMIT $1
        ";

        sqlx::query_as::<_, ComplaintDb>(query)
            .bind(limit.max(0))
            .fetch_all(pool)
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    /// Filtered search, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn search(
        pool: &PgPool,
        search: &ComplaintSearch,
        limit: i64,
    ) -> Result<Vec<ComplaintDb>> {
        let query = r"
            SELECT * FROM complaints
            WHERE ($1::text IS NULL OR category = $1)
              AND ($2::text IS NULL OR status = $2)
              AND ($3::text IS NULL OR urgency = $3)
              AND ($4::text IS NULL OR strpos(upper(tracking_id), $4) > 0)
              AND ($5::text IS NULL OR strpos(lower(incident_location), $5) > 0)
              AND ($6::timestamptz IS NULL OR created_at >= $6)
              AND ($7::timestamptz IS NULL OR created_at <= $7)
            ORDER BY created_at DESC, id DESC
            LIMIT $8
        ";

        sqlx::query_as::<_, ComplaintDb>(query)
            .bind(search.category.map(|c| c.as_str()))
            .bind(search.status.map(|s| s.as_str()))
            .bind(search.urgency.map(|u| u.as_str()))
            .bind(search.tracking_pattern())
            .bind(search.location_pattern())
            .bind(search.date_from)
            .bind(search.date_to)
            .bind(limit.max(0))
            .fetch_all(pool)
            .await
            .map_err(|e| {
                tracing::error!("Complaint search failed: {}", e);
                Error::Database(e.to_string())
            })
    }

    /// Apply an administrative update
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn update(
        pool: &PgPool,
        id: ComplaintId,
        update: &ComplaintUpdate,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<ComplaintDb>> {
        let query = r"
            UPDATE complaints SET
                status = COALESCE($2, status),
                category = COALESCE($3, category),
                urgency = COALESCE($4, urgency),
                updated_at = $5
            WHERE id = $1
            RETURNING *
        ";

        sqlx::query_as::<_, ComplaintDb>(query)
            .bind(id)
            .bind(update.status.map(|s| s.as_str()))
            .bind(update.category.map(|c| c.as_str()))
            .bind(update.urgency.map(|u| u.as_str()))
            .bind(updated_at)
            .fetch_optional(pool)
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    /// Tally complaints created in `[since, until)`
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn breakdown(
        pool: &PgPool,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Breakdown> {
        let query = r"
            SELECT category, status, urgency, COUNT(*) AS count
            FROM complaints
            WHERE ($1::timestamptz IS NULL OR created_at >= $1)
              AND ($2::timestamptz IS NULL OR created_at < $2)
            GROUP BY category, status, urgency
        ";

        let rows = sqlx::query(query)
            .bind(since)
            .bind(until)
            .fetch_all(pool)
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        let mut breakdown = Breakdown::default();
        for row in rows {
            let count: i64 = row.get("count");
            breakdown.add_category(row.get("category"), count);
            breakdown.add_status(row.get("status"), count);
            breakdown.add_urgency(row.get("urgency"), count);
        }

        Ok(breakdown)
    }
}

/// Attachment database operations
#[derive(Debug)]
pub struct AttachmentQueries;

impl AttachmentQueries {
    /// Insert an attachment row, marked as processed
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the complaint does not exist, or
    /// [`Error::Database`] if the query fails.
    pub async fn insert(pool: &PgPool, attachment: &NewAttachment) -> Result<MediaAttachmentDb> {
        let query = r"
            INSERT INTO media_attachments (
                complaint_id, filename, original_filename, file_path, file_size,
                mime_type, media_type, file_hash, uploaded_at, is_processed
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, TRUE)
            RETURNING *
        ";

        sqlx::query_as::<_, MediaAttachmentDb>(query)
            .bind(attachment.complaint_id)
            .bind(&attachment.filename)
            .bind(&attachment.original_filename)
            .bind(&attachment.file_path)
            .bind(attachment.file_size)
            .bind(&attachment.mime_type)
            .bind(attachment.media_type.as_str())
            .bind(&attachment.file_hash)
            .bind(attachment.uploaded_at)
            .fetch_one(pool)
            .await
            .map_err(|e| map_db_error(e, || format!("complaint {}", attachment.complaint_id)))
    }

    /// Attachments of a complaint, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_complaint(
        pool: &PgPool,
        complaint_id: ComplaintId,
    ) -> Result<Vec<MediaAttachmentDb>> {
        sqlx::query_as::<_, MediaAttachmentDb>(
            "SELECT * FROM media_attachments WHERE complaint_id = $1 ORDER BY uploaded_at, id",
        )
        .bind(complaint_id)
        .fetch_all(pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))
    }
}

/// Reviewer note database operations
#[derive(Debug)]
pub struct NoteQueries;

impl NoteQueries {
    /// Insert a note
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the complaint does not exist, or
    /// [`Error::Database`] if the query fails.
    pub async fn insert(
        pool: &PgPool,
        complaint_id: ComplaintId,
        note: &NoteDraft,
        created_at: DateTime<Utc>,
    ) -> Result<ComplaintNoteDb> {
        let query = r"
            INSERT INTO complaint_notes (complaint_id, note, created_by, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
        ";

        sqlx::query_as::<_, ComplaintNoteDb>(query)
            .bind(complaint_id)
            .bind(&note.note)
            .bind(&note.created_by)
            .bind(created_at)
            .fetch_one(pool)
            .await
            .map_err(|e| map_db_error(e, || format!("complaint {complaint_id}")))
    }

    /// Notes of a complaint, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_complaint(
        pool: &PgPool,
        complaint_id: ComplaintId,
    ) -> Result<Vec<ComplaintNoteDb>> {
        sqlx::query_as::<_, ComplaintNoteDb>(
            "SELECT * FROM complaint_notes WHERE complaint_id = $1 ORDER BY created_at, id",
        )
        .bind(complaint_id)
        .fetch_all(pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))
    }
}

/// Statistics snapshot database operations
#[derive(Debug)]
pub struct StatisticQueries;

impl StatisticQueries {
    /// Persist a snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn insert(pool: &PgPool, statistic: &NewStatistic) -> Result<ComplaintStatisticDb> {
        let query = r"
            INSERT INTO complaint_statistics (
                period_start, period_end, total_complaints,
                by_category, by_status, by_urgency, generated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
        ";

        let breakdown = &statistic.breakdown;
        sqlx::query_as::<_, ComplaintStatisticDb>(query)
            .bind(statistic.period_start)
            .bind(statistic.period_end)
            .bind(breakdown.total())
            .bind(Json(&breakdown.by_category))
            .bind(Json(&breakdown.by_status))
            .bind(Json(&breakdown.by_urgency))
            .bind(statistic.generated_at)
            .fetch_one(pool)
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, clippy::unwrap_used)]
mod tests {
    use super::*;
    use portal_core::types::{ComplaintCategory, ComplaintDraft, ComplaintStatus};
    use portal_core::utils::generate_tracking_id;
    use pretty_assertions::assert_eq;

    async fn create_test_pool() -> Option<PgPool> {
        // Check if TEST_DATABASE_URL is set, if not, skip the test
        let database_url = std::env::var("TEST_DATABASE_URL").ok()?;
        match PgPool::connect(&database_url).await {
            Ok(pool) => {
                if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
                    eprintln!("Failed to migrate test database: {e}");
                    return None;
                }
                Some(pool)
            }
            Err(e) => {
                eprintln!("Failed to connect to database: {e}");
                None
            }
        }
    }

    fn new_complaint(category: ComplaintCategory) -> NewComplaint {
        NewComplaint {
            tracking_id: generate_tracking_id(),
            draft: ComplaintDraft {
                title: "Query test complaint".to_string(),
                description: "Inserted by the query test suite.".to_string(),
                category,
                incident_location: Some("Harbor District".to_string()),
                ..ComplaintDraft::default()
            },
            submitted_ip: Some("198.51.100.4".to_string()),
            submitted_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_complaint() -> Result<()> {
        let Some(pool) = create_test_pool().await else {
            eprintln!("Skipping test: TEST_DATABASE_URL not set or database not available");
            return Ok(());
        };

        let new = new_complaint(ComplaintCategory::Corruption);
        let row = ComplaintQueries::insert(&pool, &new).await?;

        assert_eq!(row.tracking_id, new.tracking_id);
        assert_eq!(row.status, "pending");
        assert_eq!(row.created_at, row.updated_at);
        assert!(ComplaintQueries::tracking_id_exists(&pool, &new.tracking_id).await?);

        let found = ComplaintQueries::find_by_tracking_id(&pool, &new.tracking_id).await?;
        assert_eq!(found.map(|c| c.id), Some(row.id));
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_tracking_id_is_conflict() -> Result<()> {
        let Some(pool) = create_test_pool().await else {
            eprintln!("Skipping test: TEST_DATABASE_URL not set or database not available");
            return Ok(());
        };

        let new = new_complaint(ComplaintCategory::Other);
        ComplaintQueries::insert(&pool, &new).await?;

        let err = ComplaintQueries::insert(&pool, &new).await.unwrap_err();
        assert!(err.is_conflict(), "expected conflict, got {err}");
        Ok(())
    }

    #[tokio::test]
    async fn test_update_sets_status_and_timestamp() -> Result<()> {
        let Some(pool) = create_test_pool().await else {
            eprintln!("Skipping test: TEST_DATABASE_URL not set or database not available");
            return Ok(());
        };

        let row = ComplaintQueries::insert(&pool, &new_complaint(ComplaintCategory::Misconduct)).await?;
        let later = row.updated_at + chrono::Duration::minutes(5);
        let update = ComplaintUpdate {
            status: Some(ComplaintStatus::Resolved),
            ..ComplaintUpdate::default()
        };

        let updated = ComplaintQueries::update(&pool, row.id, &update, later)
            .await?
            .unwrap();
        assert_eq!(updated.status, "resolved");
        assert_eq!(updated.category, "misconduct");
        assert_eq!(updated.updated_at, later);
        Ok(())
    }

    #[tokio::test]
    async fn test_attachment_for_missing_complaint_is_not_found() -> Result<()> {
        let Some(pool) = create_test_pool().await else {
            eprintln!("Skipping test: TEST_DATABASE_URL not set or database not available");
            return Ok(());
        };

        let attachment = NewAttachment {
            complaint_id: i64::MAX,
            filename: "x_test.txt".to_string(),
            original_filename: "test.txt".to_string(),
            file_path: "/tmp/x_test.txt".to_string(),
            file_size: 4,
            mime_type: "text/plain".to_string(),
            media_type: portal_core::MediaType::Document,
            file_hash: portal_core::utils::hash_content(b"test"),
            uploaded_at: Utc::now(),
        };

        let err = AttachmentQueries::insert(&pool, &attachment).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_search_by_tracking_fragment() -> Result<()> {
        let Some(pool) = create_test_pool().await else {
            eprintln!("Skipping test: TEST_DATABASE_URL not set or database not available");
            return Ok(());
        };

        let new = new_complaint(ComplaintCategory::Discrimination);
        ComplaintQueries::insert(&pool, &new).await?;

        let fragment = new.tracking_id.get(3..9).unwrap().to_lowercase();
        let search = ComplaintSearch {
            tracking_id: Some(fragment),
            category: Some(ComplaintCategory::Discrimination),
            location: Some("harbor".to_string()),
            ..ComplaintSearch::default()
        };

        let rows = ComplaintQueries::search(&pool, &search, ComplaintSearch::LIMIT).await?;
        assert!(rows.iter().any(|r| r.tracking_id == new.tracking_id));
        assert!(rows.iter().all(|r| r.category == "discrimination"));
        Ok(())
    }
}
