use crate::errors::{AppError, Result};
use crate::models::appeal::AppealRecord;
use crate::models::verification::{VerificationRecord, VerificationStatus};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;

/// Timestamps are stored as fixed-width RFC 3339 UTC text so that
/// lexicographic ordering in SQL equals chronological ordering.
fn ts(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

#[derive(Debug)]
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    pub async fn new(database_path: &str) -> Result<Self> {
        // Ensure the directory exists
        if let Some(parent) = Path::new(database_path).parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Database(format!("Failed to create database directory: {}", e))
            })?;
        }

        // Create the database file if it doesn't exist
        if !Path::new(database_path).exists() {
            std::fs::File::create(database_path).map_err(|e| {
                AppError::Database(format!("Failed to create database file: {}", e))
            })?;
        }
        let database_url = format!("sqlite:{}", database_path);

        let pool = SqlitePool::connect(&database_url)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to database: {}", e)))?;

        let db = Self { pool };
        db.create_tables().await?;
        Ok(db)
    }

    /// Single-connection in-memory database, used by tests.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| AppError::Database(format!("Failed to open in-memory database: {}", e)))?;
        let db = Self { pool };
        db.create_tables().await?;
        Ok(db)
    }

    async fn create_tables(&self) -> Result<()> {
        let query = r#"
            CREATE TABLE IF NOT EXISTS verifications (
                id TEXT PRIMARY KEY,
                subject_id TEXT NOT NULL,
                subject_email TEXT NOT NULL,
                id_document_url TEXT NOT NULL,
                residency_proof_url TEXT NOT NULL,
                selfie_url TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                created_at TEXT NOT NULL,
                reviewed_at TEXT,
                comment TEXT,
                appeal_message TEXT,
                appealed_at TEXT
            );

            CREATE TABLE IF NOT EXISTS appeals (
                id TEXT PRIMARY KEY,
                verification_id TEXT NOT NULL,
                subject_id TEXT NOT NULL,
                subject_email TEXT NOT NULL,
                id_document_url TEXT NOT NULL,
                residency_proof_url TEXT NOT NULL,
                selfie_url TEXT NOT NULL,
                message TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                created_at TEXT NOT NULL,
                reviewed_at TEXT,
                comment TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_verifications_subject ON verifications(subject_id, created_at);
            CREATE INDEX IF NOT EXISTS idx_verifications_status ON verifications(status, created_at);
            CREATE INDEX IF NOT EXISTS idx_appeals_status ON appeals(status, created_at);
            CREATE INDEX IF NOT EXISTS idx_appeals_verification ON appeals(verification_id);
        "#;

        sqlx::query(query)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to create tables: {}", e)))?;

        Ok(())
    }

    fn verification_from_row(row: &SqliteRow) -> Result<VerificationRecord> {
        Ok(VerificationRecord {
            id: Uuid::parse_str(&row.get::<String, _>("id"))
                .map_err(|e| AppError::Database(format!("Corrupt verification id: {}", e)))?,
            subject_id: row.get("subject_id"),
            subject_email: row.get("subject_email"),
            id_document_url: row.get("id_document_url"),
            residency_proof_url: row.get("residency_proof_url"),
            selfie_url: row.get("selfie_url"),
            status: VerificationStatus::from_str(&row.get::<String, _>("status"))
                .map_err(|e| AppError::Database(format!("Corrupt verification status: {}", e)))?,
            created_at: parse_ts(&row.get::<String, _>("created_at")).ok_or_else(|| {
                AppError::Database("Corrupt verification created_at timestamp".to_string())
            })?,
            reviewed_at: row
                .get::<Option<String>, _>("reviewed_at")
                .and_then(|s| parse_ts(&s)),
            comment: row.get("comment"),
            appeal_message: row.get("appeal_message"),
            appealed_at: row
                .get::<Option<String>, _>("appealed_at")
                .and_then(|s| parse_ts(&s)),
        })
    }

    fn appeal_from_row(row: &SqliteRow) -> Result<AppealRecord> {
        Ok(AppealRecord {
            id: Uuid::parse_str(&row.get::<String, _>("id"))
                .map_err(|e| AppError::Database(format!("Corrupt appeal id: {}", e)))?,
            verification_id: Uuid::parse_str(&row.get::<String, _>("verification_id"))
                .map_err(|e| AppError::Database(format!("Corrupt appeal back-reference: {}", e)))?,
            subject_id: row.get("subject_id"),
            subject_email: row.get("subject_email"),
            id_document_url: row.get("id_document_url"),
            residency_proof_url: row.get("residency_proof_url"),
            selfie_url: row.get("selfie_url"),
            message: row.get("message"),
            status: VerificationStatus::from_str(&row.get::<String, _>("status"))
                .map_err(|e| AppError::Database(format!("Corrupt appeal status: {}", e)))?,
            created_at: parse_ts(&row.get::<String, _>("created_at")).ok_or_else(|| {
                AppError::Database("Corrupt appeal created_at timestamp".to_string())
            })?,
            reviewed_at: row
                .get::<Option<String>, _>("reviewed_at")
                .and_then(|s| parse_ts(&s)),
            comment: row.get("comment"),
        })
    }

    // ------------------------
    // Verifications
    // ------------------------

    pub async fn create_verification(&self, record: &VerificationRecord) -> Result<()> {
        let query = r#"
            INSERT INTO verifications (id, subject_id, subject_email, id_document_url, residency_proof_url, selfie_url, status, created_at, reviewed_at, comment, appeal_message, appealed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#;
        sqlx::query(query)
            .bind(record.id.to_string())
            .bind(&record.subject_id)
            .bind(&record.subject_email)
            .bind(&record.id_document_url)
            .bind(&record.residency_proof_url)
            .bind(&record.selfie_url)
            .bind(record.status.as_str())
            .bind(ts(&record.created_at))
            .bind(record.reviewed_at.as_ref().map(ts))
            .bind(&record.comment)
            .bind(&record.appeal_message)
            .bind(record.appealed_at.as_ref().map(ts))
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to create verification: {}", e)))?;
        Ok(())
    }

    pub async fn get_verification(&self, id: &Uuid) -> Result<Option<VerificationRecord>> {
        let row = sqlx::query("SELECT * FROM verifications WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to fetch verification: {}", e)))?;
        row.as_ref().map(Self::verification_from_row).transpose()
    }

    /// Most recent record for a subject; id breaks creation-time ties.
    pub async fn latest_verification_for_subject(
        &self,
        subject_id: &str,
    ) -> Result<Option<VerificationRecord>> {
        let query = r#"
            SELECT * FROM verifications WHERE subject_id = ?1
            ORDER BY created_at DESC, id DESC LIMIT 1
        "#;
        let row = sqlx::query(query)
            .bind(subject_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to fetch latest verification: {}", e)))?;
        row.as_ref().map(Self::verification_from_row).transpose()
    }

    /// Applies a review outcome. `comment = None` clears any previous
    /// rejection reason. Errors with NotFound when the record is gone so
    /// cascade callers can observe the failure.
    pub async fn update_verification_review(
        &self,
        id: &Uuid,
        status: VerificationStatus,
        reviewed_at: DateTime<Utc>,
        comment: Option<&str>,
    ) -> Result<()> {
        let query = r#"
            UPDATE verifications SET status = ?1, reviewed_at = ?2, comment = ?3 WHERE id = ?4
        "#;
        let result = sqlx::query(query)
            .bind(status.as_str())
            .bind(ts(&reviewed_at))
            .bind(comment)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to update verification: {}", e)))?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Verification not found".to_string()));
        }
        Ok(())
    }

    /// Appeal filing reopens the record: back to pending, review fields
    /// cleared, appeal message and time recorded.
    pub async fn reopen_verification(
        &self,
        id: &Uuid,
        appeal_message: &str,
        appealed_at: DateTime<Utc>,
    ) -> Result<()> {
        let query = r#"
            UPDATE verifications
            SET status = 'pending', reviewed_at = NULL, comment = NULL, appeal_message = ?1, appealed_at = ?2
            WHERE id = ?3
        "#;
        let result = sqlx::query(query)
            .bind(appeal_message)
            .bind(ts(&appealed_at))
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to reopen verification: {}", e)))?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Verification not found".to_string()));
        }
        Ok(())
    }

    pub async fn delete_verification(&self, id: &Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM verifications WHERE id = ?1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete verification: {}", e)))?;
        Ok(result.rows_affected() > 0)
    }

    /// Keyset page: newest first, strictly after the cursor position when one
    /// is given.
    pub async fn list_verifications_page(
        &self,
        status: VerificationStatus,
        limit: i64,
        after: Option<(DateTime<Utc>, Uuid)>,
    ) -> Result<Vec<VerificationRecord>> {
        let rows = match after {
            Some((created_at, id)) => {
                let query = r#"
                    SELECT * FROM verifications
                    WHERE status = ?1 AND (created_at < ?2 OR (created_at = ?2 AND id < ?3))
                    ORDER BY created_at DESC, id DESC LIMIT ?4
                "#;
                sqlx::query(query)
                    .bind(status.as_str())
                    .bind(ts(&created_at))
                    .bind(id.to_string())
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                let query = r#"
                    SELECT * FROM verifications WHERE status = ?1
                    ORDER BY created_at DESC, id DESC LIMIT ?2
                "#;
                sqlx::query(query)
                    .bind(status.as_str())
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(|e| AppError::Database(format!("Failed to list verifications: {}", e)))?;

        rows.iter().map(Self::verification_from_row).collect()
    }

    pub async fn count_verifications(&self, status: VerificationStatus) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM verifications WHERE status = ?1")
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to count verifications: {}", e)))
    }

    // ------------------------
    // Appeals
    // ------------------------

    pub async fn create_appeal(&self, appeal: &AppealRecord) -> Result<()> {
        let query = r#"
            INSERT INTO appeals (id, verification_id, subject_id, subject_email, id_document_url, residency_proof_url, selfie_url, message, status, created_at, reviewed_at, comment)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#;
        sqlx::query(query)
            .bind(appeal.id.to_string())
            .bind(appeal.verification_id.to_string())
            .bind(&appeal.subject_id)
            .bind(&appeal.subject_email)
            .bind(&appeal.id_document_url)
            .bind(&appeal.residency_proof_url)
            .bind(&appeal.selfie_url)
            .bind(&appeal.message)
            .bind(appeal.status.as_str())
            .bind(ts(&appeal.created_at))
            .bind(appeal.reviewed_at.as_ref().map(ts))
            .bind(&appeal.comment)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to create appeal: {}", e)))?;
        Ok(())
    }

    pub async fn get_appeal(&self, id: &Uuid) -> Result<Option<AppealRecord>> {
        let row = sqlx::query("SELECT * FROM appeals WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to fetch appeal: {}", e)))?;
        row.as_ref().map(Self::appeal_from_row).transpose()
    }

    pub async fn update_appeal_review(
        &self,
        id: &Uuid,
        status: VerificationStatus,
        reviewed_at: DateTime<Utc>,
        comment: Option<&str>,
    ) -> Result<()> {
        let query = r#"
            UPDATE appeals SET status = ?1, reviewed_at = ?2, comment = ?3 WHERE id = ?4
        "#;
        let result = sqlx::query(query)
            .bind(status.as_str())
            .bind(ts(&reviewed_at))
            .bind(comment)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to update appeal: {}", e)))?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Appeal not found".to_string()));
        }
        Ok(())
    }

    pub async fn list_appeals_page(
        &self,
        status: VerificationStatus,
        limit: i64,
        after: Option<(DateTime<Utc>, Uuid)>,
    ) -> Result<Vec<AppealRecord>> {
        let rows = match after {
            Some((created_at, id)) => {
                let query = r#"
                    SELECT * FROM appeals
                    WHERE status = ?1 AND (created_at < ?2 OR (created_at = ?2 AND id < ?3))
                    ORDER BY created_at DESC, id DESC LIMIT ?4
                "#;
                sqlx::query(query)
                    .bind(status.as_str())
                    .bind(ts(&created_at))
                    .bind(id.to_string())
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                let query = r#"
                    SELECT * FROM appeals WHERE status = ?1
                    ORDER BY created_at DESC, id DESC LIMIT ?2
                "#;
                sqlx::query(query)
                    .bind(status.as_str())
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(|e| AppError::Database(format!("Failed to list appeals: {}", e)))?;

        rows.iter().map(Self::appeal_from_row).collect()
    }

    pub async fn count_appeals(&self, status: VerificationStatus) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM appeals WHERE status = ?1")
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to count appeals: {}", e)))
    }
}
