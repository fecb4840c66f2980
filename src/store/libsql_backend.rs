//! libSQL backend — async `SurveyStore` implementation.
//!
//! Supports local file and in-memory databases. Each submission is stored
//! as one JSON document row.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::store::migrations;
use crate::store::traits::{SavedSubmission, SurveyStore};
use crate::survey::model::SubmissionRecord;

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let backend = Self::from_database(db)?;
        backend.run_migrations().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let backend = Self::from_database(db)?;
        backend.run_migrations().await?;
        Ok(backend)
    }

    fn from_database(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }

    async fn find_by_submission_id(
        &self,
        submission_id: &str,
    ) -> Result<Option<(String, DateTime<Utc>)>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT id, created_at FROM survey_responses WHERE submission_id = ?1",
                params![submission_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("find_by_submission_id: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let id: String = row
                    .get(0)
                    .map_err(|e| DatabaseError::Query(format!("find_by_submission_id: {e}")))?;
                let created_at: String = row.get(1).unwrap_or_default();
                Ok(Some((id, parse_datetime(&created_at))))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("find_by_submission_id: {e}"))),
        }
    }
}

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

#[async_trait]
impl SurveyStore for LibSqlBackend {
    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(self.conn()).await
    }

    async fn save(&self, record: &SubmissionRecord) -> Result<SavedSubmission, DatabaseError> {
        let submission_id = record.submission_id.to_string();
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let mut stamped = record.clone();
        stamped.timestamp = Some(now);
        let record_json = serde_json::to_string(&stamped)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;

        let inserted = self
            .conn()
            .execute(
                "INSERT INTO survey_responses (id, submission_id, uid, app_version, record, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT (submission_id) DO NOTHING",
                params![
                    id.clone(),
                    submission_id.clone(),
                    record.uid.clone(),
                    record.app_version.clone(),
                    record_json,
                    now.to_rfc3339()
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("save: {e}")))?;

        if inserted == 0 {
            let (existing_id, timestamp) = self
                .find_by_submission_id(&submission_id)
                .await?
                .ok_or_else(|| {
                    DatabaseError::Query(format!(
                        "save: submission {submission_id} conflicted but was not found"
                    ))
                })?;
            debug!(submission_id = %submission_id, id = %existing_id, "Submission already stored");
            return Ok(SavedSubmission {
                id: existing_id,
                timestamp,
                duplicate: true,
            });
        }

        info!(id = %id, uid = %record.uid, "Survey response saved");
        Ok(SavedSubmission {
            id,
            timestamp: now,
            duplicate: false,
        })
    }

    async fn get_submission(&self, id: &str) -> Result<Option<SubmissionRecord>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT record FROM survey_responses WHERE id = ?1",
                params![id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_submission: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let record_json: String = row
                    .get(0)
                    .map_err(|e| DatabaseError::Query(format!("get_submission: {e}")))?;
                let record = serde_json::from_str(&record_json)
                    .map_err(|e| DatabaseError::Serialization(e.to_string()))?;
                Ok(Some(record))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_submission: {e}"))),
        }
    }

    async fn count_by_uid(&self, uid: &str) -> Result<usize, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT COUNT(*) FROM survey_responses WHERE uid = ?1",
                params![uid],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("count_by_uid: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let count: i64 = row.get(0).unwrap_or(0);
                Ok(count as usize)
            }
            Ok(None) => Ok(0),
            Err(e) => Err(DatabaseError::Query(format!("count_by_uid: {e}"))),
        }
    }
}
