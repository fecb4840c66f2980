//! `SurveyStore` trait — async interface to the response document store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::DatabaseError;
use crate::survey::model::SubmissionRecord;

/// Outcome of saving a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedSubmission {
    /// Document id assigned by the store.
    pub id: String,
    /// Server-side write time.
    pub timestamp: DateTime<Utc>,
    /// True when a record with the same `submission_id` already existed and
    /// nothing new was written.
    pub duplicate: bool,
}

/// Backend-agnostic store for finished survey responses.
#[async_trait]
pub trait SurveyStore: Send + Sync {
    /// Run all pending schema migrations.
    async fn run_migrations(&self) -> Result<(), DatabaseError>;

    /// Write a finished response as one document. The store stamps the
    /// timestamp. Saving a `submission_id` that is already stored returns
    /// the existing document.
    async fn save(&self, record: &SubmissionRecord) -> Result<SavedSubmission, DatabaseError>;

    /// Fetch a stored document by id.
    async fn get_submission(&self, id: &str) -> Result<Option<SubmissionRecord>, DatabaseError>;

    /// Number of documents stored for an identity.
    async fn count_by_uid(&self, uid: &str) -> Result<usize, DatabaseError>;
}
