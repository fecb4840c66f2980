//! Persistence layer — libSQL-backed storage for finished survey responses.

pub mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use traits::{SavedSubmission, SurveyStore};
