//! Saved-translation storage
//!
//! [`RecordStore`] is the small key/list/delete interface the rest of the
//! crate uses to persist translated chapters. Two implementations ship with
//! the crate: [`SqliteRecordStore`] for real use and [`MemoryRecordStore`] for
//! tests and embedding. Read-modify-write edits go through
//! [`RecordStore::update`], which each store runs atomically per record id.

pub mod locks;
pub mod memory;
pub mod sqlite;

pub use locks::RecordLocks;
pub use memory::MemoryRecordStore;
pub use sqlite::SqliteRecordStore;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

/// Error types for persistence operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// Database query or connection error
    #[error("Database error: {0}")]
    Database(String),
    /// File I/O error
    #[error("IO error: {0}")]
    Io(String),
    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(String),
    /// Stored data is not in a supported shape
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<sqlx::Error> for PersistenceError {
    fn from(e: sqlx::Error) -> Self {
        PersistenceError::Database(e.to_string())
    }
}

/// A translated chapter stored for a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SavedTranslation {
    /// Unique identifier of the record
    pub id: String,
    /// Project the record belongs to
    pub project_id: String,
    /// Display name, e.g. "Chapter 3"
    pub name: String,
    /// Full translated text
    pub text: String,
    /// When the record was created (RFC 3339)
    pub timestamp: String,
}

impl SavedTranslation {
    /// Create a record with a fresh id and the current time
    pub fn new(project_id: &str, name: &str, text: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            project_id: project_id.to_string(),
            name: name.to_string(),
            text: text.to_string(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// In-place edit applied to a stored record
pub type RecordEdit = Box<dyn FnOnce(&mut SavedTranslation) + Send>;

/// Persisted-record gateway
///
/// `put` upserts by id, `delete` is a no-op for unknown ids, and
/// `list_by_project` makes no ordering promise.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert or replace a record by id
    async fn put(&self, record: &SavedTranslation) -> Result<(), PersistenceError>;

    /// Remove a record; succeeds if it does not exist
    async fn delete(&self, id: &str) -> Result<(), PersistenceError>;

    /// Apply `edit` to a stored record and persist the result
    ///
    /// No other write to the same id may land between the read and the
    /// write. Returns `None` when the record does not exist.
    async fn update(
        &self,
        id: &str,
        edit: RecordEdit,
    ) -> Result<Option<SavedTranslation>, PersistenceError>;

    /// Fetch a single record
    async fn get(&self, id: &str) -> Result<Option<SavedTranslation>, PersistenceError>;

    /// All records of a project, unordered
    async fn list_by_project(
        &self,
        project_id: &str,
    ) -> Result<Vec<SavedTranslation>, PersistenceError>;

    /// Remove every record of a project
    async fn clear_project(&self, project_id: &str) -> Result<(), PersistenceError>;
}
