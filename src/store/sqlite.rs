//! SQLite-backed record store
//!
//! Handles all database interactions for saved translations.

use super::{PersistenceError, RecordEdit, RecordLocks, RecordStore, SavedTranslation};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info};

/// Saved-translation store on a SQLite connection pool
///
/// `update` reads and writes on separate statements, so it holds the record's
/// lock across both. `put` and `delete` take the same lock so they cannot land
/// between the read and the write of an in-flight `update`.
pub struct SqliteRecordStore {
    pool: SqlitePool,
    locks: RecordLocks,
}

impl SqliteRecordStore {
    /// Open (creating if missing) the database and run migrations
    ///
    /// # Arguments
    /// * `db_path` - Path to the SQLite database file
    ///
    /// # Returns
    /// * `Ok(SqliteRecordStore)` if successful
    /// * `Err(PersistenceError)` if the directory, connection or migration failed
    pub async fn new(db_path: &str) -> Result<Self, PersistenceError> {
        if let Some(parent) = PathBuf::from(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    PersistenceError::Io(format!("Failed to create db directory: {}", e))
                })?;
            }
        }

        let connection_string = if db_path.starts_with("sqlite:") {
            db_path.to_string()
        } else {
            format!("sqlite:{}", db_path)
        };

        let options = SqliteConnectOptions::from_str(&connection_string)
            .map_err(|e| PersistenceError::Database(format!("Invalid database path: {}", e)))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| {
                PersistenceError::Database(format!("Failed to connect to database: {}", e))
            })?;

        info!(db_path = %db_path, "Connected to SQLite database");

        let store = Self {
            pool,
            locks: RecordLocks::new(),
        };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Insert or replace a record; callers hold the record's lock
    async fn upsert(&self, record: &SavedTranslation) -> Result<(), PersistenceError> {
        sqlx::query(
            "INSERT INTO saved_translations (id, project_id, name, text, timestamp) VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT(id) DO UPDATE SET project_id = excluded.project_id, name = excluded.name, \
             text = excluded.text, timestamp = excluded.timestamp",
        )
        .bind(&record.id)
        .bind(&record.project_id)
        .bind(&record.name)
        .bind(&record.text)
        .bind(&record.timestamp)
        .execute(&self.pool)
        .await?;

        debug!(record_id = %record.id, project_id = %record.project_id, "Stored saved translation");
        Ok(())
    }

    /// Run database migrations
    async fn run_migrations(&self) -> Result<(), PersistenceError> {
        debug!("Running database migrations");

        let migration_sql = include_str!("../../migrations/001_create_saved_translations.sql");

        let mut cleaned_sql = String::new();
        for line in migration_sql.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with("--") {
                continue;
            }
            let without_comments = match trimmed.find("--") {
                Some(comment_pos) => &trimmed[..comment_pos],
                None => trimmed,
            };
            cleaned_sql.push_str(without_comments.trim());
            cleaned_sql.push(' ');
        }

        let statements = cleaned_sql
            .split(';')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty());

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    PersistenceError::Database(format!(
                        "Migration failed: {} - Statement: {}",
                        e,
                        statement.chars().take(100).collect::<String>()
                    ))
                })?;
        }

        debug!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn put(&self, record: &SavedTranslation) -> Result<(), PersistenceError> {
        let _guard = self.locks.acquire(&record.id).await;
        self.upsert(record).await
    }

    async fn delete(&self, id: &str) -> Result<(), PersistenceError> {
        let _guard = self.locks.acquire(id).await;
        sqlx::query("DELETE FROM saved_translations WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        debug!(record_id = %id, "Deleted saved translation");
        Ok(())
    }

    async fn update(
        &self,
        id: &str,
        edit: RecordEdit,
    ) -> Result<Option<SavedTranslation>, PersistenceError> {
        let _guard = self.locks.acquire(id).await;
        let Some(mut record) = self.get(id).await? else {
            return Ok(None);
        };
        edit(&mut record);
        self.upsert(&record).await?;
        Ok(Some(record))
    }

    async fn get(&self, id: &str) -> Result<Option<SavedTranslation>, PersistenceError> {
        let record = sqlx::query_as::<_, SavedTranslation>(
            "SELECT id, project_id, name, text, timestamp FROM saved_translations WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn list_by_project(
        &self,
        project_id: &str,
    ) -> Result<Vec<SavedTranslation>, PersistenceError> {
        let records = sqlx::query_as::<_, SavedTranslation>(
            "SELECT id, project_id, name, text, timestamp FROM saved_translations WHERE project_id = ?",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn clear_project(&self, project_id: &str) -> Result<(), PersistenceError> {
        let result = sqlx::query("DELETE FROM saved_translations WHERE project_id = ?")
            .bind(project_id)
            .execute(&self.pool)
            .await?;

        info!(
            project_id = %project_id,
            removed = result.rows_affected(),
            "Cleared saved translations for project"
        );
        Ok(())
    }
}
