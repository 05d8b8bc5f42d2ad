//! In-memory record store

use super::{PersistenceError, RecordEdit, RecordStore, SavedTranslation};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Record store kept entirely in process memory
///
/// Every write holds the map's write guard, which already orders writes to
/// the same id.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: RwLock<HashMap<String, SavedTranslation>>,
}

impl MemoryRecordStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of records across all projects
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store holds no records
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn put(&self, record: &SavedTranslation) -> Result<(), PersistenceError> {
        self.records
            .write()
            .await
            .insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), PersistenceError> {
        self.records.write().await.remove(id);
        Ok(())
    }

    async fn update(
        &self,
        id: &str,
        edit: RecordEdit,
    ) -> Result<Option<SavedTranslation>, PersistenceError> {
        let mut records = self.records.write().await;
        Ok(records.get_mut(id).map(|record| {
            edit(record);
            record.clone()
        }))
    }

    async fn get(&self, id: &str) -> Result<Option<SavedTranslation>, PersistenceError> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn list_by_project(
        &self,
        project_id: &str,
    ) -> Result<Vec<SavedTranslation>, PersistenceError> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn clear_project(&self, project_id: &str) -> Result<(), PersistenceError> {
        self.records
            .write()
            .await
            .retain(|_, r| r.project_id != project_id);
        Ok(())
    }
}
