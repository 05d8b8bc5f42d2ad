//! Saved translations collection
//!
//! Operations on a project's stored chapters, built on top of any
//! [`RecordStore`].

use crate::error::AppError;
use crate::store::{RecordStore, SavedTranslation};
use std::sync::Arc;
use tracing::info;

/// A project's stored chapters
#[derive(Clone)]
pub struct TranslationLibrary {
    store: Arc<dyn RecordStore>,
}

impl TranslationLibrary {
    /// Wrap a record store
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Store a finished translation as the project's next chapter
    ///
    /// The record is named "Chapter N" where N is one more than the number of
    /// chapters already stored for the project.
    pub async fn save_output(
        &self,
        project_id: &str,
        text: &str,
    ) -> Result<SavedTranslation, AppError> {
        if text.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Nothing to save: the translation is empty".to_string(),
            ));
        }

        let count = self.store.list_by_project(project_id).await?.len() + 1;
        let record = SavedTranslation::new(project_id, &format!("Chapter {}", count), text);
        self.store.put(&record).await?;

        info!(project_id = %project_id, record_id = %record.id, name = %record.name, "Saved translation");
        Ok(record)
    }

    /// All chapters of a project, newest first
    pub async fn list(&self, project_id: &str) -> Result<Vec<SavedTranslation>, AppError> {
        let mut records = self.store.list_by_project(project_id).await?;
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(records)
    }

    /// Rename a chapter; a blank name falls back to "Translation <id prefix>"
    pub async fn rename(&self, id: &str, new_name: &str) -> Result<SavedTranslation, AppError> {
        let trimmed = new_name.trim();
        let name = if trimmed.is_empty() {
            format!("Translation {}", id.chars().take(4).collect::<String>())
        } else {
            trimmed.to_string()
        };
        self.store
            .update(id, Box::new(move |record| record.name = name))
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Replace a chapter's text
    pub async fn update_text(&self, id: &str, text: &str) -> Result<SavedTranslation, AppError> {
        let text = text.to_string();
        self.store
            .update(id, Box::new(move |record| record.text = text))
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Delete a chapter; unknown ids are ignored
    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.store.delete(id).await?;
        Ok(())
    }

    /// Delete every chapter of a project
    pub async fn clear_project(&self, project_id: &str) -> Result<(), AppError> {
        self.store.clear_project(project_id).await?;
        Ok(())
    }

    /// Find a chapter whose name loosely matches `query`
    ///
    /// See [`find_by_name`] for the matching rules.
    pub async fn find_by_name(
        &self,
        project_id: &str,
        query: &str,
    ) -> Result<Option<SavedTranslation>, AppError> {
        let records = self.store.list_by_project(project_id).await?;
        Ok(find_by_name(records, query))
    }

    /// Plain-text export of all chapters, newest first
    pub async fn export_text(&self, project_id: &str) -> Result<String, AppError> {
        let records = self.list(project_id).await?;
        Ok(records
            .iter()
            .map(|r| format!("[{}] - Saved: {}\n{}\n-------------------\n", r.name, r.timestamp, r.text))
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

fn not_found(id: &str) -> AppError {
    AppError::NotFound(format!("saved translation {}", id))
}

/// Case-insensitive name lookup
///
/// An exact name match wins. Otherwise a record matches when either name
/// contains the other, and the oldest matching record is returned.
pub fn find_by_name(mut records: Vec<SavedTranslation>, query: &str) -> Option<SavedTranslation> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return None;
    }
    records.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.name.cmp(&b.name)));

    if let Some(index) = records.iter().position(|r| r.name.trim().to_lowercase() == query) {
        return Some(records.swap_remove(index));
    }
    records.into_iter().find(|r| {
        let name = r.name.to_lowercase();
        !name.is_empty() && (name.contains(&query) || query.contains(&name))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryRecordStore, PersistenceError, RecordEdit, SqliteRecordStore};
    use async_trait::async_trait;
    use tempfile::TempDir;

    /// Memory store that yields to the scheduler around every call
    struct YieldingStore(MemoryRecordStore);

    #[async_trait]
    impl RecordStore for YieldingStore {
        async fn put(&self, record: &SavedTranslation) -> Result<(), PersistenceError> {
            tokio::task::yield_now().await;
            self.0.put(record).await
        }
        async fn delete(&self, id: &str) -> Result<(), PersistenceError> {
            self.0.delete(id).await
        }
        async fn update(
            &self,
            id: &str,
            edit: RecordEdit,
        ) -> Result<Option<SavedTranslation>, PersistenceError> {
            tokio::task::yield_now().await;
            self.0.update(id, edit).await
        }
        async fn get(&self, id: &str) -> Result<Option<SavedTranslation>, PersistenceError> {
            tokio::task::yield_now().await;
            self.0.get(id).await
        }
        async fn list_by_project(
            &self,
            project_id: &str,
        ) -> Result<Vec<SavedTranslation>, PersistenceError> {
            self.0.list_by_project(project_id).await
        }
        async fn clear_project(&self, project_id: &str) -> Result<(), PersistenceError> {
            self.0.clear_project(project_id).await
        }
    }

    async fn assert_rename_and_edit_both_land(library: &TranslationLibrary) {
        let record = library.save_output("p1", "old text").await.unwrap();
        for round in 0..10 {
            let name = format!("Prologue {}", round);
            let text = format!("new text {}", round);
            let (renamed, edited) = tokio::join!(
                library.rename(&record.id, &name),
                library.update_text(&record.id, &text)
            );
            renamed.unwrap();
            edited.unwrap();

            let stored = library.store().get(&record.id).await.unwrap().unwrap();
            assert_eq!((stored.name, stored.text), (name, text));
        }
    }

    fn library() -> TranslationLibrary {
        TranslationLibrary::new(Arc::new(MemoryRecordStore::new()))
    }

    #[tokio::test]
    async fn test_save_output_numbers_chapters() {
        let library = library();
        let first = library.save_output("p1", "one").await.unwrap();
        let second = library.save_output("p1", "two").await.unwrap();
        let other = library.save_output("p2", "three").await.unwrap();
        assert_eq!(first.name, "Chapter 1");
        assert_eq!(second.name, "Chapter 2");
        assert_eq!(other.name, "Chapter 1");
    }

    #[tokio::test]
    async fn test_save_output_rejects_blank() {
        let result = library().save_output("p1", "   ").await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_rename_blank_falls_back() {
        let library = library();
        let record = library.save_output("p1", "text").await.unwrap();
        let renamed = library.rename(&record.id, "  ").await.unwrap();
        let prefix: String = record.id.chars().take(4).collect();
        assert_eq!(renamed.name, format!("Translation {}", prefix));

        let renamed = library.rename(&record.id, " Prologue ").await.unwrap();
        assert_eq!(renamed.name, "Prologue");
    }

    #[tokio::test]
    async fn test_update_text_missing_record() {
        let result = library().update_text("nope", "x").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_concurrent_rename_and_edit_keep_both_changes() {
        let library = TranslationLibrary::new(Arc::new(YieldingStore(MemoryRecordStore::new())));
        assert_rename_and_edit_both_land(&library).await;
    }

    #[tokio::test]
    async fn test_concurrent_rename_and_edit_on_sqlite() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("library.db");
        let store = SqliteRecordStore::new(db_path.to_str().unwrap()).await.unwrap();
        let library = TranslationLibrary::new(Arc::new(store));
        assert_rename_and_edit_both_land(&library).await;
    }

    #[test]
    fn test_find_by_name_prefers_exact_match() {
        let mut ten = SavedTranslation::new("p1", "Chapter 10", "ten");
        ten.timestamp = "2024-01-01T00:00:00+00:00".to_string();
        let mut one = SavedTranslation::new("p1", "Chapter 1", "one");
        one.timestamp = "2024-02-01T00:00:00+00:00".to_string();

        for records in [vec![ten.clone(), one.clone()], vec![one.clone(), ten.clone()]] {
            assert_eq!(find_by_name(records.clone(), "chapter 1").unwrap().text, "one");
            assert_eq!(find_by_name(records, "chapter").unwrap().text, "ten");
        }
    }

    #[test]
    fn test_find_by_name_matches_both_directions() {
        let records = vec![
            SavedTranslation::new("p1", "Chapter 1", "a"),
            SavedTranslation::new("p1", "Chapter 12", "b"),
        ];
        assert_eq!(find_by_name(records.clone(), "chapter 1").unwrap().text, "a");
        assert_eq!(find_by_name(records.clone(), "please read CHAPTER 12 now").unwrap().text, "a");
        assert!(find_by_name(records.clone(), "Epilogue").is_none());
        assert!(find_by_name(records, "  ").is_none());
    }

    #[tokio::test]
    async fn test_export_text_contains_every_chapter() {
        let library = library();
        library.save_output("p1", "first body").await.unwrap();
        library.save_output("p1", "second body").await.unwrap();
        let export = library.export_text("p1").await.unwrap();
        assert!(export.contains("[Chapter 1]"));
        assert!(export.contains("second body"));
    }
}
