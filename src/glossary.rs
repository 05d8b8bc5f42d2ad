//! Project glossary
//!
//! A glossary is the project's list of fixed term translations. Entries are
//! keyed by their `original` term, compared case-insensitively after trimming;
//! no two entries in one glossary may share that key.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single fixed term translation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlossaryItem {
    /// Unique identifier within the project
    pub id: String,
    /// Term as it appears in the source text
    pub original: String,
    /// Term that must be used in the translation
    pub translated: String,
    /// Project source language at the time the entry was created
    pub source_language: String,
}

impl GlossaryItem {
    /// Create an entry with a fresh id; both terms are trimmed
    pub fn new(original: &str, translated: &str, source_language: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            original: original.trim().to_string(),
            translated: translated.trim().to_string(),
            source_language: source_language.to_string(),
        }
    }

    /// Uniqueness key of this entry
    pub fn key(&self) -> String {
        term_key(&self.original)
    }
}

/// Normalize a term for uniqueness and removal comparisons
pub fn term_key(term: &str) -> String {
    term.trim().to_lowercase()
}

/// Select the entries whose original term occurs in `text`
///
/// Matching is a case-insensitive substring test; the result keeps glossary
/// order. Entries with a blank original never match.
pub fn filter_relevant<'a>(items: &'a [GlossaryItem], text: &str) -> Vec<&'a GlossaryItem> {
    let haystack = text.to_lowercase();
    items
        .iter()
        .filter(|item| {
            let needle = item.original.to_lowercase();
            !needle.is_empty() && haystack.contains(&needle)
        })
        .collect()
}

/// Ordered, key-unique list of glossary entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Glossary {
    items: Vec<GlossaryItem>,
}

impl Glossary {
    /// Create an empty glossary
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries in insertion order
    pub fn items(&self) -> &[GlossaryItem] {
        &self.items
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the glossary has no entries
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether an entry with the same normalized original exists
    pub fn contains_original(&self, original: &str) -> bool {
        let key = term_key(original);
        self.items.iter().any(|item| item.key() == key)
    }

    /// Entries relevant to `text`, see [`filter_relevant`]
    pub fn relevant_to(&self, text: &str) -> Vec<&GlossaryItem> {
        filter_relevant(&self.items, text)
    }

    /// Add an entry typed in by the user
    ///
    /// # Errors
    /// * `AppError::InvalidInput` if either term is blank or the original
    ///   already exists
    pub fn add_manual(
        &mut self,
        original: &str,
        translated: &str,
        source_language: &str,
    ) -> Result<&GlossaryItem, AppError> {
        if original.trim().is_empty() || translated.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Both the original and the translated term are required".to_string(),
            ));
        }
        if self.contains_original(original) {
            return Err(AppError::InvalidInput(format!(
                "\"{}\" is already in the glossary. Remove it first to change its translation.",
                original.trim()
            )));
        }
        self.items
            .push(GlossaryItem::new(original, translated, source_language));
        Ok(&self.items[self.items.len() - 1])
    }

    /// Remove a single entry by id, returning it if it existed
    pub fn remove_by_id(&mut self, id: &str) -> Option<GlossaryItem> {
        let index = self.items.iter().position(|item| item.id == id)?;
        Some(self.items.remove(index))
    }

    /// Remove every entry whose id is listed; returns the number removed
    pub fn remove_many(&mut self, ids: &[String]) -> usize {
        let before = self.items.len();
        self.items.retain(|item| !ids.contains(&item.id));
        before - self.items.len()
    }

    /// Entries whose original or translated term contains `term`
    pub fn search(&self, term: &str) -> Vec<&GlossaryItem> {
        let needle = term.to_lowercase();
        self.items
            .iter()
            .filter(|item| {
                item.original.to_lowercase().contains(&needle)
                    || item.translated.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Replace the whole entry list in one step
    ///
    /// Callers build the complete new list first so that readers never see a
    /// half-applied change.
    pub(crate) fn replace_items(&mut self, items: Vec<GlossaryItem>) {
        self.items = items;
    }
}

impl From<Vec<GlossaryItem>> for Glossary {
    fn from(items: Vec<GlossaryItem>) -> Self {
        Self { items }
    }
}
