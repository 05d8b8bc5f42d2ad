//! Action reconciliation
//!
//! [`ActionReconciler`] is the only writer of a project's glossary and the
//! assistant transcript in response to assistant actions. Each action is
//! applied in one pass: every change is computed first and committed
//! together, so a failure (for example a store error while looking up a
//! saved translation) leaves the workspace untouched.

pub mod normalize;

pub use normalize::{normalize_payload, NormalizedEntry, ORIGINAL_KEYS, TRANSLATED_KEYS};

use crate::assistant::AssistantAction;
use crate::chat::ChatMessage;
use crate::error::AppError;
use crate::glossary::{term_key, GlossaryItem};
use crate::library::TranslationLibrary;
use crate::store::SavedTranslation;
use crate::workspace::Workspace;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, info};

/// What applying an action did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// Glossary entries were processed
    GlossaryAdded {
        /// Entries appended
        added: usize,
        /// Original terms rejected because they already existed
        duplicates: Vec<String>,
        /// Entries dropped for missing a term
        invalid: usize,
    },
    /// Glossary entries were removed
    GlossaryRemoved {
        /// Entries removed
        removed: usize,
    },
    /// The transcript was reset
    ChatCleared,
    /// A saved translation was found; `injection` must be fed back to the
    /// assistant as a hidden turn
    MemoryLoaded {
        /// Name of the record that matched
        name: String,
        /// Hidden message carrying the record's text
        injection: String,
    },
    /// No saved translation matched the requested name
    NotFound {
        /// Requested name
        name: String,
    },
    /// Plain reply appended
    Replied,
}

impl Reconciliation {
    /// Hidden follow-up utterance, if the assistant must be called again
    pub fn memory_injection(&self) -> Option<&str> {
        match self {
            Reconciliation::MemoryLoaded { injection, .. } => Some(injection),
            _ => None,
        }
    }
}

/// Wrap a saved translation's text for the assistant's memory
pub fn memory_injection(record: &SavedTranslation) -> String {
    format!(
        "(System: this is the content of the saved file \"{name}\". Keep it in memory.)\n\
         === FILE: {name} ===\n\
         {text}\n\
         === END OF FILE: {name} ===",
        name = record.name,
        text = record.text
    )
}

fn add_summary(added: usize, duplicates: &[String]) -> String {
    let mut parts = Vec::new();
    if added > 0 {
        parts.push(format!("(System: saved {} new item(s).)", added));
    }
    if !duplicates.is_empty() {
        let list = duplicates
            .iter()
            .map(|d| format!("- {}", d))
            .collect::<Vec<_>>()
            .join("\n");
        parts.push(format!(
            "Warning: these item(s) were NOT added because they are already in the glossary:\n{}\n\n\
             Remove them first, or ask me to remove them, if you want to change their translation.",
            list
        ));
    }
    if parts.is_empty() {
        parts.push("(System: no valid entries received.)".to_string());
    }
    parts.join("\n\n")
}

/// Applies assistant actions to the workspace
#[derive(Clone)]
pub struct ActionReconciler {
    library: TranslationLibrary,
}

impl ActionReconciler {
    /// Create a reconciler reading saved translations from `library`
    pub fn new(library: TranslationLibrary) -> Self {
        Self { library }
    }

    /// Apply one action to the active project and the transcript
    ///
    /// # Errors
    /// * `AppError::NotFound` if the workspace has no active project
    /// * `AppError::Persistence` if reading saved translations fails; nothing
    ///   is changed in that case
    pub async fn apply(
        &self,
        action: AssistantAction,
        workspace: &mut Workspace,
    ) -> Result<Reconciliation, AppError> {
        match action {
            AssistantAction::AddGlossary { raw, message } => self.add(&raw, &message, workspace),
            AssistantAction::RemoveGlossary { originals, message } => {
                self.remove(&originals, &message, workspace)
            }
            AssistantAction::ClearChat { message } => {
                workspace.chat_mut().reset(Some(ChatMessage::model(message)));
                info!("Chat history cleared");
                Ok(Reconciliation::ChatCleared)
            }
            AssistantAction::ReadSavedTranslation { name, message } => {
                self.read(&name, &message, workspace).await
            }
            AssistantAction::None { message } => {
                workspace.chat_mut().push(ChatMessage::model(message));
                Ok(Reconciliation::Replied)
            }
        }
    }

    fn add(
        &self,
        raw: &Value,
        message: &str,
        workspace: &mut Workspace,
    ) -> Result<Reconciliation, AppError> {
        let project = workspace.active_project_mut()?;
        let source_language = project.source_language.clone();
        let mut seen: HashSet<String> = project.glossary.items().iter().map(|i| i.key()).collect();
        let mut items = project.glossary.items().to_vec();
        let mut duplicates = Vec::new();
        let mut added = 0;
        let mut invalid = 0;

        for entry in normalize_payload(raw) {
            let Some((original, translated)) = entry.complete() else {
                invalid += 1;
                continue;
            };
            if !seen.insert(term_key(original)) {
                duplicates.push(original.to_string());
                continue;
            }
            items.push(GlossaryItem::new(original, translated, &source_language));
            added += 1;
        }

        if added > 0 {
            project.glossary.replace_items(items);
        }
        let project_id = project.id.clone();

        workspace.chat_mut().push(ChatMessage::model(format!(
            "{}\n\n{}",
            message,
            add_summary(added, &duplicates)
        )));

        info!(
            project_id = %project_id,
            added,
            duplicates = duplicates.len(),
            invalid,
            "Applied glossary additions"
        );
        Ok(Reconciliation::GlossaryAdded {
            added,
            duplicates,
            invalid,
        })
    }

    fn remove(
        &self,
        originals: &[String],
        message: &str,
        workspace: &mut Workspace,
    ) -> Result<Reconciliation, AppError> {
        let project = workspace.active_project_mut()?;
        let keys: HashSet<String> = originals.iter().map(|o| term_key(o)).collect();
        let before = project.glossary.len();
        let kept: Vec<GlossaryItem> = project
            .glossary
            .items()
            .iter()
            .filter(|item| !keys.contains(&item.key()))
            .cloned()
            .collect();
        let removed = before - kept.len();
        if removed > 0 {
            project.glossary.replace_items(kept);
        }
        let project_id = project.id.clone();

        workspace.chat_mut().push(ChatMessage::model(format!(
            "{}\n\n(System: removed {} item(s) from the glossary.)",
            message, removed
        )));

        info!(project_id = %project_id, requested = originals.len(), removed, "Applied glossary removals");
        Ok(Reconciliation::GlossaryRemoved { removed })
    }

    async fn read(
        &self,
        name: &str,
        message: &str,
        workspace: &mut Workspace,
    ) -> Result<Reconciliation, AppError> {
        let project_id = workspace.active_project()?.id.clone();
        let found = self.library.find_by_name(&project_id, name).await?;

        let chat = workspace.chat_mut();
        chat.push(ChatMessage::model(message));
        match found {
            Some(record) => {
                debug!(project_id = %project_id, record_id = %record.id, "Loaded saved translation into memory");
                Ok(Reconciliation::MemoryLoaded {
                    injection: memory_injection(&record),
                    name: record.name,
                })
            }
            None => {
                chat.push(ChatMessage::model(format!(
                    "I could not find \"{}\" among the saved translations. Check the name and try again.",
                    name
                )));
                info!(project_id = %project_id, requested = %name, "Saved translation not found");
                Ok(Reconciliation::NotFound {
                    name: name.to_string(),
                })
            }
        }
    }
}
