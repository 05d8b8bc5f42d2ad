//! Assistant system prompt

use crate::workspace::Project;
use serde::{Deserialize, Serialize};

/// Longest excerpt of each editor pane included in the prompt, in characters
pub const EDITOR_EXCERPT_CHARS: usize = 4000;

/// What the author currently has open in the editor
///
/// Read-only input to the assistant; never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorContext {
    /// Text in the source pane
    pub source_text: String,
    /// Text in the translation pane
    pub translated_text: String,
}

impl EditorContext {
    /// Whether both panes are blank
    pub fn is_empty(&self) -> bool {
        self.source_text.trim().is_empty() && self.translated_text.trim().is_empty()
    }
}

fn excerpt(text: &str) -> String {
    let mut chars = text.trim().chars();
    let head: String = chars.by_ref().take(EDITOR_EXCERPT_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

/// Build the assistant's system prompt for the active project
pub fn build_system_prompt(project: &Project, editor: Option<&EditorContext>) -> String {
    let mut prompt = format!(
        "ROLE: Writing and translation assistant for a novel translation workspace.\n\n\
         STATUS:\n\
         - Project: \"{}\" ({} → {})\n\
         - Glossary: {} item(s).\n\n\
         RULES:\n\
         1. SAVING: call 'add_to_glossary' when the author wants to save terms.\n\
         2. REMOVING: call 'remove_from_glossary' when the author wants to delete terms from the glossary.\n\
         3. NO LOOPS: do not call a tool again when the author only asks about status.\n\
         4. TEXT: answer status questions with plain text.\n\n\
         TONE: relaxed, helpful, to the point.",
        project.name,
        project.source_language,
        project.target_language,
        project.glossary.len()
    );

    if let Some(editor) = editor.filter(|e| !e.is_empty()) {
        prompt.push_str("\n\n[EDITOR CONTEXT]");
        if !editor.source_text.trim().is_empty() {
            prompt.push_str("\nSource text:\n");
            prompt.push_str(&excerpt(&editor.source_text));
        }
        if !editor.translated_text.trim().is_empty() {
            prompt.push_str("\nTranslated text:\n");
            prompt.push_str(&excerpt(&editor.translated_text));
        }
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_reports_glossary_count() {
        let mut project = Project::new("Moonlit", "Korean", "Indonesian");
        project.glossary.add_manual("Hyung", "Kakak", "Korean").unwrap();
        let prompt = build_system_prompt(&project, None);
        assert!(prompt.contains("Glossary: 1 item(s)."));
        assert!(prompt.contains("\"Moonlit\" (Korean → Indonesian)"));
        assert!(!prompt.contains("[EDITOR CONTEXT]"));
    }

    #[test]
    fn test_blank_editor_context_is_omitted() {
        let project = Project::new("Moonlit", "Korean", "Indonesian");
        let editor = EditorContext {
            source_text: "  ".to_string(),
            translated_text: String::new(),
        };
        assert!(!build_system_prompt(&project, Some(&editor)).contains("[EDITOR CONTEXT]"));
    }

    #[test]
    fn test_editor_excerpt_truncates_on_char_boundary() {
        let project = Project::new("Moonlit", "Korean", "Indonesian");
        let editor = EditorContext {
            source_text: "형".repeat(EDITOR_EXCERPT_CHARS + 10),
            translated_text: "Kakak".to_string(),
        };
        let prompt = build_system_prompt(&project, Some(&editor));
        assert_eq!(prompt.matches('형').count(), EDITOR_EXCERPT_CHARS);
        assert!(prompt.contains("Translated text:\nKakak"));
    }
}
