//! Writing assistant
//!
//! [`AssistantOrchestrator`] runs one conversational turn and turns the
//! provider's reply into an [`AssistantAction`]. It never changes state
//! itself; applying the action is the reconciler's job.

pub mod action;
pub mod prompt;
pub mod tools;

pub use action::AssistantAction;
pub use prompt::{build_system_prompt, EditorContext};
pub use tools::glossary_tools;

use crate::chat::{visible_tail, ChatMessage};
use crate::config::AssistantConfig;
use crate::error::AppError;
use crate::provider::{PromptMessage, ProviderClient, ToolRequest};
use crate::workspace::Project;
use tracing::{debug, info};

/// Utterances that clear the transcript without asking the provider
pub const RESET_KEYWORDS: &[&str] = &["reset", "clear", "bersihkan"];

/// Whether an utterance is one of the reset keywords
pub fn is_reset_keyword(utterance: &str) -> bool {
    let normalized = utterance.trim().to_lowercase();
    RESET_KEYWORDS.contains(&normalized.as_str())
}

/// Inputs of one assistant turn
#[derive(Debug, Clone, Copy)]
pub struct AssistantTurn<'a> {
    /// Current utterance; for a memory injection, the hidden text
    pub utterance: &'a str,
    /// Messages before the current utterance, hidden ones included
    pub history: &'a [ChatMessage],
    /// Active project
    pub project: &'a Project,
    /// Editor snapshot, if the author has text open
    pub editor: Option<&'a EditorContext>,
}

/// Drives assistant turns
#[derive(Debug, Clone, Default)]
pub struct AssistantOrchestrator {
    config: AssistantConfig,
}

impl AssistantOrchestrator {
    /// Create an orchestrator with the given configuration
    pub fn new(config: AssistantConfig) -> Self {
        Self { config }
    }

    /// Run one turn
    ///
    /// A reset keyword yields [`AssistantAction::ClearChat`] without any
    /// provider call. Otherwise the provider sees the last
    /// `history_window` visible messages followed by the current utterance.
    /// Only the first tool call of the reply is honored.
    ///
    /// # Errors
    /// * `AppError::Transport` if the provider call fails
    /// * `AppError::ActionDecode` if the tool call cannot be decoded
    pub async fn respond(
        &self,
        client: &dyn ProviderClient,
        turn: &AssistantTurn<'_>,
    ) -> Result<AssistantAction, AppError> {
        if is_reset_keyword(turn.utterance) {
            debug!("Reset keyword received, clearing chat");
            return Ok(AssistantAction::clear_chat());
        }

        let mut messages: Vec<PromptMessage> = visible_tail(turn.history, self.config.history_window)
            .into_iter()
            .map(|m| PromptMessage {
                role: m.role,
                content: m.text.clone(),
            })
            .collect();
        messages.push(PromptMessage::user(turn.utterance));

        let request = ToolRequest {
            system: build_system_prompt(turn.project, turn.editor),
            messages,
            tools: glossary_tools(),
            temperature: self.config.temperature,
            max_output_tokens: self.config.max_output_tokens,
        };

        let reply = client.complete_with_tools(&request).await?;

        if reply.tool_calls.len() > 1 {
            debug!(
                ignored = reply.tool_calls.len() - 1,
                "Ignoring additional tool calls"
            );
        }

        let action = match reply.tool_calls.first() {
            Some(call) => AssistantAction::from_tool_call(call)?,
            None => AssistantAction::reply(&reply.text),
        };

        info!(
            provider = %client.provider(),
            project_id = %turn.project.id,
            context_messages = request.messages.len(),
            action = action_name(&action),
            "Assistant turn finished"
        );
        Ok(action)
    }
}

fn action_name(action: &AssistantAction) -> &'static str {
    match action {
        AssistantAction::AddGlossary { .. } => "ADD_GLOSSARY",
        AssistantAction::RemoveGlossary { .. } => "REMOVE_GLOSSARY",
        AssistantAction::ClearChat { .. } => "CLEAR_CHAT",
        AssistantAction::ReadSavedTranslation { .. } => "READ_SAVED_TRANSLATION",
        AssistantAction::None { .. } => "NONE",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ChatRole;
    use crate::provider::ProviderId;
    use crate::test_support::ScriptedProvider;
    use serde_json::json;

    fn project() -> Project {
        Project::new("Moonlit", "Korean", "Indonesian")
    }

    #[tokio::test]
    async fn test_reset_keyword_makes_no_call() {
        let provider = ScriptedProvider::new(ProviderId::Gemini).with_text_reply("unused");
        let project = project();
        for utterance in ["reset", "  CLEAR ", "Bersihkan"] {
            let turn = AssistantTurn {
                utterance,
                history: &[],
                project: &project,
                editor: None,
            };
            let action = AssistantOrchestrator::default()
                .respond(&provider, &turn)
                .await
                .unwrap();
            assert_eq!(action, AssistantAction::clear_chat());
        }
        assert_eq!(provider.tool_calls(), 0);
    }

    #[tokio::test]
    async fn test_window_skips_hidden_and_appends_utterance() {
        let provider = ScriptedProvider::new(ProviderId::OpenAi).with_text_reply("ok");
        let project = project();
        let mut history = Vec::new();
        for i in 0..10 {
            history.push(ChatMessage::user(format!("q{}", i)));
            history.push(ChatMessage::memory_injection(format!("secret{}", i)));
            history.push(ChatMessage::model(format!("a{}", i)));
        }
        let turn = AssistantTurn {
            utterance: "what now?",
            history: &history,
            project: &project,
            editor: None,
        };

        AssistantOrchestrator::default().respond(&provider, &turn).await.unwrap();

        let requests = provider.tool_requests();
        let request = &requests[0];
        let contents: Vec<&str> = request.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(
            contents,
            vec!["q6", "a6", "q7", "a7", "q8", "a8", "q9", "a9", "what now?"]
        );
        assert_eq!(request.messages[1].role, ChatRole::Model);
        assert!(contents.iter().all(|c| !c.starts_with("secret")));
        assert_eq!(request.tools.len(), 2);
        assert_eq!(request.max_output_tokens, 2000);
    }

    #[tokio::test]
    async fn test_memory_injection_is_sent_as_current_utterance() {
        let provider = ScriptedProvider::new(ProviderId::Gemini).with_text_reply("Read it.");
        let project = project();
        let history = vec![ChatMessage::user("read chapter 1")];
        let turn = AssistantTurn {
            utterance: "=== FILE: Chapter 1 ===",
            history: &history,
            project: &project,
            editor: None,
        };
        AssistantOrchestrator::default().respond(&provider, &turn).await.unwrap();

        let requests = provider.tool_requests();
        let request = &requests[0];
        assert_eq!(request.messages.last().unwrap().content, "=== FILE: Chapter 1 ===");
    }

    #[tokio::test]
    async fn test_only_first_tool_call_is_honored() {
        let provider = ScriptedProvider::new(ProviderId::Gemini).with_tool_reply(
            "",
            vec![
                ("remove_from_glossary", json!({"originals": ["Hyung"]})),
                ("add_to_glossary", json!("{items: oops")),
            ],
        );
        let project = project();
        let turn = AssistantTurn {
            utterance: "remove hyung",
            history: &[],
            project: &project,
            editor: None,
        };
        let action = AssistantOrchestrator::default().respond(&provider, &turn).await.unwrap();
        assert_eq!(
            action,
            AssistantAction::RemoveGlossary {
                originals: vec!["Hyung".to_string()],
                message: "Removing 1 item(s)...".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_empty_reply_becomes_placeholder() {
        let provider = ScriptedProvider::new(ProviderId::Gemini).with_text_reply("");
        let project = project();
        let turn = AssistantTurn {
            utterance: "hello",
            history: &[],
            project: &project,
            editor: None,
        };
        let action = AssistantOrchestrator::default().respond(&provider, &turn).await.unwrap();
        assert_eq!(action, AssistantAction::None { message: "...".to_string() });
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let provider = ScriptedProvider::new(ProviderId::Gemini).with_failure("quota exhausted");
        let project = project();
        let turn = AssistantTurn {
            utterance: "hello",
            history: &[],
            project: &project,
            editor: None,
        };
        let err = AssistantOrchestrator::default().respond(&provider, &turn).await.unwrap_err();
        assert_eq!(err.to_string(), "quota exhausted");
    }
}
