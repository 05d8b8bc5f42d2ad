//! Assistant session
//!
//! Glues one visible assistant turn together: record the author's message,
//! ask the orchestrator, reconcile the resulting action and, when a saved
//! translation was loaded, feed it back to the assistant once as a hidden
//! turn. Taking `&mut Workspace` for the whole turn keeps turns of one
//! session strictly sequential.

use crate::assistant::{AssistantAction, AssistantOrchestrator, AssistantTurn, EditorContext};
use crate::chat::ChatMessage;
use crate::config::AssistantConfig;
use crate::error::AppError;
use crate::library::TranslationLibrary;
use crate::provider::ProviderClient;
use crate::reconcile::{ActionReconciler, Reconciliation};
use crate::workspace::Workspace;
use std::sync::Arc;
use tracing::{error, info};

/// Drives assistant turns against a workspace
#[derive(Clone)]
pub struct AssistantSession {
    client: Arc<dyn ProviderClient>,
    orchestrator: AssistantOrchestrator,
    reconciler: ActionReconciler,
}

impl AssistantSession {
    /// Create a session
    ///
    /// # Arguments
    /// * `client` - Connected provider used for every turn
    /// * `config` - Assistant configuration
    /// * `library` - Saved translations available to the assistant
    pub fn new(
        client: Arc<dyn ProviderClient>,
        config: AssistantConfig,
        library: TranslationLibrary,
    ) -> Self {
        Self {
            client,
            orchestrator: AssistantOrchestrator::new(config),
            reconciler: ActionReconciler::new(library),
        }
    }

    /// Handle one message typed by the author
    ///
    /// Blank input is ignored and returns `Ok(None)`. On failure the error
    /// is also appended to the transcript as an assistant message.
    pub async fn submit(
        &self,
        workspace: &mut Workspace,
        text: &str,
        editor: Option<&EditorContext>,
    ) -> Result<Option<Reconciliation>, AppError> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        workspace.chat_mut().push(ChatMessage::user(text));
        let outcome = self.run_turn(workspace, text, editor).await?;
        self.follow_up(workspace, outcome, editor).await.map(Some)
    }

    /// Load a saved translation into the assistant's memory
    ///
    /// Looks the record up by name; on a hit the assistant is called once
    /// more with the record's text as a hidden turn, on a miss a not-found
    /// message is appended and nothing else happens.
    pub async fn read_saved_translation(
        &self,
        workspace: &mut Workspace,
        name: &str,
        editor: Option<&EditorContext>,
    ) -> Result<Reconciliation, AppError> {
        let action = AssistantAction::read_saved_translation(name);
        let outcome = self.reconcile(workspace, action).await?;
        self.follow_up(workspace, outcome, editor).await
    }

    /// Empty the transcript completely
    pub fn clear_chat(&self, workspace: &mut Workspace) {
        workspace.chat_mut().reset(None);
        info!("Chat history cleared manually");
    }

    async fn follow_up(
        &self,
        workspace: &mut Workspace,
        outcome: Reconciliation,
        editor: Option<&EditorContext>,
    ) -> Result<Reconciliation, AppError> {
        let Some(injection) = outcome.memory_injection().map(str::to_string) else {
            return Ok(outcome);
        };
        workspace
            .chat_mut()
            .push(ChatMessage::memory_injection(injection.clone()));
        // One re-entry per submission; a second injection is not followed.
        self.run_turn(workspace, &injection, editor).await
    }

    /// Ask the assistant about the last message in the transcript and apply
    /// the answer
    async fn run_turn(
        &self,
        workspace: &mut Workspace,
        utterance: &str,
        editor: Option<&EditorContext>,
    ) -> Result<Reconciliation, AppError> {
        let action = {
            let messages = workspace.chat().messages();
            let prior = &messages[..messages.len().saturating_sub(1)];
            let turn = workspace.active_project().map(|project| AssistantTurn {
                utterance,
                history: prior,
                project,
                editor,
            });
            match turn {
                Ok(turn) => self.orchestrator.respond(self.client.as_ref(), &turn).await,
                Err(e) => Err(e),
            }
        };

        let result = match action {
            Ok(action) => self.reconcile(workspace, action).await,
            Err(e) => Err(e),
        };
        result.map_err(|e| {
            error!(error = %e, "Assistant turn failed");
            workspace
                .chat_mut()
                .push(ChatMessage::model(format!("Sorry, system error: {}", e)));
            e
        })
    }

    async fn reconcile(
        &self,
        workspace: &mut Workspace,
        action: AssistantAction,
    ) -> Result<Reconciliation, AppError> {
        self.reconciler.apply(action, workspace).await
    }
}
