//! Projects and workspace state
//!
//! A [`Workspace`] owns every project, the provider selection and the
//! assistant transcript. It is passed by reference to whatever needs it;
//! glossary and chat changes coming from the assistant go through the
//! reconciler only.

use crate::chat::{ChatHistory, ChatMessage};
use crate::error::AppError;
use crate::glossary::Glossary;
use crate::language::{self, AUTO_DETECT, DEFAULT_TARGET_LANGUAGE};
use crate::library::TranslationLibrary;
use crate::provider::ProviderSettings;
use crate::store::PersistenceError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

/// Name of the project every new workspace starts with
pub const DEFAULT_PROJECT_NAME: &str = "My First Novel";

/// First assistant message of a fresh transcript
pub const GREETING: &str =
    "Hi! I'm your writing assistant. Ask me to save or remove glossary terms, or to look at a saved chapter.";

/// Current settings file format version
const WORKSPACE_FILE_VERSION: u32 = 1;

/// A translation project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Unique identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Source language, possibly the auto-detect sentinel
    pub source_language: String,
    /// Target language
    pub target_language: String,
    /// Free-form style instruction for the translator
    #[serde(default)]
    pub translation_instruction: String,
    /// Fixed term translations
    #[serde(default)]
    pub glossary: Glossary,
}

impl Project {
    /// New project with an empty glossary
    pub fn new(name: &str, source_language: &str, target_language: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            translation_instruction: String::new(),
            glossary: Glossary::new(),
        }
    }

    /// Whether the source language is left to the provider
    pub fn is_auto_detect(&self) -> bool {
        language::is_auto_detect(&self.source_language)
    }
}

/// All state the author works with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    /// Provider selection and keys
    pub provider: ProviderSettings,
    assistant_chat: ChatHistory,
    active_project_id: String,
    projects: Vec<Project>,
}

impl Default for Workspace {
    fn default() -> Self {
        let project = Project::new(DEFAULT_PROJECT_NAME, AUTO_DETECT, DEFAULT_TARGET_LANGUAGE);
        Self {
            provider: ProviderSettings::default(),
            assistant_chat: ChatHistory::seeded(ChatMessage::model(GREETING)),
            active_project_id: project.id.clone(),
            projects: vec![project],
        }
    }
}

impl Workspace {
    /// All projects in creation order
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    /// Id of the project currently being worked on
    pub fn active_project_id(&self) -> &str {
        &self.active_project_id
    }

    /// The project currently being worked on
    pub fn active_project(&self) -> Result<&Project, AppError> {
        self.projects
            .iter()
            .find(|p| p.id == self.active_project_id)
            .ok_or_else(|| AppError::NotFound(format!("project {}", self.active_project_id)))
    }

    /// Mutable access to the active project
    pub fn active_project_mut(&mut self) -> Result<&mut Project, AppError> {
        let id = self.active_project_id.clone();
        self.projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| AppError::NotFound(format!("project {}", id)))
    }

    /// The assistant transcript
    pub fn chat(&self) -> &ChatHistory {
        &self.assistant_chat
    }

    pub(crate) fn chat_mut(&mut self) -> &mut ChatHistory {
        &mut self.assistant_chat
    }

    /// Create a project and make it active
    ///
    /// The new project copies the active project's languages and style
    /// instruction but starts with an empty glossary.
    ///
    /// # Errors
    /// * `AppError::InvalidInput` if the name is blank
    pub fn create_project(&mut self, name: &str) -> Result<&Project, AppError> {
        if name.trim().is_empty() {
            return Err(AppError::InvalidInput("Project name cannot be empty".to_string()));
        }

        let project = match self.active_project() {
            Ok(active) => {
                let mut p = Project::new(name, &active.source_language, &active.target_language);
                p.translation_instruction = active.translation_instruction.clone();
                p
            }
            Err(_) => Project::new(name, AUTO_DETECT, DEFAULT_TARGET_LANGUAGE),
        };

        info!(project_id = %project.id, name = %project.name, "Created project");
        self.active_project_id = project.id.clone();
        self.projects.push(project);
        Ok(&self.projects[self.projects.len() - 1])
    }

    /// Make another project active
    pub fn switch_project(&mut self, id: &str) -> Result<(), AppError> {
        if !self.projects.iter().any(|p| p.id == id) {
            return Err(AppError::NotFound(format!("project {}", id)));
        }
        self.active_project_id = id.to_string();
        Ok(())
    }

    /// Delete a project together with its saved translations
    ///
    /// The saved translations are cleared first; if that fails the project is
    /// kept. When the active project is deleted, the first remaining project
    /// becomes active.
    ///
    /// # Errors
    /// * `AppError::InvalidInput` if it is the last project
    /// * `AppError::NotFound` if no project has this id
    /// * `AppError::Persistence` if the saved translations could not be cleared
    pub async fn delete_project(
        &mut self,
        id: &str,
        library: &TranslationLibrary,
    ) -> Result<(), AppError> {
        if self.projects.len() <= 1 {
            return Err(AppError::InvalidInput(
                "At least one project must remain".to_string(),
            ));
        }
        let index = self
            .projects
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| AppError::NotFound(format!("project {}", id)))?;

        library.clear_project(id).await?;

        let removed = self.projects.remove(index);
        if self.active_project_id == removed.id {
            self.active_project_id = self.projects[0].id.clone();
        }
        info!(project_id = %removed.id, name = %removed.name, "Deleted project");
        Ok(())
    }

    /// Swap source and target language of the active project
    ///
    /// Does nothing while the source is auto-detect, since the sentinel is
    /// not a valid target. Returns whether a swap happened.
    pub fn swap_languages(&mut self) -> Result<bool, AppError> {
        let project = self.active_project_mut()?;
        if project.is_auto_detect() {
            return Ok(false);
        }
        std::mem::swap(&mut project.source_language, &mut project.target_language);
        Ok(true)
    }

    /// Record a provider-detected source language
    ///
    /// Applies only while the active project is on auto-detect and the name
    /// matches a supported language. Returns the language written.
    pub fn apply_detected_language(&mut self, detected: &str) -> Option<&'static str> {
        let project = self.active_project_mut().ok()?;
        if !project.is_auto_detect() {
            return None;
        }
        let matched = language::match_supported_language(detected)?;
        project.source_language = matched.to_string();
        Some(matched)
    }

    fn validate(mut self) -> Result<Self, PersistenceError> {
        if self.projects.is_empty() {
            return Err(PersistenceError::InvalidData(
                "workspace has no projects".to_string(),
            ));
        }
        if !self.projects.iter().any(|p| p.id == self.active_project_id) {
            self.active_project_id = self.projects[0].id.clone();
        }
        Ok(self)
    }
}

/// On-disk form of a workspace
#[derive(Debug, Serialize, Deserialize)]
struct WorkspaceFileData {
    /// Format version (for future migration support)
    version: u32,
    workspace: Workspace,
}

/// Settings file persistence
pub struct WorkspaceFile;

impl WorkspaceFile {
    /// Save a workspace to a JSON file, creating parent directories
    ///
    /// # Arguments
    /// * `workspace` - Workspace to save
    /// * `path` - Path to the JSON file
    pub fn save_to_file<P: AsRef<Path>>(
        workspace: &Workspace,
        path: P,
    ) -> Result<(), PersistenceError> {
        let data = WorkspaceFileData {
            version: WORKSPACE_FILE_VERSION,
            workspace: workspace.clone(),
        };

        let json = serde_json::to_string_pretty(&data)
            .map_err(|e| PersistenceError::Json(e.to_string()))?;

        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| PersistenceError::Io(e.to_string()))?;
            }
        }
        fs::write(path.as_ref(), json).map_err(|e| PersistenceError::Io(e.to_string()))?;

        Ok(())
    }

    /// Load a workspace from a JSON file
    ///
    /// A missing file yields the default workspace.
    ///
    /// # Returns
    /// * `Ok(Workspace)` if successful
    /// * `Err(PersistenceError)` on I/O, JSON or version errors
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Workspace, PersistenceError> {
        if !path.as_ref().exists() {
            return Ok(Workspace::default());
        }

        let json = fs::read_to_string(path.as_ref())
            .map_err(|e| PersistenceError::Io(e.to_string()))?;

        let data: WorkspaceFileData =
            serde_json::from_str(&json).map_err(|e| PersistenceError::Json(e.to_string()))?;

        if data.version != WORKSPACE_FILE_VERSION {
            return Err(PersistenceError::InvalidData(format!(
                "Unsupported workspace version: {}",
                data.version
            )));
        }

        data.workspace.validate()
    }

    /// Default settings file location under the user's home directory
    pub fn default_path() -> PathBuf {
        if let Some(home) = std::env::var_os("HOME") {
            let mut path = PathBuf::from(home);
            path.push(".novtl");
            path.push("workspace.json");
            path
        } else {
            PathBuf::from("workspace.json")
        }
    }
}
