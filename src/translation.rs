//! Streaming translation
//!
//! [`TranslationOrchestrator`] drives one translation call: it builds the
//! system instruction from the project settings, streams the provider's
//! reply, forwards every fragment to the caller's sink as it arrives and
//! returns the assembled text. Nothing is buffered or reordered, and on
//! failure the fragments already delivered stay delivered.

use crate::config::TranslationConfig;
use crate::error::AppError;
use crate::glossary::{filter_relevant, GlossaryItem};
use crate::language::{self, DEFAULT_TARGET_LANGUAGE};
use crate::provider::{PromptMessage, ProviderClient, StreamEvent, TextRequest, WireFormat};
use crate::workspace::Project;
use futures_util::StreamExt;
use tracing::{debug, info, warn};

/// Style instruction used when the project leaves it blank
pub const DEFAULT_INSTRUCTION: &str = "Translate in a flowing, natural novel style.";

/// Effective settings of one translation call
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationSettings {
    /// Source language, possibly the auto-detect sentinel
    pub source_language: String,
    /// Target language; blank means [`DEFAULT_TARGET_LANGUAGE`]
    pub target_language: String,
    /// Style instruction; blank means [`DEFAULT_INSTRUCTION`]
    pub instruction: String,
    /// Full project glossary
    pub glossary: Vec<GlossaryItem>,
}

impl TranslationSettings {
    /// Settings of a project
    pub fn from_project(project: &Project) -> Self {
        Self {
            source_language: project.source_language.clone(),
            target_language: project.target_language.clone(),
            instruction: project.translation_instruction.clone(),
            glossary: project.glossary.items().to_vec(),
        }
    }

    fn target(&self) -> &str {
        non_blank(&self.target_language).unwrap_or(DEFAULT_TARGET_LANGUAGE)
    }

    fn instruction(&self) -> &str {
        non_blank(&self.instruction).unwrap_or(DEFAULT_INSTRUCTION)
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Build the translator's system instruction for `text`
///
/// Sections appear in a fixed order: role framing, the mandatory glossary
/// (only the entries that occur in `text`, and only if there are any), the
/// style instruction and the formatting rules. The same inputs always yield
/// the same instruction.
pub fn build_system_instruction(settings: &TranslationSettings, text: &str) -> String {
    let mut sections = Vec::new();

    let source = if language::is_auto_detect(&settings.source_language) {
        "Detect the source language yourself.".to_string()
    } else {
        format!("The source language is {}.", settings.source_language.trim())
    };
    sections.push(format!(
        "ROLE: Expert novel translator into {}.\n\n\
         TASK: Translate the input text while strictly adhering to the glossary. {}\n\n\
         [PROCESS]\n\
         1. Read the text sentence by sentence.\n\
         2. Before translating a sentence, check it against the MANDATORY GLOSSARY.\n\
         3. Replace glossary terms immediately.\n\
         4. Keep the prose flowing naturally.",
        settings.target(),
        source
    ));

    let relevant = filter_relevant(&settings.glossary, text);
    if !relevant.is_empty() {
        let pairs = relevant
            .iter()
            .map(|item| format!("• \"{}\" → \"{}\"", item.original, item.translated))
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(format!(
            "[MANDATORY GLOSSARY]\n\
             The following terms appear in the text and MUST be translated exactly as listed.\n\
             {}\n\
             Whenever the source term appears, use the target term.",
            pairs
        ));
    }

    sections.push(format!("[STYLE]\n{}", settings.instruction()));
    sections.push(
        "[FORMATTING]\n1. No Markdown headers (#).\n2. Use plain paragraphs.".to_string(),
    );

    sections.join("\n\n")
}

/// Receiver of streamed fragments
///
/// Implemented for any `FnMut(&str)` closure.
pub trait FragmentSink: Send {
    /// Called once per fragment, in arrival order
    fn on_fragment(&mut self, fragment: &str);
}

impl<F> FragmentSink for F
where
    F: FnMut(&str) + Send,
{
    fn on_fragment(&mut self, fragment: &str) {
        self(fragment)
    }
}

/// Result of a completed translation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationOutcome {
    /// Exact concatenation of every fragment
    pub text: String,
    /// Language the provider reported, only under auto-detect
    pub detected_language: Option<String>,
    /// Number of fragments received
    pub fragment_count: usize,
}

/// Drives streaming translation calls
#[derive(Debug, Clone, Default)]
pub struct TranslationOrchestrator {
    config: TranslationConfig,
}

impl TranslationOrchestrator {
    /// Create an orchestrator with the given sampling configuration
    pub fn new(config: TranslationConfig) -> Self {
        Self { config }
    }

    /// Translate `text`, forwarding fragments to `sink`
    ///
    /// Blank input is a no-op and returns `Ok(None)` without calling the
    /// provider.
    ///
    /// # Arguments
    /// * `client` - Connected provider
    /// * `text` - Source text
    /// * `settings` - Effective project settings
    /// * `sink` - Receives each fragment as soon as it arrives
    ///
    /// # Errors
    /// A provider failure ends the call with that error; fragments already
    /// passed to `sink` are not retracted.
    pub async fn translate<S>(
        &self,
        client: &dyn ProviderClient,
        text: &str,
        settings: &TranslationSettings,
        sink: &mut S,
    ) -> Result<Option<TranslationOutcome>, AppError>
    where
        S: FragmentSink + ?Sized,
    {
        if text.trim().is_empty() {
            return Ok(None);
        }

        let provider = client.provider();
        let system = build_system_instruction(settings, text);
        let request = TextRequest {
            system,
            messages: vec![PromptMessage::user(text)],
            temperature: self.config.temperature,
            top_p: (provider.wire_format() == WireFormat::NativeStream)
                .then_some(self.config.top_p),
        };

        info!(
            provider = %provider,
            input_len = text.len(),
            glossary_hits = filter_relevant(&settings.glossary, text).len(),
            "Starting translation"
        );

        let auto_detect = language::is_auto_detect(&settings.source_language);
        let mut stream = client.stream_text(&request).await?;
        let mut outcome = TranslationOutcome {
            text: String::new(),
            detected_language: None,
            fragment_count: 0,
        };

        while let Some(event) = stream.next().await {
            match event {
                Ok(StreamEvent::Fragment(fragment)) => {
                    sink.on_fragment(&fragment);
                    outcome.text.push_str(&fragment);
                    outcome.fragment_count += 1;
                }
                Ok(StreamEvent::DetectedLanguage(detected)) => {
                    if auto_detect {
                        debug!(detected = %detected, "Provider reported source language");
                        outcome.detected_language = Some(detected);
                    }
                }
                Err(e) => {
                    warn!(
                        provider = %provider,
                        fragment_count = outcome.fragment_count,
                        error = %e,
                        "Translation stream failed"
                    );
                    return Err(e);
                }
            }
        }

        info!(
            provider = %provider,
            fragment_count = outcome.fragment_count,
            output_len = outcome.text.len(),
            "Translation finished"
        );
        Ok(Some(outcome))
    }

    /// Translate without observing fragments as they arrive
    pub async fn translate_buffered(
        &self,
        client: &dyn ProviderClient,
        text: &str,
        settings: &TranslationSettings,
    ) -> Result<Option<TranslationOutcome>, AppError> {
        let mut ignore = |_: &str| {};
        self.translate(client, text, settings, &mut ignore).await
    }
}
