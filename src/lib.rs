//! novtl: glossary-enforced novel translation
//!
//! This library streams translations through pluggable text-generation
//! providers while enforcing a project glossary, and runs a writing
//! assistant that can change that glossary through tool calls.
//!
//! Flow of a translation: [`translation::TranslationOrchestrator`] builds the
//! instruction and streams fragments from a [`provider::ProviderClient`].
//! Flow of an assistant turn: [`session::AssistantSession`] asks the
//! [`assistant::AssistantOrchestrator`] for an action and hands it to the
//! [`reconcile::ActionReconciler`], which updates the
//! [`workspace::Workspace`] and reads saved translations through a
//! [`store::RecordStore`].

pub mod assistant;
pub mod chat;
pub mod config;
pub mod error;
pub mod glossary;
pub mod language;
pub mod library;
pub mod provider;
pub mod reconcile;
pub mod session;
/// Saved-translation persistence
///
/// Record store trait, SQLite and in-memory implementations, and per-record
/// write serialization.
pub mod store;
pub mod translation;
pub mod workspace;

#[cfg(test)]
mod test_support;
