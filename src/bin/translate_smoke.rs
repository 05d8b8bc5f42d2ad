//! Manual smoke test for a live provider
//! This is a utility binary, not part of the library
//!
//! Usage: `translate_smoke [--save] <text>` (reads stdin when no text is
//! given). Uses the workspace file and database from the default locations
//! and the `API_KEY` environment variable when the workspace has no key.

use anyhow::Context;
use novtl::config::Config;
use novtl::library::TranslationLibrary;
use novtl::provider::{self, build_http_client};
use novtl::store::SqliteRecordStore;
use novtl::translation::{TranslationOrchestrator, TranslationSettings};
use novtl::workspace::WorkspaceFile;
use std::io::{Read, Write};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env();
    info!(
        db_path = %config.database.path,
        timeout_secs = config.provider.request_timeout_secs,
        "Configuration loaded"
    );

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let save = args.first().map(|a| a == "--save").unwrap_or(false);
    if save {
        args.remove(0);
    }
    let text = if args.is_empty() {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read text from stdin")?;
        buffer
    } else {
        args.join(" ")
    };

    let workspace_path = WorkspaceFile::default_path();
    let mut workspace = WorkspaceFile::load_from_file(&workspace_path)
        .with_context(|| format!("Failed to load {}", workspace_path.display()))?;

    let provider_config = workspace
        .provider
        .resolve(config.provider.fallback_api_key.as_deref())?;
    let client = provider::connect(provider_config, build_http_client(&config)?)?;

    let project = workspace.active_project()?;
    let project_id = project.id.clone();
    let settings = TranslationSettings::from_project(project);
    info!(project = %project.name, provider = %client.provider(), "Translating");

    let orchestrator = TranslationOrchestrator::new(config.translation.clone());
    let mut stdout = std::io::stdout();
    let mut sink = |fragment: &str| {
        let _ = stdout.write_all(fragment.as_bytes());
        let _ = stdout.flush();
    };

    let Some(outcome) = orchestrator
        .translate(client.as_ref(), &text, &settings, &mut sink)
        .await?
    else {
        eprintln!("Nothing to translate.");
        return Ok(());
    };
    println!();

    if let Some(detected) = outcome.detected_language.as_deref() {
        if let Some(language) = workspace.apply_detected_language(detected) {
            info!(language, "Source language detected");
            WorkspaceFile::save_to_file(&workspace, &workspace_path)?;
        }
    }

    if save {
        let store = SqliteRecordStore::new(&config.database.path).await?;
        let library = TranslationLibrary::new(Arc::new(store));
        let record = library.save_output(&project_id, &outcome.text).await?;
        eprintln!("Saved as \"{}\"", record.name);
    }

    info!(fragments = outcome.fragment_count, chars = outcome.text.chars().count(), "Done");
    Ok(())
}
