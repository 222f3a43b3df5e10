//! Command handlers for CLI operations
//!
//! This module implements the handlers for all CLI commands:
//! - chat: interactive multi-turn recommendation session
//! - ask: answer one question and exit
//! - ingest: build the semantic index from the book summaries file
//! - setup: store the API key in the keychain
//! - doctor: validate configuration, data and credentials

use anyhow::{Context, Result};
use sdk::errors::{EngineError, LibrarianErrorExt};
use serde_json::json;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::agent::{Orchestrator, Session, TurnOutcome};
use crate::config::Config;
use crate::index::{ingest_books, BookIndex, CollectionStore, EmbeddingProvider, OpenAIEmbedder};
use crate::llm::openai::OpenAIProvider;
use crate::response_log::ResponseLogger;
use crate::secrets::{
    resolve_api_key, scrub_secrets, SecretManager, SecretString, API_KEY_ENV, KEYRING_API_KEY,
    KEYRING_SERVICE,
};
use crate::tools::{load_books, BookCatalog, ToolRegistry};

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

fn api_key() -> Result<SecretString, EngineError> {
    let manager = SecretManager::new(KEYRING_SERVICE);
    resolve_api_key(std::env::var(API_KEY_ENV).ok(), &manager)
}

fn embedder(config: &Config, api_key: SecretString) -> Result<OpenAIEmbedder, EngineError> {
    OpenAIEmbedder::new(
        &config.embedding,
        api_key,
        Duration::from_secs(config.llm.timeout_secs),
    )
}

/// Wire up the orchestrator from configuration.
///
/// # Errors
/// Fails if no API key is available, the book file cannot be loaded or the
/// index collection is unreadable.
pub fn build_orchestrator(config: &Config) -> Result<Orchestrator, EngineError> {
    let api_key = api_key()?;

    let books = load_books(&config.books.path)?;
    let catalog = Arc::new(BookCatalog::from_records(&books));
    let tools = Arc::new(ToolRegistry::new(catalog));

    let store = CollectionStore::open(&config.index.dir, &config.index.collection)?;
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(embedder(config, api_key.clone())?);
    let index = Arc::new(BookIndex::new(store, embedder));

    let provider = Arc::new(OpenAIProvider::new(&config.llm, api_key)?);
    let logger = Arc::new(ResponseLogger::new(config.core.response_log.clone()));

    tracing::info!(
        "Orchestrator ready: model={}, {} book(s), {} indexed",
        config.llm.model,
        books.len(),
        index.len()
    );

    Ok(Orchestrator::new(index, provider, tools, logger)
        .with_top_k(config.index.top_k)
        .with_timeout(Duration::from_secs(config.llm.timeout_secs)))
}

fn outcome_json(outcome: &TurnOutcome) -> serde_json::Value {
    json!({
        "answer": outcome.answer,
        "model": outcome.model,
        "usage": outcome.usage,
        "tool_calls": outcome.tool_calls.iter().map(|c| json!({
            "id": c.id,
            "name": c.name,
            "arguments": c.arguments,
        })).collect::<Vec<_>>(),
    })
}

fn error_json(e: &EngineError) -> serde_json::Value {
    json!({
        "error": scrub_secrets(&e.to_string()),
        "hint": e.user_hint(),
        "recoverable": e.is_recoverable(),
    })
}

/// Answer a single question
pub async fn handle_ask(text: String, config: &Config, format: OutputFormat) -> Result<()> {
    let orchestrator = build_orchestrator(config)?;

    match orchestrator.ask(&text).await {
        Ok(outcome) => {
            match format {
                OutputFormat::Text => println!("{}", outcome.answer),
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&outcome_json(&outcome))?)
                }
            }
            Ok(())
        }
        Err(e) => {
            if let OutputFormat::Json = format {
                println!("{}", serde_json::to_string_pretty(&error_json(&e))?);
            }
            Err(anyhow::anyhow!(
                "{} ({})",
                scrub_secrets(&e.to_string()),
                e.user_hint()
            ))
        }
    }
}

/// Interactive chat loop
///
/// Reads lines from stdin until EOF or `exit`/`quit`. A failed turn prints
/// the error and the loop continues; the session keeps its history.
pub async fn handle_chat(config: &Config, format: OutputFormat) -> Result<()> {
    let orchestrator = Arc::new(build_orchestrator(config)?);
    let mut session = Session::new(orchestrator);
    tracing::info!("Chat session {} started", session.id());

    if let OutputFormat::Text = format {
        println!("📚 Smart Librarian (CLI). Scrie 'exit' pentru a ieși.");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        if let OutputFormat::Text = format {
            print!("Tu: ");
            io::stdout().flush()?;
        }

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();

        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            if let OutputFormat::Text = format {
                println!("👋 La revedere!");
            }
            break;
        }

        match session.ask(input).await {
            Ok(outcome) => match format {
                OutputFormat::Text => println!("Asistent: {}\n", outcome.answer),
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string(&outcome_json(&outcome))?)
                }
            },
            Err(e) => {
                tracing::debug!("Turn failed: {:?}", e);
                match format {
                    OutputFormat::Text => {
                        println!("⚠️ Eroare: {}", scrub_secrets(&e.to_string()));
                        println!("   {}\n", e.user_hint());
                    }
                    OutputFormat::Json => println!("{}", serde_json::to_string(&error_json(&e))?),
                }
            }
        }
    }

    tracing::info!("Chat session ended after {} turn(s)", session.turns().len());
    Ok(())
}

/// Index the book summaries
pub async fn handle_ingest(reset: bool, config: &Config, format: OutputFormat) -> Result<()> {
    let books = load_books(&config.books.path)?;
    let embedder = embedder(config, api_key()?)?;
    let mut store = CollectionStore::open(&config.index.dir, &config.index.collection)?;

    if let OutputFormat::Text = format {
        println!(
            "Indexing {} book(s) from {} into '{}'...",
            books.len(),
            config.books.path.display(),
            store.name()
        );
    }

    let added = ingest_books(&books, &mut store, &embedder, reset)
        .await
        .context("Ingestion failed")?;

    match format {
        OutputFormat::Text => {
            println!("✓ Indexed {} book(s)", added);
            println!("  Collection: {}", store.path().display());
            println!("  Documents:  {}", store.len());
            println!("  Model:      {}", embedder.model());
        }
        OutputFormat::Json => {
            let output = json!({
                "status": "completed",
                "added": added,
                "total": store.len(),
                "collection": store.name(),
                "path": store.path(),
                "embedding_model": embedder.model(),
                "reset": reset,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

/// Store the API key in the keychain
pub async fn handle_setup() -> Result<()> {
    println!("Smart Librarian setup");
    println!();
    print!("OpenAI API key (leave empty to skip): ");
    io::stdout().flush()?;

    let mut key = String::new();
    io::stdin().read_line(&mut key)?;
    let key = key.trim();

    if key.is_empty() {
        println!("Skipped. Set {} in the environment instead.", API_KEY_ENV);
        return Ok(());
    }

    SecretManager::new(KEYRING_SERVICE).set_secret(KEYRING_API_KEY, key)?;
    println!("✓ API key stored in the '{}' keychain service", KEYRING_SERVICE);
    Ok(())
}

/// Validate configuration, data files, index and credentials
pub async fn handle_doctor(config: &Config, format: OutputFormat) -> Result<()> {
    let mut issues = Vec::new();
    let mut checks: Vec<(&str, String)> = Vec::new();

    // Config is already validated when loaded
    checks.push(("Configuration", "Valid".to_string()));
    checks.push(("Chat model", config.llm.model.clone()));

    match load_books(&config.books.path) {
        Ok(books) => {
            let catalog = BookCatalog::from_records(&books);
            checks.push(("Book summaries", format!("{} title(s)", catalog.len())));
            if catalog.is_empty() {
                issues.push(format!("{} contains no books", config.books.path.display()));
            }
        }
        Err(e) => {
            checks.push(("Book summaries", "Unreadable".to_string()));
            issues.push(e.to_string());
        }
    }

    match CollectionStore::open(&config.index.dir, &config.index.collection) {
        Ok(store) if store.is_empty() => {
            checks.push(("Index", "Empty".to_string()));
            issues.push("The index is empty. Run 'librarian ingest'.".to_string());
        }
        Ok(store) => {
            checks.push(("Index", format!("{} document(s)", store.len())));
            match store.embedding_model() {
                Some(model) if model == config.embedding.model => {
                    checks.push(("Embedding model", model.to_string()));
                }
                Some(model) => {
                    checks.push(("Embedding model", format!("{} (mismatch)", model)));
                    issues.push(format!(
                        "Index built with '{}' but '{}' is configured. Run 'librarian ingest --reset'.",
                        model, config.embedding.model
                    ));
                }
                None => checks.push(("Embedding model", "Unknown".to_string())),
            }
        }
        Err(e) => {
            checks.push(("Index", "Unreadable".to_string()));
            issues.push(e.to_string());
        }
    }

    match api_key() {
        Ok(_) => checks.push(("API key", "Configured".to_string())),
        Err(e) => {
            checks.push(("API key", "Not configured".to_string()));
            issues.push(e.to_string());
        }
    }

    let log_dir = config
        .core
        .response_log
        .parent()
        .filter(|p| !p.as_os_str().is_empty());
    match log_dir {
        Some(dir) if !dir.exists() => {
            checks.push(("Response log", "Directory missing".to_string()));
            issues.push(format!("Response log directory does not exist: {:?}", dir));
        }
        _ => checks.push((
            "Response log",
            config.core.response_log.display().to_string(),
        )),
    }

    match format {
        OutputFormat::Text => {
            println!("Smart Librarian Diagnostics");
            println!("===========================");
            println!();

            println!("System Checks:");
            for (check, status) in &checks {
                println!("  {:<20} {}", format!("{}:", check), status);
            }

            println!();

            if issues.is_empty() {
                println!("✓ All checks passed!");
            } else {
                println!("⚠ Issues found:");
                println!();
                for (i, issue) in issues.iter().enumerate() {
                    println!("  {}. {}", i + 1, issue);
                }
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "checks": checks.iter().map(|(name, status)| {
                    json!({
                        "name": name,
                        "status": status
                    })
                }).collect::<Vec<_>>(),
                "issues": issues,
                "healthy": issues.is_empty()
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
