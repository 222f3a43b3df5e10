//! Example demonstrating a full recommendation turn without network access
//!
//! A keyword index stands in for the embedding service and a scripted
//! provider plays the chat model: the first call asks for a summary, the
//! second answers using the tool result.

use async_trait::async_trait;
use librarian_engine::agent::Orchestrator;
use librarian_engine::index::SemanticIndex;
use librarian_engine::llm::{Completion, CompletionProvider, CompletionRequest, Message, Result, ToolCall};
use librarian_engine::response_log::ResponseLogger;
use librarian_engine::tools::{BookCatalog, ToolRegistry, GET_SUMMARY_BY_TITLE};
use sdk::errors::EngineError;
use sdk::types::{BookRecord, RetrievalHit};
use std::sync::Arc;

struct KeywordIndex {
    books: Vec<BookRecord>,
}

#[async_trait]
impl SemanticIndex for KeywordIndex {
    async fn retrieve(&self, query: &str, k: usize) -> std::result::Result<Vec<RetrievalHit>, EngineError> {
        let query = query.to_lowercase();
        Ok(self
            .books
            .iter()
            .filter(|b| b.themes.iter().any(|t| query.contains(t.as_str())))
            .take(k)
            .map(|b| RetrievalHit::new(b.summary_short.clone(), b.title.clone(), b.themes.clone()))
            .collect())
    }
}

/// Picks the first title from the context block, then quotes the tool result
struct ScriptedModel;

#[async_trait]
impl CompletionProvider for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-1"
    }

    async fn complete(&self, request: CompletionRequest<'_>) -> Result<Completion> {
        let tool_result = request.messages.iter().rev().find_map(|m| match m {
            Message::Tool { content, .. } => Some(content.clone()),
            _ => None,
        });

        if let Some(summary) = tool_result {
            return Ok(Completion {
                model: self.model().to_string(),
                content: Some(format!("Îți recomand această carte. Rezumat: {}", summary)),
                tool_calls: vec![],
                usage: None,
            });
        }

        let title = request
            .messages
            .iter()
            .filter_map(Message::content)
            .filter_map(|c| c.lines().find_map(|l| l.strip_prefix("- ")))
            .filter_map(|l| l.split(':').next())
            .last();

        let completion = match title {
            Some(title) => Completion {
                model: self.model().to_string(),
                content: None,
                tool_calls: vec![ToolCall::new(
                    "call_1",
                    GET_SUMMARY_BY_TITLE,
                    serde_json::json!({ "title": title }).to_string(),
                )],
                usage: None,
            },
            None => Completion {
                model: self.model().to_string(),
                content: Some("Nu am găsit nimic potrivit.".to_string()),
                tool_calls: vec![],
                usage: None,
            },
        };
        Ok(completion)
    }
}

fn book(title: &str, themes: &[&str], short: &str, full: &str) -> BookRecord {
    BookRecord {
        title: title.to_string(),
        themes: themes.iter().map(|t| t.to_string()).collect(),
        summary_short: short.to_string(),
        summary_full: full.to_string(),
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), EngineError> {
    let books = vec![
        book(
            "The Hobbit",
            &["friendship", "adventure"],
            "Bilbo Baggins joins a company of dwarves.",
            "Bilbo Baggins is swept into a quest to reclaim the Lonely Mountain from the dragon Smaug.",
        ),
        book(
            "1984",
            &["dystopia", "surveillance"],
            "Winston Smith lives under Big Brother.",
            "In Oceania, Winston Smith rebels against the Party and its total surveillance.",
        ),
    ];

    let catalog = Arc::new(BookCatalog::from_records(&books));
    let orchestrator = Orchestrator::new(
        Arc::new(KeywordIndex { books }),
        Arc::new(ScriptedModel),
        Arc::new(ToolRegistry::new(catalog)),
        Arc::new(ResponseLogger::disabled()),
    );

    for question in ["I want a book about friendship and adventure", "Ceva despre surveillance"] {
        let outcome = orchestrator.ask(question).await?;
        println!("Q: {}", question);
        println!("A: {}", outcome.answer);
        println!("   tools used: {}\n", outcome.used_tools());
    }

    Ok(())
}
