pub mod catalog;

pub use catalog::{load_books, BookCatalog, SUMMARY_NOT_FOUND};

use sdk::errors::EngineError;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::llm::{Message, ToolCall, ToolSchema};

/// Name of the summary lookup function advertised to the model
pub const GET_SUMMARY_BY_TITLE: &str = "get_summary_by_title";

#[derive(Debug, Deserialize)]
struct SummaryArgs {
    title: String,
}

/// Registry of the functions the model may call.
///
/// There is exactly one: `get_summary_by_title`, backed by a shared,
/// read-only [`BookCatalog`].
pub struct ToolRegistry {
    catalog: Arc<BookCatalog>,
    schemas: Vec<ToolSchema>,
}

impl ToolRegistry {
    pub fn new(catalog: Arc<BookCatalog>) -> Self {
        Self {
            catalog,
            schemas: vec![summary_schema()],
        }
    }

    /// Schemas to attach to completion requests.
    pub fn schemas(&self) -> &[ToolSchema] {
        &self.schemas
    }

    pub fn catalog(&self) -> &BookCatalog {
        &self.catalog
    }

    /// Execute every invocation of a registered function.
    ///
    /// Returns one tool message per executed invocation, in order, each
    /// carrying the id of the call it answers. Calls to unknown functions are
    /// skipped.
    ///
    /// # Errors
    /// Returns `EngineError::ToolArgument` if an invocation's arguments are
    /// not a JSON object with a string `title`.
    pub fn dispatch(&self, calls: &[ToolCall]) -> Result<Vec<Message>, EngineError> {
        let mut results = Vec::with_capacity(calls.len());

        for call in calls {
            if call.name != GET_SUMMARY_BY_TITLE {
                debug!("Ignoring call to unregistered tool '{}'", call.name);
                continue;
            }

            debug!("Dispatching tool '{}' with args: {}", call.name, call.arguments);
            let args: SummaryArgs = serde_json::from_str(&call.arguments).map_err(|e| {
                warn!("Malformed arguments for '{}': {}", call.name, e);
                EngineError::ToolArgument {
                    tool: call.name.clone(),
                    reason: e.to_string(),
                }
            })?;

            let summary = self.catalog.get_summary_by_title(&args.title);
            results.push(Message::tool_result(call.id.clone(), summary));
        }

        Ok(results)
    }
}

fn summary_schema() -> ToolSchema {
    ToolSchema {
        name: GET_SUMMARY_BY_TITLE.to_string(),
        description: "Returnează rezumatul complet pentru un titlu exact de carte.".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "title": {
                    "type": "string",
                    "description": "Titlul exact al cărții"
                }
            },
            "required": ["title"]
        }),
    }
}
