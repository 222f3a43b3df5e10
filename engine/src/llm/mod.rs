//! Completion Service Abstraction Layer
//!
//! This module defines the conversation types exchanged with a chat completion
//! service and the `CompletionProvider` trait that concrete clients implement.
//! The orchestrator only talks to the trait, so tests can drive it with a mock
//! HTTP server or an in-process provider.

use async_trait::async_trait;
use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod openai;

/// Result type for completion operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur while calling a completion service
#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timeout")]
    Timeout,

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl From<LLMError> for EngineError {
    fn from(err: LLMError) -> Self {
        match err {
            LLMError::NetworkError(_) | LLMError::ProviderUnavailable(_) => {
                EngineError::Transport(err.to_string())
            }
            LLMError::Timeout => EngineError::LLMTimeout,
            other => EngineError::LLMProvider(other.to_string()),
        }
    }
}

/// One turn of a conversation transcript.
///
/// Each role carries only the fields that make sense for it: a tool result
/// cannot exist without the id of the invocation it answers, and only
/// assistant messages carry tool invocations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    /// Instructions or injected retrieval context
    System { content: String },

    /// Text typed by the user
    User { content: String },

    /// Model reply; `content` is `None` when the reply is only tool calls
    Assistant {
        content: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },

    /// Result of executing a tool invocation
    Tool {
        tool_call_id: String,
        content: String,
    },
}

impl Message {
    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    /// Create a plain-text assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    /// Create a new tool result message answering `tool_call_id`
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Tool {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
        }
    }

    pub fn role(&self) -> MessageRole {
        match self {
            Self::System { .. } => MessageRole::System,
            Self::User { .. } => MessageRole::User,
            Self::Assistant { .. } => MessageRole::Assistant,
            Self::Tool { .. } => MessageRole::Tool,
        }
    }

    /// Text content of the message, if any
    pub fn content(&self) -> Option<&str> {
        match self {
            Self::System { content } | Self::User { content } | Self::Tool { content, .. } => {
                Some(content.as_str())
            }
            Self::Assistant { content, .. } => content.as_deref(),
        }
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
    Tool,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::System => write!(f, "system"),
            MessageRole::Tool => write!(f, "tool"),
        }
    }
}

/// Tool call request from the model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolCall {
    /// Unique identifier, echoed back by the matching tool result
    pub id: String,

    /// Name of the function to call
    pub name: String,

    /// Arguments to pass to the function (raw JSON string, unparsed)
    pub arguments: String,
}

impl ToolCall {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// Description of a callable function advertised to the model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,

    /// JSON Schema of the argument object
    pub parameters: serde_json::Value,
}

/// Whether the model may call tools on a request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    /// The model decides whether to call zero or more tools
    Auto,

    /// The model must answer in natural language
    None,
}

impl ToolChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolChoice::Auto => "auto",
            ToolChoice::None => "none",
        }
    }
}

/// A single request to the completion service
#[derive(Debug, Clone)]
pub struct CompletionRequest<'a> {
    pub messages: &'a [Message],
    pub tools: &'a [ToolSchema],
    pub tool_choice: Option<ToolChoice>,
}

impl<'a> CompletionRequest<'a> {
    /// Request with no tools attached
    pub fn new(messages: &'a [Message]) -> Self {
        Self {
            messages,
            tools: &[],
            tool_choice: None,
        }
    }

    /// Attach tool schemas and a tool-use mode
    pub fn with_tools(mut self, tools: &'a [ToolSchema], choice: ToolChoice) -> Self {
        self.tools = tools;
        self.tool_choice = Some(choice);
        self
    }
}

/// Token accounting reported by the service
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// The assistant choice of a completion response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Completion {
    /// Model identifier reported by the service
    pub model: String,

    /// Assistant text; `None` when the service sent `null`
    pub content: Option<String>,

    /// Tool invocations requested by the model
    pub tool_calls: Vec<ToolCall>,

    pub usage: Option<Usage>,
}

impl Completion {
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Answer text, with a missing content treated as empty
    pub fn text(&self) -> String {
        self.content.clone().unwrap_or_default()
    }

    /// The assistant message to append to the transcript
    pub fn to_message(&self) -> Message {
        Message::Assistant {
            content: self.content.clone(),
            tool_calls: self.tool_calls.clone(),
        }
    }
}

/// Completion provider trait that service clients implement
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Returns the name of the provider (e.g., "openai")
    fn name(&self) -> &str;

    /// Model identifier sent with each request
    fn model(&self) -> &str;

    /// Submit the transcript and return the first choice
    ///
    /// # Errors
    /// * `LLMError::NetworkError` / `ProviderUnavailable` on transport failure
    /// * `LLMError::AuthenticationFailed`, `RateLimitExceeded`, `InvalidRequest`
    ///   on non-success HTTP status
    /// * `LLMError::ParseError` if the response body is not a completion
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<Completion>;
}
