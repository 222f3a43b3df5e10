//! Error types and handling
//!
//! This module provides the error types used throughout the librarian engine.
//! All errors implement the `LibrarianErrorExt` trait which provides
//! user-friendly hints and indicates whether errors are recoverable.
//!
//! # Security
//!
//! Error messages built from remote responses are scrubbed by the engine
//! before display, so API keys and bearer tokens never reach the terminal.

use thiserror::Error;

/// Trait for librarian error extensions
///
/// This trait provides additional context for errors, including user-friendly
/// hints and recoverability information. All engine errors implement this trait.
pub trait LibrarianErrorExt {
    /// Returns a user-friendly hint for the error
    ///
    /// The hint is safe to display to end users and does not contain
    /// secrets or internal implementation details.
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors end the current turn but leave the session usable.
    /// Non-recoverable errors typically require fixing configuration or data
    /// and restarting.
    fn is_recoverable(&self) -> bool;
}

/// Main engine error type
///
/// # Error Categories
///
/// - **Configuration**: Invalid or missing configuration
/// - **Transport**: Network/API failure calling the completion or embedding service
/// - **Tool arguments**: Malformed or missing `title` in a tool invocation
/// - **Index**: Collection store read/write failures
/// - **Book data**: Unreadable or malformed book summaries file
///
/// A title lookup miss is deliberately not represented here: the tool answers
/// with a sentinel string instead.
///
/// # Examples
///
/// ```
/// use sdk::errors::{EngineError, LibrarianErrorExt};
///
/// let error = EngineError::Transport("connection refused".to_string());
/// println!("Hint: {}", error.user_hint());
/// assert!(error.is_recoverable());
///
/// let fatal_error = EngineError::Config("missing model".to_string());
/// assert!(!fatal_error.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Network/API errors
    #[error("Transport error: {0}")]
    Transport(String),

    // LLM provider errors (non-transport: auth, rate limit, malformed reply)
    #[error("LLM provider error: {0}")]
    LLMProvider(String),

    #[error("LLM call timed out")]
    LLMTimeout,

    // Tool errors
    #[error("Invalid arguments for tool '{tool}': {reason}")]
    ToolArgument { tool: String, reason: String },

    // Semantic index errors
    #[error("Index error: {0}")]
    Index(String),

    // Book data errors
    #[error("Book data error: {0}")]
    BookData(String),

    // Keyring errors
    #[error("Keyring error: {0}")]
    KeyringError(String),

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LibrarianErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Config(_) => "Check your librarian.toml file and environment variables",
            Self::Transport(_) => "Could not reach the model service. Check your network",
            Self::LLMProvider(_) => "The model service rejected the request. Check your API key",
            Self::LLMTimeout => "The model service took too long to respond. Try again",
            Self::ToolArgument { .. } => "The assistant produced an invalid lookup. Try rephrasing",
            Self::Index(_) => "The book index is unavailable. Run 'librarian ingest'",
            Self::BookData(_) => "The book summaries file could not be loaded",
            Self::KeyringError(_) => "Failed to access secure storage. Set OPENAI_API_KEY instead",
            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::Config(_) | Self::BookData(_) | Self::KeyringError(_) => false,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_argument_display() {
        let err = EngineError::ToolArgument {
            tool: "get_summary_by_title".to_string(),
            reason: "missing field `title`".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid arguments for tool 'get_summary_by_title': missing field `title`"
        );
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: EngineError = io.into();
        assert!(matches!(err, EngineError::Io(_)));
        assert_eq!(err.user_hint(), "File system operation failed");
    }
}
