//! Smart Librarian Engine Library
//!
//! This library provides the core functionality of the librarian: semantic
//! retrieval over book summaries, the summary lookup tool, and the
//! conversation orchestrator that ties them to a chat completion service.
//! It is used by both the main binary and integration tests.

/// Configuration management module
pub mod config;

/// Secret management module
pub mod secrets;

/// Chat completion service abstraction layer
pub mod llm;

/// Semantic index over book summaries
pub mod index;

/// Book summary lookup tool
pub mod tools;

/// Conversation orchestrator
pub mod agent;

/// JSONL log of completed turns
pub mod response_log;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
