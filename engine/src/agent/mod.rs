//! Conversation Orchestrator
//!
//! This module turns a user utterance into a book recommendation: it injects
//! retrieved context into the transcript, lets the model call the summary
//! tool, and runs the follow-up completion over the tool results.

pub mod context;
pub mod core;
pub mod session;

pub use context::{render_context, NO_CONTEXT, SYSTEM_PROMPT};
pub use core::{Orchestrator, TurnOutcome, DEFAULT_TOP_K};
pub use session::{Session, Turn};
