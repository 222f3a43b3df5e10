//! Librarian SDK
//!
//! Shared library providing domain types and the error taxonomy.
//! This crate is used by the engine and by any front end built on top of it.

/// Error types and handling
pub mod errors;

/// Book and retrieval types
pub mod types;

// Re-export commonly used types
pub use errors::{EngineError, LibrarianErrorExt};
pub use types::{BookRecord, HitMetadata, RetrievalHit};
