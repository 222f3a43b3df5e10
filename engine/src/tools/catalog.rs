//! Title to full-summary catalogue built from the book summaries file.

use sdk::errors::EngineError;
use sdk::types::BookRecord;
use std::collections::HashMap;
use std::path::Path;

/// Returned (not raised) when a title has no summary
pub const SUMMARY_NOT_FOUND: &str = "Summary not found. Verifică dacă titlul este exact.";

/// Read the book summaries file: a JSON array of book records.
///
/// # Errors
/// Returns `EngineError::BookData` if the file is missing or malformed.
pub fn load_books(path: &Path) -> Result<Vec<BookRecord>, EngineError> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        EngineError::BookData(format!("Failed to read book summaries {:?}: {}", path, e))
    })?;

    let books: Vec<BookRecord> = serde_json::from_str(&contents).map_err(|e| {
        EngineError::BookData(format!("Malformed book summaries {:?}: {}", path, e))
    })?;

    tracing::debug!("Loaded {} book record(s) from {:?}", books.len(), path);
    Ok(books)
}

/// Immutable exact-title lookup of full summaries
#[derive(Debug, Clone, Default)]
pub struct BookCatalog {
    summaries: HashMap<String, String>,
}

impl BookCatalog {
    /// Build the catalogue; on duplicate titles the last record wins.
    pub fn from_records(books: &[BookRecord]) -> Self {
        let mut summaries = HashMap::with_capacity(books.len());
        for book in books {
            if summaries
                .insert(book.title.clone(), book.summary_full.clone())
                .is_some()
            {
                tracing::warn!("Duplicate title '{}'; keeping the last record", book.title);
            }
        }
        Self { summaries }
    }

    /// Full summary for an exact, case-sensitive title, or [`SUMMARY_NOT_FOUND`].
    pub fn get_summary_by_title(&self, title: &str) -> String {
        self.summaries
            .get(title)
            .cloned()
            .unwrap_or_else(|| SUMMARY_NOT_FOUND.to_string())
    }

    pub fn contains(&self, title: &str) -> bool {
        self.summaries.contains_key(title)
    }

    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }
}
