//! Book and retrieval types shared by the engine and its front ends

use serde::{Deserialize, Serialize};

/// Separator used when themes are flattened into a single metadata string
pub const THEME_SEPARATOR: &str = ", ";

/// A book as it appears in the book summaries file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    /// Unique title, used verbatim by the summary lookup
    pub title: String,

    /// Ordered list of themes
    #[serde(default)]
    pub themes: Vec<String>,

    /// Short summary; this is the text that gets embedded and indexed
    pub summary_short: String,

    /// Full summary returned by the lookup tool
    pub summary_full: String,
}

/// Metadata attached to an indexed document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitMetadata {
    pub title: String,
    pub themes: Vec<String>,
}

/// A single result of a semantic index query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalHit {
    /// The indexed document text (a short summary)
    pub document: String,

    /// Title and themes of the book the document belongs to
    pub metadata: HitMetadata,
}

impl RetrievalHit {
    pub fn new(document: impl Into<String>, title: impl Into<String>, themes: Vec<String>) -> Self {
        Self {
            document: document.into(),
            metadata: HitMetadata {
                title: title.into(),
                themes,
            },
        }
    }
}

/// Flatten themes into the comma-joined form stored as index metadata
pub fn flatten_themes(themes: &[String]) -> String {
    themes.join(THEME_SEPARATOR)
}

/// Split a flattened theme string back into its parts
///
/// Empty segments are dropped, so an empty string yields no themes.
pub fn split_themes(flat: &str) -> Vec<String> {
    flat.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_record_deserialization() {
        let json = r#"{
            "title": "The Hobbit",
            "themes": ["friendship", "adventure"],
            "summary_short": "A hobbit goes on a journey.",
            "summary_full": "Bilbo Baggins leaves the Shire."
        }"#;
        let book: BookRecord = serde_json::from_str(json).unwrap();
        assert_eq!(book.title, "The Hobbit");
        assert_eq!(book.themes, vec!["friendship", "adventure"]);
    }

    #[test]
    fn test_book_record_missing_themes_defaults_empty() {
        let json = r#"{"title": "T", "summary_short": "s", "summary_full": "f"}"#;
        let book: BookRecord = serde_json::from_str(json).unwrap();
        assert!(book.themes.is_empty());
    }

    #[test]
    fn test_theme_flattening() {
        let themes = vec!["friendship".to_string(), "adventure".to_string()];
        let flat = flatten_themes(&themes);
        assert_eq!(flat, "friendship, adventure");
        assert_eq!(split_themes(&flat), themes);
    }

    #[test]
    fn test_split_themes_empty() {
        assert!(split_themes("").is_empty());
        assert!(split_themes(" , ").is_empty());
    }
}
