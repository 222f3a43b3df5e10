//! Persisted document collection with brute-force cosine search.
//!
//! A collection lives in a single JSON file, `<dir>/<name>.json`, holding the
//! documents, their metadata and embeddings, and the embedding model that
//! produced them. Search is an O(n) scan, fine for a book catalogue.

use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Metadata stored with each document; themes are flattened to one string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMetadata {
    pub title: String,
    pub themes: String,
}

/// One indexed document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    pub document: String,
    pub metadata: StoredMetadata,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CollectionFile {
    name: String,
    #[serde(default)]
    embedding_model: Option<String>,
    #[serde(default)]
    documents: Vec<StoredDocument>,
}

/// A named collection loaded in memory and saved back explicitly.
#[derive(Debug)]
pub struct CollectionStore {
    path: PathBuf,
    name: String,
    embedding_model: Option<String>,
    documents: Vec<StoredDocument>,
}

impl CollectionStore {
    /// Open the collection `name` under `dir`.
    ///
    /// A missing file yields an empty collection; nothing is written until
    /// [`save`](Self::save) is called.
    ///
    /// # Errors
    /// Returns `EngineError::Index` if the file exists but cannot be read or parsed.
    pub fn open(dir: &Path, name: &str) -> Result<Self, EngineError> {
        let path = dir.join(format!("{}.json", name));

        let file = if path.exists() {
            let contents = fs::read_to_string(&path).map_err(|e| {
                EngineError::Index(format!("Failed to read collection {:?}: {}", path, e))
            })?;
            serde_json::from_str::<CollectionFile>(&contents).map_err(|e| {
                EngineError::Index(format!("Corrupt collection {:?}: {}", path, e))
            })?
        } else {
            tracing::debug!("Collection {:?} does not exist yet", path);
            CollectionFile::default()
        };

        Ok(Self {
            path,
            name: name.to_string(),
            embedding_model: file.embedding_model,
            documents: file.documents,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Embedding model the collection was built with, if any documents were added
    pub fn embedding_model(&self) -> Option<&str> {
        self.embedding_model.as_deref()
    }

    pub fn set_embedding_model(&mut self, model: impl Into<String>) {
        self.embedding_model = Some(model.into());
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> &[StoredDocument] {
        &self.documents
    }

    /// Append documents. Ids are not deduplicated.
    pub fn add(&mut self, documents: impl IntoIterator<Item = StoredDocument>) {
        self.documents.extend(documents);
    }

    /// Remove every document and forget the embedding model.
    pub fn clear(&mut self) {
        self.documents.clear();
        self.embedding_model = None;
    }

    /// Return up to `k` documents most similar to `query`, best first.
    ///
    /// Ties keep insertion order.
    pub fn nearest(&self, query: &[f32], k: usize) -> Vec<(f64, &StoredDocument)> {
        let mut scored: Vec<(f64, &StoredDocument)> = self
            .documents
            .iter()
            .map(|doc| (cosine_similarity(query, &doc.embedding), doc))
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        scored
    }

    /// Write the collection to disk atomically (temp file, then rename).
    ///
    /// # Errors
    /// Returns `EngineError::Index` on any I/O or serialization failure.
    pub fn save(&self) -> Result<(), EngineError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Index(format!("Failed to create index directory: {}", e))
            })?;
        }

        let file = CollectionFile {
            name: self.name.clone(),
            embedding_model: self.embedding_model.clone(),
            documents: self.documents.clone(),
        };
        let json = serde_json::to_string(&file)
            .map_err(|e| EngineError::Index(format!("Failed to serialize collection: {}", e)))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .map_err(|e| EngineError::Index(format!("Failed to write collection: {}", e)))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| EngineError::Index(format!("Failed to replace collection: {}", e)))?;

        tracing::debug!("Saved {} document(s) to {:?}", self.len(), self.path);
        Ok(())
    }
}

/// Cosine similarity in [-1, 1].
///
/// Vectors of different length or with zero norm score 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn doc(id: &str, title: &str, embedding: Vec<f32>) -> StoredDocument {
        StoredDocument {
            id: id.to_string(),
            document: format!("summary of {}", title),
            metadata: StoredMetadata {
                title: title.to_string(),
                themes: "friendship, adventure".to_string(),
            },
            embedding,
        }
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-9);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-9);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_open_missing_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = CollectionStore::open(dir.path(), "books").unwrap();
        assert!(store.is_empty());
        assert!(store.embedding_model().is_none());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_nearest_orders_by_similarity() {
        let dir = TempDir::new().unwrap();
        let mut store = CollectionStore::open(dir.path(), "books").unwrap();
        store.add(vec![
            doc("1", "Far", vec![0.0, 1.0]),
            doc("2", "Near", vec![1.0, 0.1]),
            doc("3", "Middle", vec![1.0, 1.0]),
        ]);

        let hits = store.nearest(&[1.0, 0.0], 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].1.metadata.title, "Near");
        assert_eq!(hits[1].1.metadata.title, "Middle");
        assert!(hits[0].0 >= hits[1].0);
    }

    #[test]
    fn test_nearest_ties_keep_insertion_order() {
        let dir = TempDir::new().unwrap();
        let mut store = CollectionStore::open(dir.path(), "books").unwrap();
        store.add(vec![
            doc("1", "First", vec![1.0, 0.0]),
            doc("2", "Second", vec![1.0, 0.0]),
        ]);

        let hits = store.nearest(&[1.0, 0.0], 5);
        assert_eq!(hits[0].1.metadata.title, "First");
        assert_eq!(hits[1].1.metadata.title, "Second");
    }

    #[test]
    fn test_save_and_reopen() {
        let dir = TempDir::new().unwrap();
        let mut store = CollectionStore::open(dir.path(), "books").unwrap();
        store.set_embedding_model("text-embedding-3-small");
        store.add(vec![doc("1", "The Hobbit", vec![0.5, 0.5])]);
        store.save().unwrap();

        let reopened = CollectionStore::open(dir.path(), "books").unwrap();
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.embedding_model(), Some("text-embedding-3-small"));
        assert_eq!(reopened.documents()[0].metadata.title, "The Hobbit");
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("books.json"), "not json").unwrap();
        let err = CollectionStore::open(dir.path(), "books").unwrap_err();
        assert!(matches!(err, EngineError::Index(_)));
    }

    #[test]
    fn test_clear() {
        let dir = TempDir::new().unwrap();
        let mut store = CollectionStore::open(dir.path(), "books").unwrap();
        store.set_embedding_model("m");
        store.add(vec![doc("1", "A", vec![1.0])]);
        store.clear();
        assert!(store.is_empty());
        assert!(store.embedding_model().is_none());
    }
}
