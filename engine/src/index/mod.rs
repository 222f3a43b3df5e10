//! Semantic Index
//!
//! Retrieves the books whose short summaries are semantically closest to a
//! free-text query. The collection is built ahead of time by [`ingest`] and
//! persisted under the configured index directory; at query time the text is
//! embedded with the same model and matched by cosine similarity.

use async_trait::async_trait;
use sdk::errors::EngineError;
use sdk::types::{split_themes, RetrievalHit};
use std::sync::Arc;

pub mod embedding;
pub mod ingest;
pub mod store;

pub use embedding::{EmbeddingProvider, OpenAIEmbedder};
pub use ingest::ingest_books;
pub use store::{cosine_similarity, CollectionStore, StoredDocument, StoredMetadata};

/// Anything that can answer "which books match this text".
#[async_trait]
pub trait SemanticIndex: Send + Sync {
    /// Return at most `k` hits, most relevant first.
    ///
    /// An empty index yields an empty list, never an error.
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievalHit>, EngineError>;
}

/// Book collection paired with the embedder used to query it
pub struct BookIndex {
    store: CollectionStore,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl BookIndex {
    pub fn new(store: CollectionStore, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        if let Some(built_with) = store.embedding_model() {
            if built_with != embedder.model() {
                tracing::warn!(
                    "Collection '{}' was built with '{}' but queries use '{}'; results will be poor until it is re-ingested",
                    store.name(),
                    built_with,
                    embedder.model()
                );
            }
        }

        if store.is_empty() {
            tracing::warn!(
                "Collection '{}' is empty; run `librarian ingest` to index the book summaries",
                store.name()
            );
        }

        Self { store, embedder }
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn store(&self) -> &CollectionStore {
        &self.store
    }
}

#[async_trait]
impl SemanticIndex for BookIndex {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievalHit>, EngineError> {
        if k == 0 || self.store.is_empty() {
            return Ok(Vec::new());
        }

        let mut vectors = self.embedder.embed(&[query.to_string()]).await?;
        let query_vector = vectors.pop().ok_or_else(|| {
            EngineError::Index("Embedding service returned no vector for the query".to_string())
        })?;

        let hits: Vec<RetrievalHit> = self
            .store
            .nearest(&query_vector, k)
            .into_iter()
            .map(|(score, doc)| {
                tracing::trace!("{:.3} {}", score, doc.metadata.title);
                RetrievalHit::new(
                    doc.document.clone(),
                    doc.metadata.title.clone(),
                    split_themes(&doc.metadata.themes),
                )
            })
            .collect();

        tracing::debug!("Retrieved {} hit(s) for query", hits.len());
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Embeds by keyword so tests can steer similarity
    struct KeywordEmbedder {
        calls: AtomicUsize,
    }

    impl KeywordEmbedder {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }

        fn vector(text: &str) -> Vec<f32> {
            let text = text.to_lowercase();
            vec![
                if text.contains("dragon") { 1.0 } else { 0.0 },
                if text.contains("war") { 1.0 } else { 0.0 },
                0.1,
            ]
        }
    }

    #[async_trait]
    impl EmbeddingProvider for KeywordEmbedder {
        fn model(&self) -> &str {
            "keyword"
        }

        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EngineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts.iter().map(|t| Self::vector(t)).collect())
        }
    }

    fn stored(title: &str, summary: &str, themes: &str) -> StoredDocument {
        StoredDocument {
            id: title.to_string(),
            document: summary.to_string(),
            metadata: StoredMetadata {
                title: title.to_string(),
                themes: themes.to_string(),
            },
            embedding: KeywordEmbedder::vector(summary),
        }
    }

    fn index_with(docs: Vec<StoredDocument>) -> (TempDir, BookIndex, Arc<KeywordEmbedder>) {
        let dir = TempDir::new().unwrap();
        let mut store = CollectionStore::open(dir.path(), "books").unwrap();
        store.set_embedding_model("keyword");
        store.add(docs);
        let embedder = Arc::new(KeywordEmbedder::new());
        let index = BookIndex::new(store, embedder.clone());
        (dir, index, embedder)
    }

    #[tokio::test]
    async fn test_retrieve_ranks_and_restores_themes() {
        let (_dir, index, _) = index_with(vec![
            stored("1984", "A war-torn surveillance state", "dystopia, war"),
            stored("The Hobbit", "A dragon guards treasure", "friendship, adventure"),
        ]);

        let hits = index.retrieve("books about dragons", 1).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].metadata.title, "The Hobbit");
        assert_eq!(hits[0].metadata.themes, vec!["friendship", "adventure"]);
        assert_eq!(hits[0].document, "A dragon guards treasure");
    }

    #[tokio::test]
    async fn test_retrieve_never_exceeds_k() {
        let (_dir, index, _) = index_with(vec![
            stored("A", "dragon", ""),
            stored("B", "war", ""),
            stored("C", "dragon war", ""),
        ]);

        assert_eq!(index.retrieve("dragon", 2).await.unwrap().len(), 2);
        assert_eq!(index.retrieve("dragon", 10).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_empty_index_returns_nothing_without_embedding() {
        let (_dir, index, embedder) = index_with(vec![]);

        let hits = index.retrieve("anything", 5).await.unwrap();
        assert!(hits.is_empty());
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_zero_k_returns_nothing() {
        let (_dir, index, embedder) = index_with(vec![stored("A", "dragon", "")]);

        assert!(index.retrieve("dragon", 0).await.unwrap().is_empty());
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }
}
