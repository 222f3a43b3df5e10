//! Builds the book collection from summary records.

use sdk::errors::EngineError;
use sdk::types::{flatten_themes, BookRecord};

use uuid::Uuid;

use super::embedding::EmbeddingProvider;
use super::store::{CollectionStore, StoredDocument, StoredMetadata};

/// Embed each book's short summary and add it to `store`, then save.
///
/// With `reset` the collection is emptied first. Without it, ingesting into a
/// collection built by a different embedding model is refused, since the
/// vectors would not be comparable.
///
/// Returns the number of documents added.
///
/// # Errors
/// * `EngineError::Index` on a model mismatch or when saving fails
/// * Any error from the embedding service
pub async fn ingest_books(
    books: &[BookRecord],
    store: &mut CollectionStore,
    embedder: &dyn EmbeddingProvider,
    reset: bool,
) -> Result<usize, EngineError> {
    if reset {
        tracing::info!("Resetting collection '{}'", store.name());
        store.clear();
    }

    if let Some(model) = store.embedding_model() {
        if model != embedder.model() && !store.is_empty() {
            return Err(EngineError::Index(format!(
                "Collection '{}' was built with '{}', not '{}'; rerun with --reset",
                store.name(),
                model,
                embedder.model()
            )));
        }
    }
    store.set_embedding_model(embedder.model());

    if books.is_empty() {
        tracing::warn!("No books to ingest");
    }

    let texts: Vec<String> = books.iter().map(|b| b.summary_short.clone()).collect();
    let vectors = embedder.embed(&texts).await?;

    let documents = books
        .iter()
        .zip(vectors)
        .map(|(book, embedding)| StoredDocument {
            id: Uuid::new_v4().to_string(),
            document: book.summary_short.clone(),
            metadata: StoredMetadata {
                title: book.title.clone(),
                themes: flatten_themes(&book.themes),
            },
            embedding,
        });
    store.add(documents);
    let added = books.len();

    store.save()?;
    tracing::info!(
        "Indexed {} book(s) into '{}' ({} total)",
        added,
        store.name(),
        store.len()
    );
    Ok(added)
}
