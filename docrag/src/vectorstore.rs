//! Vector store trait for holding an embedded chunk set and searching it.

use std::path::Path;

use async_trait::async_trait;

use crate::document::{Chunk, SearchResult};
use crate::error::Result;

/// A storage backend for one document's chunks and their embeddings.
///
/// A store is either empty (never built) or holds exactly one chunk set whose
/// `i`th chunk corresponds to the `i`th vector. [`replace`](VectorStore::replace)
/// swaps the whole set; there is no incremental update.
///
/// # Example
///
/// ```rust,ignore
/// use docrag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::default();
/// store.replace(chunks, embeddings).await?;
/// let results = store.search(&query_embedding, 3).await?;
/// store.save(Path::new("models/manual_index"), "manual").await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Replace the stored set. `chunks` and `embeddings` must have equal length.
    async fn replace(&self, chunks: Vec<Chunk>, embeddings: Vec<Vec<f32>>) -> Result<()>;

    /// Search for the `top_k` chunks nearest to the given embedding.
    ///
    /// Returns results ordered by ascending distance. Fails with
    /// [`RagError::IndexNotBuilt`](crate::RagError::IndexNotBuilt) if the store is empty.
    async fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<SearchResult>>;

    /// Persist the stored set under `dir` using `name` as the file stem.
    async fn save(&self, dir: &Path, name: &str) -> Result<()>;

    /// Replace the stored set with one previously written by [`save`](VectorStore::save).
    async fn load(&self, dir: &Path, name: &str) -> Result<()>;

    /// Drop the stored set.
    async fn clear(&self);

    /// Returns true once a set has been stored or loaded.
    async fn is_built(&self) -> bool;

    /// Number of stored chunks.
    async fn len(&self) -> usize;

    /// Dimensionality of stored vectors, if built.
    async fn dimensions(&self) -> Option<usize>;
}
