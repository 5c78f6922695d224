//! Embedding index: embeds chunks into a [`VectorStore`] and answers nearest-chunk queries.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info};

use crate::document::{Chunk, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// Couples an [`EmbeddingProvider`] with a [`VectorStore`] so that chunks and
/// queries are always embedded the same way.
#[derive(Clone)]
pub struct EmbeddingIndex {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
}

impl EmbeddingIndex {
    /// Create an index over the given backends.
    pub fn new(
        embedding_provider: Arc<dyn EmbeddingProvider>,
        vector_store: Arc<dyn VectorStore>,
    ) -> Self {
        Self { embedding_provider, vector_store }
    }

    /// Return a reference to the embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    /// Return a reference to the vector store.
    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.vector_store
    }

    /// Embed every chunk and replace the store's contents with them.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Embedding`] if the provider fails or returns the
    /// wrong number of vectors, and [`RagError::DimensionMismatch`] if a vector
    /// does not have the provider's declared dimensionality.
    pub async fn embed_and_index(&self, chunks: Vec<Chunk>) -> Result<()> {
        let started = Instant::now();
        let provider = self.embedding_provider.name().to_string();
        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();

        let embeddings = self.embedding_provider.embed_batch(&texts).await.map_err(|e| {
            error!(provider = %provider, error = %e, "embedding failed during indexing");
            e
        })?;

        if embeddings.len() != chunks.len() {
            return Err(RagError::Embedding {
                provider,
                message: format!(
                    "expected {} embeddings, received {}",
                    chunks.len(),
                    embeddings.len()
                ),
            });
        }
        let expected = self.embedding_provider.dimensions();
        if let Some(bad) = embeddings.iter().find(|e| e.len() != expected) {
            return Err(RagError::DimensionMismatch { expected, actual: bad.len() });
        }

        let chunk_count = chunks.len();
        self.vector_store.replace(chunks, embeddings).await?;
        info!(
            provider = %provider,
            chunk_count,
            dimensions = expected,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "built vector index"
        );
        Ok(())
    }

    /// Return up to `k` chunks nearest to `query`, most similar first.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::IndexNotBuilt`] before [`embed_and_index`](Self::embed_and_index)
    /// or [`load`](Self::load), and embedding errors from the provider.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        if !self.vector_store.is_built().await {
            return Err(RagError::IndexNotBuilt);
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedding_provider.embed(query).await.map_err(|e| {
            error!(error = %e, "embedding failed during query");
            e
        })?;
        let results = self.vector_store.search(&query_embedding, k).await?;
        info!(result_count = results.len(), top_k = k, "retrieved chunks");
        Ok(results)
    }

    /// Persist the index under `dir`.
    pub async fn save(&self, dir: &Path, name: &str) -> Result<()> {
        self.vector_store.save(dir, name).await
    }

    /// Restore an index previously written by [`save`](Self::save).
    pub async fn load(&self, dir: &Path, name: &str) -> Result<()> {
        self.vector_store.load(dir, name).await?;
        if let Some(stored) = self.vector_store.dimensions().await {
            let expected = self.embedding_provider.dimensions();
            if stored != expected && self.vector_store.len().await > 0 {
                self.vector_store.clear().await;
                return Err(RagError::CorruptIndex {
                    path: dir.to_path_buf(),
                    message: format!(
                        "index was built with {stored}-dimensional vectors, provider '{}' produces {expected}",
                        self.embedding_provider.name()
                    ),
                });
            }
        }
        Ok(())
    }

    /// Returns true once an index has been built or loaded.
    pub async fn is_built(&self) -> bool {
        self.vector_store.is_built().await
    }

    /// Drop the current index.
    pub async fn reset(&self) {
        self.vector_store.clear().await;
    }
}
