//! In-memory vector store backed by a [`FlatIndex`].
//!
//! This module provides [`InMemoryVectorStore`], which keeps the chunk list
//! and its vectors side by side under a `tokio::sync::RwLock` and persists
//! them as two JSON files:
//!
//! - `<name>.index` holds the flat index (metric, dimensions, vectors)
//! - `<name>_documents.json` holds the chunk list, pretty-printed UTF-8
//!
//! Both files are required to load, and their lengths must agree.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};
use crate::flat::{DistanceMetric, FlatIndex};
use crate::vectorstore::VectorStore;

/// Path of the vector file for `name` under `dir`.
pub fn index_file(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.index"))
}

/// Path of the chunk list file for `name` under `dir`.
pub fn documents_file(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}_documents.json"))
}

#[derive(Debug)]
struct StoredSet {
    index: FlatIndex,
    chunks: Vec<Chunk>,
}

/// An in-memory vector store using exact search.
///
/// # Example
///
/// ```rust,ignore
/// use docrag::{DistanceMetric, InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new(DistanceMetric::L2);
/// store.replace(chunks, embeddings).await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    metric: DistanceMetric,
    state: RwLock<Option<StoredSet>>,
}

impl InMemoryVectorStore {
    /// Create a new empty store that will build indexes with `metric`.
    pub fn new(metric: DistanceMetric) -> Self {
        Self { metric, state: RwLock::new(None) }
    }
}

async fn read_file(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path).await.map_err(|e| RagError::io(path, e))
}

async fn write_file(path: &Path, contents: String) -> Result<()> {
    tokio::fs::write(path, contents).await.map_err(|e| RagError::io(path, e))
}

fn corrupt(path: &Path, message: impl Into<String>) -> RagError {
    RagError::CorruptIndex { path: path.to_path_buf(), message: message.into() }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn replace(&self, chunks: Vec<Chunk>, embeddings: Vec<Vec<f32>>) -> Result<()> {
        if chunks.len() != embeddings.len() {
            return Err(RagError::CountMismatch {
                chunks: chunks.len(),
                embeddings: embeddings.len(),
            });
        }
        let dimensions = embeddings.first().map(Vec::len).unwrap_or(0);
        let mut index = FlatIndex::new(dimensions, self.metric);
        index.add(embeddings)?;

        debug!(chunk_count = chunks.len(), dimensions, "replacing stored set");
        *self.state.write().await = Some(StoredSet { index, chunks });
        Ok(())
    }

    async fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        let state = self.state.read().await;
        let set = state.as_ref().ok_or(RagError::IndexNotBuilt)?;
        if set.index.is_empty() {
            return Ok(Vec::new());
        }

        let hits = set.index.search(embedding, top_k)?;
        Ok(hits
            .into_iter()
            .filter_map(|(position, distance)| {
                set.chunks.get(position).map(|chunk| SearchResult { chunk: chunk.clone(), distance })
            })
            .collect())
    }

    async fn save(&self, dir: &Path, name: &str) -> Result<()> {
        let state = self.state.read().await;
        let set = state.as_ref().ok_or(RagError::IndexNotBuilt)?;

        tokio::fs::create_dir_all(dir).await.map_err(|e| RagError::io(dir, e))?;

        let index_path = index_file(dir, name);
        let index_json = serde_json::to_string(&set.index)
            .map_err(|e| corrupt(&index_path, format!("failed to serialize index: {e}")))?;
        write_file(&index_path, index_json).await?;

        let documents_path = documents_file(dir, name);
        let documents_json = serde_json::to_string_pretty(&set.chunks)
            .map_err(|e| corrupt(&documents_path, format!("failed to serialize chunks: {e}")))?;
        write_file(&documents_path, documents_json).await?;

        info!(
            index = %index_path.display(),
            documents = %documents_path.display(),
            chunk_count = set.chunks.len(),
            "saved index"
        );
        Ok(())
    }

    async fn load(&self, dir: &Path, name: &str) -> Result<()> {
        let index_path = index_file(dir, name);
        let documents_path = documents_file(dir, name);

        let index: FlatIndex = serde_json::from_str(&read_file(&index_path).await?)
            .map_err(|e| corrupt(&index_path, e.to_string()))?;
        index.validate().map_err(|msg| corrupt(&index_path, msg))?;
        if index.metric() != self.metric {
            return Err(corrupt(
                &index_path,
                format!(
                    "index was built with {:?} distance, store is configured for {:?}",
                    index.metric(),
                    self.metric
                ),
            ));
        }

        let chunks: Vec<Chunk> = serde_json::from_str(&read_file(&documents_path).await?)
            .map_err(|e| corrupt(&documents_path, e.to_string()))?;

        if chunks.len() != index.len() {
            return Err(corrupt(
                dir,
                format!("index holds {} vectors but {} chunks were saved", index.len(), chunks.len()),
            ));
        }
        if let Some((position, chunk)) = chunks.iter().enumerate().find(|(i, c)| c.id != *i) {
            return Err(corrupt(
                &documents_path,
                format!("chunk at position {position} has id {}", chunk.id),
            ));
        }

        info!(index = %index_path.display(), chunk_count = chunks.len(), "loaded index");
        *self.state.write().await = Some(StoredSet { index, chunks });
        Ok(())
    }

    async fn clear(&self) {
        *self.state.write().await = None;
    }

    async fn is_built(&self) -> bool {
        self.state.read().await.is_some()
    }

    async fn len(&self) -> usize {
        self.state.read().await.as_ref().map(|s| s.chunks.len()).unwrap_or(0)
    }

    async fn dimensions(&self) -> Option<usize> {
        self.state.read().await.as_ref().map(|s| s.index.dimensions())
    }
}
