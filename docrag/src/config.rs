//! Configuration for the RAG pipeline.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};
use crate::flat::DistanceMetric;
use crate::generation::{JAPANESE_PROMPT_TEMPLATE, PromptTemplate};

/// How a document's text is cut into chunks.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChunkingStrategy {
    /// Fixed character windows, see [`FixedSizeChunker`](crate::FixedSizeChunker).
    #[default]
    Fixed,
    /// Separator-aware splitting, see [`RecursiveChunker`](crate::RecursiveChunker).
    Recursive,
}

impl std::str::FromStr for ChunkingStrategy {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "fixed" => Ok(Self::Fixed),
            "recursive" => Ok(Self::Recursive),
            other => Err(RagError::Config(format!("unknown chunking strategy '{other}'"))),
        }
    }
}

/// Configuration parameters for the RAG pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Chunker used when splitting documents.
    pub chunking: ChunkingStrategy,
    /// Number of chunks retrieved per question.
    pub top_k: usize,
    /// Distance used by the flat index.
    pub metric: DistanceMetric,
    /// Root directory under which index directories are created.
    pub models_dir: PathBuf,
    /// Suffix appended to the document's base name to form the index directory.
    pub index_suffix: String,
    /// Always rebuild instead of loading a persisted index.
    pub rebuild_index: bool,
    /// Persist freshly built indexes.
    pub save_index: bool,
    /// Prompt template with `{context}` and `{question}` placeholders.
    pub prompt_template: String,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            chunking: ChunkingStrategy::Fixed,
            top_k: 3,
            metric: DistanceMetric::L2,
            models_dir: PathBuf::from("models"),
            index_suffix: "index".to_string(),
            rebuild_index: false,
            save_index: true,
            prompt_template: JAPANESE_PROMPT_TEMPLATE.to_string(),
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Check that the parameters are consistent.
    ///
    /// Run by [`RagConfigBuilder::build`], and again by the loader and
    /// pipeline builders for configs whose fields were edited afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if:
    /// - `chunk_size == 0`
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    /// - `index_suffix` is empty
    /// - the prompt template lacks `{context}` or `{question}`
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::Config("chunk_size must be greater than zero".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(RagError::Config("top_k must be greater than zero".to_string()));
        }
        if self.index_suffix.is_empty() {
            return Err(RagError::Config("index_suffix must not be empty".to_string()));
        }
        PromptTemplate::new(self.prompt_template.clone())?;
        Ok(())
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Choose the chunking strategy.
    pub fn chunking(mut self, strategy: ChunkingStrategy) -> Self {
        self.config.chunking = strategy;
        self
    }

    /// Set the number of chunks retrieved per question.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the index distance metric.
    pub fn metric(mut self, metric: DistanceMetric) -> Self {
        self.config.metric = metric;
        self
    }

    /// Set the directory that holds persisted indexes.
    pub fn models_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.models_dir = dir.into();
        self
    }

    /// Set the suffix of derived index directories.
    pub fn index_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.index_suffix = suffix.into();
        self
    }

    /// Force a rebuild in [`RagPipeline::prepare`](crate::RagPipeline::prepare).
    pub fn rebuild_index(mut self, rebuild: bool) -> Self {
        self.config.rebuild_index = rebuild;
        self
    }

    /// Persist indexes after building them.
    pub fn save_index(mut self, save: bool) -> Self {
        self.config.save_index = save;
        self
    }

    /// Replace the prompt template.
    pub fn prompt_template(mut self, template: impl Into<String>) -> Self {
        self.config.prompt_template = template.into();
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] under the conditions listed on
    /// [`RagConfig::validate`].
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
