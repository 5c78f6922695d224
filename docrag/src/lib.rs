//! # docrag
//!
//! Retrieval-augmented question answering over a single text or PDF document,
//! answered in Japanese by a local LLM.
//!
//! ## Overview
//!
//! A document goes through four stages:
//!
//! - [`DocumentLoader`] reads `.txt`/`.pdf` files and cuts them into overlapping [`Chunk`]s
//! - [`EmbeddingIndex`] embeds chunks with an [`EmbeddingProvider`] into a [`VectorStore`]
//! - [`format_context`] turns the nearest chunks into a numbered context block
//! - [`AnswerGenerator`] renders a [`PromptTemplate`] and calls a [`LanguageModel`]
//!
//! [`RagPipeline`] ties them together, decides between building and loading
//! a persisted index, and refuses questions until an index is in place.
//!
//! ## Backends
//!
//! | Concern | Implementations |
//! |---------|-----------------|
//! | Embeddings | [`HashEmbeddingProvider`], `ollama::OllamaEmbeddingProvider` |
//! | Vector store | [`InMemoryVectorStore`] (exact L2 or cosine search) |
//! | Language model | `ollama::OllamaModel` |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docrag::{RagConfig, RagPipeline};
//! use docrag::ollama::{OllamaConfig, OllamaEmbeddingProvider, OllamaModel};
//!
//! let config = RagConfig::builder().top_k(3).build()?;
//! let pipeline = RagPipeline::builder()
//!     .config(config)
//!     .embedding_provider(Arc::new(OllamaEmbeddingProvider::detect(OllamaConfig::new("bge-m3")).await?))
//!     .language_model(Arc::new(OllamaModel::new(OllamaConfig::new("gemma:7b"))?))
//!     .build()?;
//!
//! pipeline.prepare("data/manual.pdf").await?;
//! let answer = pipeline.ask("重要なポイントを3つ教えて").await?;
//! println!("{}", answer.text);
//! ```
//!
//! ## Features
//!
//! - `ollama` (default): Ollama embedding and generation backends
//! - `pdf` (default): PDF text extraction

pub mod chunking;
pub mod config;
pub mod context;
pub mod document;
pub mod embedding;
pub mod error;
pub mod flat;
pub mod generation;
pub mod inmemory;
pub mod loader;
#[cfg(feature = "ollama")]
pub mod ollama;
pub mod pipeline;
pub mod retrieval;
pub mod vectorstore;

pub use chunking::{Chunker, FixedSizeChunker, RecursiveChunker, TextSpan};
pub use config::{ChunkingStrategy, RagConfig, RagConfigBuilder};
pub use context::format_context;
pub use document::{Answer, Chunk, ChunkMetadata, SearchResult};
pub use embedding::{EmbeddingProvider, HashEmbeddingProvider};
pub use error::{RagError, Result};
pub use flat::{DistanceMetric, FlatIndex};
pub use generation::{AnswerGenerator, JAPANESE_PROMPT_TEMPLATE, LanguageModel, PromptTemplate};
pub use inmemory::InMemoryVectorStore;
pub use loader::{DocumentFormat, DocumentLoader, is_supported, supported_extensions};
pub use pipeline::{PipelineState, PrepareOutcome, RagPipeline, RagPipelineBuilder, index_name_for};
pub use retrieval::EmbeddingIndex;
pub use vectorstore::VectorStore;
