//! RAG pipeline orchestrator.
//!
//! The [`RagPipeline`] coordinates the full prepare-and-ask workflow by
//! composing a [`DocumentLoader`], an [`EmbeddingIndex`] (embedding provider +
//! vector store), and an [`AnswerGenerator`] (language model + prompt).
//!
//! # Example
//!
//! ```rust,ignore
//! use docrag::{HashEmbeddingProvider, RagConfig, RagPipeline};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(HashEmbeddingProvider::default()))
//!     .language_model(Arc::new(my_model))
//!     .build()?;
//!
//! pipeline.prepare("data/manual.pdf").await?;
//! let answer = pipeline.ask("この文書の主なトピックは何ですか？").await?;
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::config::RagConfig;
use crate::document::Answer;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::{AnswerGenerator, LanguageModel, PromptTemplate};
use crate::inmemory::InMemoryVectorStore;
use crate::loader::DocumentLoader;
use crate::retrieval::EmbeddingIndex;
use crate::vectorstore::VectorStore;

/// Whether the pipeline can answer questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// No index has been built or loaded (or it was reset).
    Uninitialized,
    /// An index is in place; questions are accepted.
    Ready,
}

/// How [`RagPipeline::prepare`] obtained its index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrepareOutcome {
    /// Built from the document (forced, or nothing persisted).
    Built,
    /// Loaded from the persisted index.
    Loaded,
    /// Loading failed and the index was rebuilt from the document.
    Rebuilt,
}

/// Base file name of `doc_path` without its extension.
pub fn index_name_for(doc_path: &Path) -> String {
    doc_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "index".to_string())
}

/// The RAG pipeline orchestrator.
///
/// Starts [`Uninitialized`](PipelineState::Uninitialized); becomes
/// [`Ready`](PipelineState::Ready) after a successful build or load, and
/// returns to `Uninitialized` on [`reset`](RagPipeline::reset). Construct one via
/// [`RagPipeline::builder()`].
pub struct RagPipeline {
    config: RagConfig,
    loader: DocumentLoader,
    index: EmbeddingIndex,
    generator: AnswerGenerator,
    state: RwLock<PipelineState>,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the embedding index.
    pub fn index(&self) -> &EmbeddingIndex {
        &self.index
    }

    /// Return a reference to the answer generator.
    pub fn generator(&self) -> &AnswerGenerator {
        &self.generator
    }

    /// Current state.
    pub async fn state(&self) -> PipelineState {
        *self.state.read().await
    }

    /// Directory holding the persisted index for `doc_path`:
    /// `<models_dir>/<base name>_<index_suffix>`.
    ///
    /// Only the base name is used, so documents with the same base name in
    /// different directories share an index directory.
    pub fn index_dir_for(&self, doc_path: &Path) -> PathBuf {
        self.config
            .models_dir
            .join(format!("{}_{}", index_name_for(doc_path), self.config.index_suffix))
    }

    /// Load, chunk, and embed `doc_path`, then persist the index if configured.
    ///
    /// Returns the number of indexed chunks.
    pub async fn build_index(&self, doc_path: impl AsRef<Path>) -> Result<usize> {
        let doc_path = doc_path.as_ref();
        let started = Instant::now();
        *self.state.write().await = PipelineState::Uninitialized;

        let chunks = self.loader.load(doc_path)?;
        let chunk_count = chunks.len();
        self.index.embed_and_index(chunks).await?;

        if self.config.save_index {
            let dir = self.index_dir_for(doc_path);
            self.index.save(&dir, &index_name_for(doc_path)).await?;
        }

        *self.state.write().await = PipelineState::Ready;
        info!(
            document = %doc_path.display(),
            chunk_count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "index built"
        );
        Ok(chunk_count)
    }

    /// Restore the persisted index for `doc_path`.
    pub async fn load_index(&self, doc_path: impl AsRef<Path>) -> Result<()> {
        let doc_path = doc_path.as_ref();
        let started = Instant::now();
        *self.state.write().await = PipelineState::Uninitialized;

        let dir = self.index_dir_for(doc_path);
        self.index.load(&dir, &index_name_for(doc_path)).await?;

        *self.state.write().await = PipelineState::Ready;
        info!(
            index = %dir.display(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "index loaded"
        );
        Ok(())
    }

    /// Build or load the index for `doc_path`.
    ///
    /// Builds when `rebuild_index` is set or nothing is persisted at
    /// [`index_dir_for`](Self::index_dir_for); otherwise loads, and if loading
    /// fails, logs a warning and builds once.
    pub async fn prepare(&self, doc_path: impl AsRef<Path>) -> Result<PrepareOutcome> {
        let doc_path = doc_path.as_ref();
        let dir = self.index_dir_for(doc_path);

        if self.config.rebuild_index || !dir.exists() {
            info!(document = %doc_path.display(), rebuild = self.config.rebuild_index, "building index");
            self.build_index(doc_path).await?;
            return Ok(PrepareOutcome::Built);
        }

        match self.load_index(doc_path).await {
            Ok(()) => Ok(PrepareOutcome::Loaded),
            Err(e) => {
                warn!(index = %dir.display(), error = %e, "failed to load index, rebuilding");
                self.build_index(doc_path).await?;
                Ok(PrepareOutcome::Rebuilt)
            }
        }
    }

    /// Answer `question` from the top-k retrieved chunks.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PipelineNotReady`] before a successful
    /// [`prepare`](Self::prepare), [`build_index`](Self::build_index), or
    /// [`load_index`](Self::load_index). Retrieval and generation errors are
    /// returned unchanged; nothing is retried.
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        if *self.state.read().await != PipelineState::Ready {
            return Err(RagError::PipelineNotReady);
        }

        let started = Instant::now();
        let sources = self.index.search(question, self.config.top_k).await?;
        let answer = self.generator.answer(question, sources).await?;
        info!(
            source_count = answer.sources.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "question answered"
        );
        Ok(answer)
    }

    /// Alias of [`ask`](Self::ask).
    pub async fn answer_question(&self, question: &str) -> Result<Answer> {
        self.ask(question).await
    }

    /// Drop the index and return to [`PipelineState::Uninitialized`].
    pub async fn reset(&self) {
        self.index.reset().await;
        *self.state.write().await = PipelineState::Uninitialized;
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// `embedding_provider` and `language_model` are required. The config
/// defaults to [`RagConfig::default()`], the vector store to an
/// [`InMemoryVectorStore`] using the config's metric, the loader to one
/// derived from the config, and the prompt to the config's template.
///
/// # Example
///
/// ```rust,ignore
/// let pipeline = RagPipeline::builder()
///     .config(config)
///     .embedding_provider(Arc::new(embedder))
///     .language_model(Arc::new(model))
///     .vector_store(Arc::new(store))  // optional
///     .build()?;
/// ```
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    language_model: Option<Arc<dyn LanguageModel>>,
    loader: Option<DocumentLoader>,
    prompt_template: Option<PromptTemplate>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Set the language model.
    pub fn language_model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.language_model = Some(model);
        self
    }

    /// Set the document loader.
    pub fn loader(mut self, loader: DocumentLoader) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Set the prompt template, overriding the config's.
    pub fn prompt_template(mut self, template: PromptTemplate) -> Self {
        self.prompt_template = Some(template);
        self
    }

    /// Build the [`RagPipeline`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if a required field is missing or the
    /// config fails [`RagConfig::validate`].
    pub fn build(self) -> Result<RagPipeline> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::Config("embedding_provider is required".to_string()))?;
        let language_model = self
            .language_model
            .ok_or_else(|| RagError::Config("language_model is required".to_string()))?;
        let vector_store = self
            .vector_store
            .unwrap_or_else(|| Arc::new(InMemoryVectorStore::new(config.metric)));
        let loader = match self.loader {
            Some(loader) => loader,
            None => DocumentLoader::from_config(&config)?,
        };
        let template = match self.prompt_template {
            Some(template) => template,
            None => PromptTemplate::new(config.prompt_template.clone())?,
        };

        Ok(RagPipeline {
            loader,
            index: EmbeddingIndex::new(embedding_provider, vector_store),
            generator: AnswerGenerator::new(language_model, template),
            state: RwLock::new(PipelineState::Uninitialized),
            config,
        })
    }
}
