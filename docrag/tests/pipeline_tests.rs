//! End-to-end pipeline behaviour with offline embeddings and a scripted model.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use docrag::inmemory::{documents_file, index_file};
use docrag::{
    DistanceMetric, EmbeddingProvider, HashEmbeddingProvider, LanguageModel, PipelineState, PrepareOutcome,
    RagConfig, RagError, RagPipeline, VectorStore, index_name_for,
};

/// Records every prompt and answers with a fixed reply, or fails on demand.
#[derive(Default)]
struct ScriptedModel {
    prompts: Mutex<Vec<String>>,
    fail: bool,
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn generate(&self, prompt: &str) -> docrag::Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if self.fail {
            return Err(RagError::GenerationFailed {
                provider: "scripted".into(),
                message: "connection refused".into(),
            });
        }
        Ok("提供された情報によると、答えは42です。".to_string())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Counts embedding calls so tests can tell a build from a load.
struct CountingEmbedder {
    inner: HashEmbeddingProvider,
    batches: AtomicUsize,
}

#[async_trait]
impl EmbeddingProvider for CountingEmbedder {
    async fn embed(&self, text: &str) -> docrag::Result<Vec<f32>> {
        self.inner.embed(text).await
    }

    async fn embed_batch(&self, texts: &[&str]) -> docrag::Result<Vec<Vec<f32>>> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        self.inner.embed_batch(texts).await
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn name(&self) -> &str {
        "counting"
    }
}

struct Fixture {
    _temp: tempfile::TempDir,
    doc: PathBuf,
    models_dir: PathBuf,
}

fn fixture(text: &str) -> Fixture {
    let temp = tempfile::tempdir().unwrap();
    let doc = temp.path().join("data").join("guide.txt");
    std::fs::create_dir_all(doc.parent().unwrap()).unwrap();
    std::fs::write(&doc, text).unwrap();
    let models_dir = temp.path().join("models");
    Fixture { _temp: temp, doc, models_dir }
}

fn config(models_dir: &Path) -> RagConfig {
    RagConfig::builder()
        .chunk_size(40)
        .chunk_overlap(10)
        .top_k(2)
        .models_dir(models_dir)
        .build()
        .unwrap()
}

fn pipeline_with(
    config: RagConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    model: Arc<ScriptedModel>,
) -> RagPipeline {
    RagPipeline::builder()
        .config(config)
        .embedding_provider(embedder)
        .language_model(model)
        .build()
        .unwrap()
}

fn counting() -> Arc<CountingEmbedder> {
    Arc::new(CountingEmbedder { inner: HashEmbeddingProvider::new(64), batches: AtomicUsize::new(0) })
}

const GUIDE: &str = "富士山は日本で一番高い山です。標高は3776メートルです。\
琵琶湖は日本で一番大きい湖です。滋賀県にあります。\
信濃川は日本で一番長い川です。新潟県を流れています。";

#[tokio::test]
async fn asking_before_prepare_is_rejected() {
    let f = fixture(GUIDE);
    let model = Arc::new(ScriptedModel::default());
    let pipeline = pipeline_with(config(&f.models_dir), counting(), model.clone());

    assert_eq!(pipeline.state().await, PipelineState::Uninitialized);
    let err = pipeline.ask("富士山の標高は？").await.unwrap_err();
    assert!(matches!(err, RagError::PipelineNotReady));
    assert!(model.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn prepare_builds_then_loads() {
    let f = fixture(GUIDE);
    let embedder = counting();
    let model = Arc::new(ScriptedModel::default());

    let first = pipeline_with(config(&f.models_dir), embedder.clone(), model.clone());
    assert_eq!(first.prepare(&f.doc).await.unwrap(), PrepareOutcome::Built);
    assert_eq!(embedder.batches.load(Ordering::SeqCst), 1);

    let dir = f.models_dir.join("guide_index");
    assert_eq!(first.index_dir_for(&f.doc), dir);
    assert!(index_file(&dir, "guide").exists());
    assert!(documents_file(&dir, "guide").exists());

    let second = pipeline_with(config(&f.models_dir), embedder.clone(), model);
    assert_eq!(second.prepare(&f.doc).await.unwrap(), PrepareOutcome::Loaded);
    assert_eq!(embedder.batches.load(Ordering::SeqCst), 1, "load must not re-embed");
    assert_eq!(second.state().await, PipelineState::Ready);

    let a = first.ask("日本で一番高い山").await.unwrap();
    let b = second.ask("日本で一番高い山").await.unwrap();
    assert_eq!(a.sources, b.sources);
}

#[tokio::test]
async fn rebuild_flag_forces_build() {
    let f = fixture(GUIDE);
    let embedder = counting();
    let model = Arc::new(ScriptedModel::default());

    pipeline_with(config(&f.models_dir), embedder.clone(), model.clone())
        .prepare(&f.doc)
        .await
        .unwrap();

    let mut rebuild = config(&f.models_dir);
    rebuild.rebuild_index = true;
    let pipeline = pipeline_with(rebuild, embedder.clone(), model);
    assert_eq!(pipeline.prepare(&f.doc).await.unwrap(), PrepareOutcome::Built);
    assert_eq!(embedder.batches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn corrupt_index_falls_back_to_rebuild() {
    let f = fixture(GUIDE);
    let model = Arc::new(ScriptedModel::default());
    let pipeline = pipeline_with(config(&f.models_dir), counting(), model);
    pipeline.prepare(&f.doc).await.unwrap();

    let dir = pipeline.index_dir_for(&f.doc);
    std::fs::write(index_file(&dir, "guide"), "{ truncated").unwrap();

    let fresh = pipeline_with(config(&f.models_dir), counting(), Arc::new(ScriptedModel::default()));
    assert_eq!(fresh.prepare(&f.doc).await.unwrap(), PrepareOutcome::Rebuilt);
    assert_eq!(fresh.state().await, PipelineState::Ready);
    assert!(fresh.ask("琵琶湖").await.is_ok());
}

#[tokio::test]
async fn missing_document_fails_prepare() {
    let f = fixture(GUIDE);
    let pipeline =
        pipeline_with(config(&f.models_dir), counting(), Arc::new(ScriptedModel::default()));
    let err = pipeline.prepare(f.doc.with_file_name("missing.txt")).await.unwrap_err();
    assert!(matches!(err, RagError::NotFound { .. }));
    assert_eq!(pipeline.state().await, PipelineState::Uninitialized);
}

#[tokio::test]
async fn ask_returns_model_text_sources_and_context() {
    let f = fixture(GUIDE);
    let model = Arc::new(ScriptedModel::default());
    let pipeline = pipeline_with(config(&f.models_dir), counting(), model.clone());
    pipeline.prepare(&f.doc).await.unwrap();

    let answer = pipeline.ask("日本で一番長い川は？").await.unwrap();
    assert_eq!(answer.text, "提供された情報によると、答えは42です。");
    assert_eq!(answer.sources.len(), 2);
    assert!(answer.sources[0].distance <= answer.sources[1].distance);
    assert!(answer.context.starts_with("[ドキュメント 1] (ソース: "));
    assert!(answer.context.contains("[ドキュメント 2]"));

    let prompts = model.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains(&answer.context));
    assert!(prompts[0].contains("質問: 日本で一番長い川は？"));
    assert!(prompts[0].contains("必ず日本語で回答してください"));
}

#[tokio::test]
async fn single_sentence_document_gives_one_source() {
    let f = fixture("猫は小さな動物です。");
    let pipeline =
        pipeline_with(config(&f.models_dir), counting(), Arc::new(ScriptedModel::default()));
    pipeline.prepare(&f.doc).await.unwrap();

    let answer = pipeline.ask("猫とは？").await.unwrap();
    assert_eq!(answer.sources.len(), 1);
    assert_eq!(answer.sources[0].chunk.id, 0);
    assert_eq!(answer.sources[0].chunk.content, "猫は小さな動物です。");
}

#[tokio::test]
async fn generation_failure_propagates_without_retry() {
    let f = fixture(GUIDE);
    let model = Arc::new(ScriptedModel { fail: true, ..Default::default() });
    let pipeline = pipeline_with(config(&f.models_dir), counting(), model.clone());
    pipeline.prepare(&f.doc).await.unwrap();

    let err = pipeline.ask("富士山").await.unwrap_err();
    assert!(matches!(err, RagError::GenerationFailed { .. }));
    assert_eq!(model.prompts.lock().unwrap().len(), 1);
    assert_eq!(pipeline.state().await, PipelineState::Ready);
}

#[tokio::test]
async fn reset_returns_to_uninitialized() {
    let f = fixture(GUIDE);
    let pipeline =
        pipeline_with(config(&f.models_dir), counting(), Arc::new(ScriptedModel::default()));
    pipeline.prepare(&f.doc).await.unwrap();
    pipeline.reset().await;

    assert_eq!(pipeline.state().await, PipelineState::Uninitialized);
    assert!(matches!(pipeline.ask("富士山").await, Err(RagError::PipelineNotReady)));
    assert!(matches!(
        pipeline.index().search("富士山", 1).await,
        Err(RagError::IndexNotBuilt)
    ));
}

#[tokio::test]
async fn rebuilding_twice_is_structurally_equivalent() {
    let f = fixture(GUIDE);
    let pipeline =
        pipeline_with(config(&f.models_dir), counting(), Arc::new(ScriptedModel::default()));

    let first = pipeline.build_index(&f.doc).await.unwrap();
    let first_dims = pipeline.index().vector_store().dimensions().await;
    let second = pipeline.build_index(&f.doc).await.unwrap();
    let second_dims = pipeline.index().vector_store().dimensions().await;

    assert_eq!(first, second);
    assert_eq!(first_dims, second_dims);
    assert_eq!(pipeline.index().vector_store().len().await, second);
}

#[tokio::test]
async fn same_base_name_shares_index_directory() {
    let f = fixture(GUIDE);
    let pipeline =
        pipeline_with(config(&f.models_dir), counting(), Arc::new(ScriptedModel::default()));
    let a = pipeline.index_dir_for(Path::new("a/report.txt"));
    let b = pipeline.index_dir_for(Path::new("b/report.pdf"));
    assert_eq!(a, b);
    assert_eq!(index_name_for(Path::new("b/report.pdf")), "report");
}

#[tokio::test]
async fn unsaved_build_leaves_no_files() {
    let f = fixture(GUIDE);
    let mut cfg = config(&f.models_dir);
    cfg.save_index = false;
    let pipeline = pipeline_with(cfg, counting(), Arc::new(ScriptedModel::default()));
    assert_eq!(pipeline.prepare(&f.doc).await.unwrap(), PrepareOutcome::Built);
    assert!(!f.models_dir.exists());
    assert!(pipeline.ask("湖").await.is_ok());
}

#[test]
fn builder_requires_backends() {
    let err = RagPipeline::builder()
        .embedding_provider(Arc::new(HashEmbeddingProvider::default()))
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, RagError::Config(msg) if msg.contains("language_model")));
}

#[test]
fn builder_revalidates_edited_config() {
    let mut config = RagConfig::default();
    config.chunk_overlap = config.chunk_size;
    let err = RagPipeline::builder()
        .config(config)
        .embedding_provider(Arc::new(HashEmbeddingProvider::default()))
        .language_model(Arc::new(ScriptedModel::default()))
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, RagError::Config(msg) if msg.contains("chunk_overlap")));
}

#[tokio::test]
async fn index_saved_with_other_metric_is_rebuilt() {
    let f = fixture(GUIDE);
    let embedder = counting();
    pipeline_with(config(&f.models_dir), embedder.clone(), Arc::new(ScriptedModel::default()))
        .prepare(&f.doc)
        .await
        .unwrap();

    let mut cosine = config(&f.models_dir);
    cosine.metric = DistanceMetric::Cosine;
    let pipeline = pipeline_with(cosine, embedder.clone(), Arc::new(ScriptedModel::default()));
    assert_eq!(pipeline.prepare(&f.doc).await.unwrap(), PrepareOutcome::Rebuilt);
    assert_eq!(embedder.batches.load(Ordering::SeqCst), 2);

    let answer = pipeline.ask("富士山").await.unwrap();
    assert!(answer.sources.iter().all(|s| (-1e-5..=2.0).contains(&s.distance)));
}
