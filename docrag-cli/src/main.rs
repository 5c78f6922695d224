use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use docrag::ollama::{OllamaConfig, OllamaEmbeddingProvider, OllamaModel};
use docrag::{
    EmbeddingProvider, HashEmbeddingProvider, PrepareOutcome, RagConfig, RagPipeline,
};
use rustyline::DefaultEditor;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod check;
mod cli;
mod display;
mod select;
mod session;

use cli::{Cli, Embedder};

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "docrag=debug" } else { "docrag=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn ollama_config(cli: &Cli, model: &str) -> OllamaConfig {
    OllamaConfig::new(model)
        .with_base_url(cli.ollama_url.as_str())
        .with_timeout(Duration::from_secs(cli.timeout_secs))
}

async fn build_pipeline(cli: &Cli, model: OllamaModel) -> anyhow::Result<RagPipeline> {
    let config = RagConfig::builder()
        .chunk_size(cli.chunk_size)
        .chunk_overlap(cli.chunk_overlap)
        .chunking(cli.chunking.into())
        .top_k(cli.top_k)
        .models_dir(&cli.models_dir)
        .rebuild_index(cli.rebuild_index)
        .save_index(!cli.no_save_index)
        .build()?;

    let embedder: Arc<dyn EmbeddingProvider> = match cli.embedder {
        Embedder::Ollama => Arc::new(
            OllamaEmbeddingProvider::detect(ollama_config(cli, &cli.embed_model))
                .await
                .with_context(|| format!("embedding model {} is not available", cli.embed_model))?,
        ),
        Embedder::Hash => Arc::new(HashEmbeddingProvider::default()),
    };
    info!(embedder = embedder.name(), dimensions = embedder.dimensions(), "embedding provider ready");

    Ok(RagPipeline::builder()
        .config(config)
        .embedding_provider(embedder)
        .language_model(Arc::new(model))
        .build()?)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let model = OllamaModel::new(ollama_config(&cli, &cli.llm_model))?;
    if cli.check_llm {
        return check::run(&model).await;
    }

    let mut editor = DefaultEditor::new()?;
    let document = match &cli.document {
        Some(path) => path.clone(),
        None => match select::choose_document(&mut editor, &cli.data_dir)? {
            Some(path) => path,
            None => {
                println!("ドキュメントが選択されませんでした。処理を終了します。");
                return Ok(());
            }
        },
    };
    info!(document = %document.display(), llm_model = %cli.llm_model, "starting");

    let pipeline = build_pipeline(&cli, model).await?;
    let outcome = pipeline
        .prepare(&document)
        .await
        .with_context(|| format!("failed to prepare index for {}", document.display()))?;
    match outcome {
        PrepareOutcome::Built => println!("インデックスを構築しました。"),
        PrepareOutcome::Loaded => println!("保存済みのインデックスを読み込みました。"),
        PrepareOutcome::Rebuilt => println!("インデックスの読み込みに失敗したため再構築しました。"),
    }

    if cli.no_interactive {
        session::run_samples(&pipeline).await;
    } else {
        session::run_interactive(&pipeline, &mut editor).await?;
    }
    Ok(())
}
