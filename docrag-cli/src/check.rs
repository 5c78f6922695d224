//! `--check_llm`: one round trip to the configured model.

use std::time::Instant;

use docrag::LanguageModel;
use docrag::ollama::OllamaModel;
use tracing::warn;

const CHECK_PROMPT: &str = "Hello! Can you introduce yourself in one sentence?";

pub async fn run(model: &OllamaModel) -> anyhow::Result<()> {
    let name = model.config().model.clone();
    println!("{name} モデルの接続テスト中...");

    match model.list_models().await {
        Ok(models) if !models.iter().any(|m| m == &name) => {
            warn!(model = %name, available = ?models, "model not listed by server");
        }
        Ok(_) => {}
        Err(e) => warn!(error = %e, "could not list models"),
    }

    let started = Instant::now();
    match model.generate(CHECK_PROMPT).await {
        Ok(response) => {
            println!("\nLLMのテスト成功!");
            println!("応答時間: {:.2}秒", started.elapsed().as_secs_f64());
            println!("\n応答文:\n{response}");
            Ok(())
        }
        Err(e) => {
            println!("\nエラーが発生しました: {e}");
            println!("\n考えられる原因:");
            println!("1. Ollamaがインストールされていないか、実行されていない");
            println!("2. 指定されたモデルがダウンロードされていない");
            println!("3. ネットワーク接続に問題がある");
            println!("\n解決方法:");
            println!("1. Ollamaをインストールして実行: `ollama serve`");
            println!("2. モデルをダウンロード: `ollama pull {name}`");
            Err(e.into())
        }
    }
}
