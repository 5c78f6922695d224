//! Ollama backends: embeddings via `/api/embed` and completions via `/api/generate`.
//!
//! This module is only available when the `ollama` feature is enabled.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::LanguageModel;

/// The default Ollama server address.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// The default generation model.
pub const DEFAULT_LLM_MODEL: &str = "gemma:7b";

/// The default embedding model (multilingual, handles Japanese).
pub const DEFAULT_EMBED_MODEL: &str = "bge-m3";

/// Connection settings shared by the Ollama backends.
#[derive(Debug, Clone, PartialEq)]
pub struct OllamaConfig {
    /// Server address, without a trailing slash.
    pub base_url: String,
    /// Model name as known to the server.
    pub model: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Sampling temperature passed through `options`, if set.
    pub temperature: Option<f32>,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            timeout: Duration::from_secs(120),
            temperature: None,
        }
    }
}

impl OllamaConfig {
    /// Create a config for `model` on the default server.
    pub fn new(model: impl Into<String>) -> Self {
        Self { model: model.into(), ..Self::default() }
    }

    /// Create a config for `model`, taking the server from `OLLAMA_HOST` when set.
    pub fn from_env(model: impl Into<String>) -> Self {
        let config = Self::new(model);
        match std::env::var("OLLAMA_HOST") {
            Ok(host) if !host.trim().is_empty() => config.with_base_url(host),
            _ => config,
        }
    }

    /// Set the server address. A missing scheme defaults to `http://`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let base_url = base_url.trim().trim_end_matches('/');
        self.base_url = if base_url.contains("://") {
            base_url.to_string()
        } else {
            format!("http://{base_url}")
        };
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{path}", self.base_url)
    }

    fn client(&self) -> std::result::Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder().timeout(self.timeout).build()
    }
}

// ── Ollama API request/response types ──────────────────────────────

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerateOptions>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    models: Vec<TagEntry>,
}

#[derive(Deserialize)]
struct TagEntry {
    name: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Extract Ollama's `{"error": "..."}` message from a failed response body.
fn error_detail(body: String) -> String {
    serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error).unwrap_or(body)
}

// ── Embeddings ─────────────────────────────────────────────────────

/// An [`EmbeddingProvider`] backed by an Ollama embedding model.
///
/// # Example
///
/// ```rust,ignore
/// use docrag::ollama::{OllamaConfig, OllamaEmbeddingProvider};
///
/// let provider = OllamaEmbeddingProvider::new(OllamaConfig::new("bge-m3"), 1024)?;
/// let embedding = provider.embed("こんにちは").await?;
/// ```
pub struct OllamaEmbeddingProvider {
    client: reqwest::Client,
    config: OllamaConfig,
    dimensions: usize,
}

impl OllamaEmbeddingProvider {
    /// Create a provider for a model whose output size is `dimensions`.
    pub fn new(config: OllamaConfig, dimensions: usize) -> Result<Self> {
        let client = config.client().map_err(|e| RagError::Embedding {
            provider: "Ollama".into(),
            message: format!("failed to build HTTP client: {e}"),
        })?;
        Ok(Self { client, config, dimensions })
    }

    /// Create a provider, asking the server for the model's output size.
    pub async fn detect(config: OllamaConfig) -> Result<Self> {
        let mut provider = Self::new(config, 0)?;
        let probe = provider.request(&["dimension probe"]).await?;
        provider.dimensions = probe.first().map(Vec::len).ok_or_else(|| RagError::Embedding {
            provider: "Ollama".into(),
            message: "API returned no embeddings for probe".into(),
        })?;
        debug!(model = %provider.config.model, dimensions = provider.dimensions, "detected embedding size");
        Ok(provider)
    }

    async fn request(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let request_body = EmbedRequest { model: &self.config.model, input: texts.to_vec() };

        let response = self
            .client
            .post(self.config.endpoint("embed"))
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "Ollama", error = %e, "request failed");
                RagError::Embedding {
                    provider: "Ollama".into(),
                    message: format!("request failed: {e}"),
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = error_detail(response.text().await.unwrap_or_default());
            error!(provider = "Ollama", %status, "API error");
            return Err(RagError::Embedding {
                provider: "Ollama".into(),
                message: format!("API returned {status}: {detail}"),
            });
        }

        let embed_response: EmbedResponse = response.json().await.map_err(|e| {
            error!(provider = "Ollama", error = %e, "failed to parse response");
            RagError::Embedding {
                provider: "Ollama".into(),
                message: format!("failed to parse response: {e}"),
            }
        })?;

        Ok(embed_response.embeddings)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = "Ollama", text_len = text.len(), "embedding single text");

        let results = self.embed_batch(&[text]).await?;
        results.into_iter().next().ok_or_else(|| RagError::Embedding {
            provider: "Ollama".into(),
            message: "API returned empty response".into(),
        })
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            provider = "Ollama",
            batch_size = texts.len(),
            model = %self.config.model,
            "embedding batch"
        );
        self.request(texts).await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        &self.config.model
    }
}

// ── Generation ─────────────────────────────────────────────────────

/// A [`LanguageModel`] served by Ollama.
///
/// Sends one non-streaming `/api/generate` request per prompt and returns the
/// `response` field untouched.
pub struct OllamaModel {
    client: reqwest::Client,
    config: OllamaConfig,
}

impl OllamaModel {
    /// Create a model client.
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = config.client().map_err(|e| RagError::GenerationFailed {
            provider: "Ollama".into(),
            message: format!("failed to build HTTP client: {e}"),
        })?;
        Ok(Self { client, config })
    }

    /// Return the connection settings.
    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    /// List the models installed on the server.
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let failed = |message: String| RagError::GenerationFailed {
            provider: "Ollama".into(),
            message,
        };
        let response = self
            .client
            .get(self.config.endpoint("tags"))
            .send()
            .await
            .map_err(|e| failed(format!("request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(failed(format!("API returned {}", response.status())));
        }
        let tags: TagsResponse =
            response.json().await.map_err(|e| failed(format!("failed to parse response: {e}")))?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

#[async_trait]
impl LanguageModel for OllamaModel {
    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!(provider = "Ollama", model = %self.config.model, prompt_len = prompt.len(), "generating");

        let request_body = GenerateRequest {
            model: &self.config.model,
            prompt,
            stream: false,
            options: self.config.temperature.map(|temperature| GenerateOptions { temperature }),
        };

        let response = self
            .client
            .post(self.config.endpoint("generate"))
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                let kind = if e.is_timeout() { "timed out" } else { "request failed" };
                error!(provider = "Ollama", error = %e, kind, "generation request failed");
                RagError::GenerationFailed {
                    provider: "Ollama".into(),
                    message: format!("{kind}: {e}"),
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = error_detail(response.text().await.unwrap_or_default());
            error!(provider = "Ollama", %status, "API error");
            return Err(RagError::GenerationFailed {
                provider: "Ollama".into(),
                message: format!("API returned {status}: {detail}"),
            });
        }

        let generate_response: GenerateResponse = response.json().await.map_err(|e| {
            error!(provider = "Ollama", error = %e, "failed to parse response");
            RagError::GenerationFailed {
                provider: "Ollama".into(),
                message: format!("failed to parse response: {e}"),
            }
        })?;

        Ok(generate_response.response)
    }

    fn name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalised() {
        let config = OllamaConfig::new("gemma:7b").with_base_url("127.0.0.1:11434/");
        assert_eq!(config.base_url, "http://127.0.0.1:11434");
        assert_eq!(config.endpoint("generate"), "http://127.0.0.1:11434/api/generate");

        let config = OllamaConfig::new("gemma:7b").with_base_url("https://llm.internal");
        assert_eq!(config.endpoint("embed"), "https://llm.internal/api/embed");
    }

    #[test]
    fn generate_request_shape() {
        let body = GenerateRequest {
            model: "gemma:7b",
            prompt: "質問",
            stream: false,
            options: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({"model": "gemma:7b", "prompt": "質問", "stream": false}));

        let body = GenerateRequest {
            options: Some(GenerateOptions { temperature: 0.5 }),
            ..body
        };
        assert_eq!(serde_json::to_value(&body).unwrap()["options"]["temperature"], 0.5);
    }

    #[test]
    fn embed_response_parses() {
        let parsed: EmbedResponse =
            serde_json::from_str(r#"{"model":"bge-m3","embeddings":[[0.1,0.2],[0.3,0.4]]}"#)
                .unwrap();
        assert_eq!(parsed.embeddings.len(), 2);
        assert_eq!(parsed.embeddings[1], vec![0.3, 0.4]);
    }

    #[test]
    fn error_body_is_unwrapped() {
        assert_eq!(error_detail(r#"{"error":"model 'x' not found"}"#.into()), "model 'x' not found");
        assert_eq!(error_detail("plain text".into()), "plain text");
    }

    #[tokio::test]
    async fn unreachable_server_is_a_generation_failure() {
        // Port 9 (discard) on localhost is not an Ollama server.
        let config = OllamaConfig::new("gemma:7b")
            .with_base_url("http://127.0.0.1:9")
            .with_timeout(Duration::from_millis(500));
        let model = OllamaModel::new(config).unwrap();
        let err = model.generate("hello").await.unwrap_err();
        assert!(matches!(err, RagError::GenerationFailed { .. }));
    }
}
