//! Prompt construction and answer generation.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{error, info};

use crate::context::format_context;
use crate::document::{Answer, SearchResult};
use crate::error::{RagError, Result};

/// Default template: answer in Japanese from the supplied context only.
pub const JAPANESE_PROMPT_TEMPLATE: &str = "あなたは日本語で回答するアシスタントです。
以下のコンテキスト情報を参照して、質問に日本語で答えてください。

コンテキスト情報:
---------------------
{context}
---------------------

重要な指示:
1. 必ず日本語で回答してください
2. コンテキスト情報に基づいて回答してください
3. 情報がない場合は「提供された情報からは回答できません」と日本語で答えてください
4. 英語で回答することは絶対に避けてください

質問: {question}
回答（日本語）: ";

const CONTEXT_PLACEHOLDER: &str = "{context}";
const QUESTION_PLACEHOLDER: &str = "{question}";

/// A prompt with `{context}` and `{question}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// Create a template, checking that both placeholders are present.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] naming the first missing placeholder.
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        for placeholder in [CONTEXT_PLACEHOLDER, QUESTION_PLACEHOLDER] {
            if !template.contains(placeholder) {
                return Err(RagError::Config(format!(
                    "prompt template must contain {placeholder}"
                )));
            }
        }
        Ok(Self { template })
    }

    /// The built-in Japanese template.
    pub fn japanese() -> Self {
        Self { template: JAPANESE_PROMPT_TEMPLATE.to_string() }
    }

    /// The raw template text.
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Substitute both placeholders in one pass.
    ///
    /// Placeholder text that appears inside `context` or `question` is left as is.
    pub fn render(&self, context: &str, question: &str) -> String {
        let mut out = String::with_capacity(self.template.len() + context.len() + question.len());
        let mut rest = self.template.as_str();

        loop {
            let next = [(CONTEXT_PLACEHOLDER, context), (QUESTION_PLACEHOLDER, question)]
                .into_iter()
                .filter_map(|(placeholder, value)| {
                    rest.find(placeholder).map(|pos| (pos, placeholder, value))
                })
                .min_by_key(|(pos, _, _)| *pos);

            match next {
                Some((pos, placeholder, value)) => {
                    out.push_str(&rest[..pos]);
                    out.push_str(value);
                    rest = &rest[pos + placeholder.len()..];
                }
                None => {
                    out.push_str(rest);
                    return out;
                }
            }
        }
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::japanese()
    }
}

/// A text-in, text-out language model.
///
/// Implementations return the model's response verbatim. They do not retry;
/// any transport or backend failure is reported as
/// [`RagError::GenerationFailed`].
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate a completion for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// The model identifier, for logs.
    fn name(&self) -> &str;
}

/// Turns retrieved chunks and a question into an [`Answer`].
#[derive(Clone)]
pub struct AnswerGenerator {
    model: Arc<dyn LanguageModel>,
    template: PromptTemplate,
}

impl AnswerGenerator {
    /// Create a generator that prompts `model` through `template`.
    pub fn new(model: Arc<dyn LanguageModel>, template: PromptTemplate) -> Self {
        Self { model, template }
    }

    /// Return a reference to the language model.
    pub fn model(&self) -> &Arc<dyn LanguageModel> {
        &self.model
    }

    /// Return the prompt template.
    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    /// Format `sources` as context, prompt the model once, and package the result.
    pub async fn answer(&self, question: &str, sources: Vec<SearchResult>) -> Result<Answer> {
        let context = format_context(&sources);
        let prompt = self.template.render(&context, question);

        let started = Instant::now();
        let text = self.model.generate(&prompt).await.map_err(|e| {
            error!(model = self.model.name(), error = %e, "generation failed");
            e
        })?;
        info!(
            model = self.model.name(),
            source_count = sources.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "generated answer"
        );

        Ok(Answer { text, sources, context })
    }
}
