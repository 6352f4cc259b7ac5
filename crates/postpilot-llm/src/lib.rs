//! Language-model gateway: a capability trait the pipeline depends on, plus
//! the production client for an OpenAI-compatible chat-completions API.

mod client;
mod error;
mod retry;
mod types;

pub use client::LlmClient;
pub use error::LlmError;
pub use types::SentimentAnalysis;

/// The language-model operations the rest of the system consumes.
///
/// Injected into the pipeline so orchestration logic can be tested against
/// a fake implementation; [`LlmClient`] is the production implementation.
#[allow(async_fn_in_trait)]
pub trait LanguageModel: Send + Sync {
    /// Generate free-form text for a prompt, optionally under a system
    /// prompt, optionally overriding the configured sampling temperature.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] on network failure, provider errors, or an
    /// empty completion.
    async fn generate_text(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        temperature: Option<f32>,
    ) -> Result<String, LlmError>;

    /// Score the sentiment of `text` in `[-1, 1]` with a label.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] on network failure, provider errors, or an
    /// unparseable answer.
    async fn analyze_sentiment(&self, text: &str) -> Result<SentimentAnalysis, LlmError>;

    /// Extract up to `max_topics` short topic strings from `text`.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] on network failure, provider errors, or an
    /// unparseable answer.
    async fn extract_topics(&self, text: &str, max_topics: usize) -> Result<Vec<String>, LlmError>;

    /// Generate up to `max_hashtags` hashtags (without the `#`) for content.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] on network failure, provider errors, or an
    /// unparseable answer.
    async fn generate_hashtags(
        &self,
        content: &str,
        max_hashtags: usize,
    ) -> Result<Vec<String>, LlmError>;

    /// Rewrite `text` for readability, preserving its message.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] on network failure, provider errors, or an
    /// empty completion.
    async fn improve_readability(&self, text: &str) -> Result<String, LlmError>;
}
