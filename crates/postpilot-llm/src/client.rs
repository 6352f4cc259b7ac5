//! HTTP client for an OpenAI-compatible chat-completions API.
//!
//! Wraps `reqwest` with provider-specific error handling, an explicit
//! request timeout, and typed response deserialization. Structured answers
//! (sentiment, topics, hashtags) are requested as JSON and parsed here, so
//! callers never see raw completions for those operations.

use std::time::Duration;

use postpilot_core::LlmConfig;
use reqwest::{Client, Url};

use crate::error::LlmError;
use crate::retry::retry_with_backoff;
use crate::types::{ChatMessage, ChatRequest, ChatResponse, SentimentAnalysis};
use crate::LanguageModel;

const SENTIMENT_SYSTEM_PROMPT: &str = "You are a sentiment analysis expert. Analyze the \
sentiment of the given text and provide a sentiment score between -1 (very negative) and 1 \
(very positive), a sentiment label (positive, negative, or neutral), and a brief explanation.\n\
Respond with JSON only, in this shape:\n\
{\"sentiment_score\": 0.0, \"sentiment_label\": \"neutral\", \"explanation\": \"...\"}";

const TOPICS_SYSTEM_PROMPT: &str = "You are a topic extraction expert. Extract the main topics \
from the given text as a JSON array of short strings. Focus on technology, business, and \
professional topics. Respond with the JSON array only, for example: \
[\"artificial intelligence\", \"startup funding\", \"remote work\"]";

const HASHTAGS_SYSTEM_PROMPT: &str = "You are a social hashtag expert. Generate relevant \
hashtags for the given content as a JSON array of strings without the # symbol. Focus on \
professional, technology, and business hashtags. Respond with the JSON array only, for \
example: [\"tech\", \"innovation\", \"startup\"]";

const READABILITY_SYSTEM_PROMPT: &str = "You are a professional social-media content editor. \
Improve the readability and engagement of the given post while keeping its core message: \
shorter sentences, shorter paragraphs, line breaks for scanning, same tone and key points. \
Respond with the rewritten post only.";

/// Client for an OpenAI-compatible chat-completions API.
///
/// Use [`LlmClient::new`] for production or [`LlmClient::with_base_url`] to
/// point at a mock server in tests.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    config: LlmConfig,
    base_url: Url,
}

impl LlmClient {
    /// Creates a new client pointed at the configured provider.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed, or [`LlmError::Api`] for a malformed base URL.
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let base_url = config.base_url.clone();
        Self::with_base_url(config, &base_url)
    }

    /// Creates a new client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed, or [`LlmError::Api`] if `base_url` is not a valid URL.
    pub fn with_base_url(config: &LlmConfig, base_url: &str) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("postpilot/0.1 (content-automation)")
            .build()?;

        // Normalise: exactly one trailing slash so join() appends instead of
        // replacing the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| LlmError::Api {
            status: 0,
            message: format!("invalid base URL '{base_url}': {e}"),
        })?;

        Ok(Self {
            client,
            config: config.clone(),
            base_url,
        })
    }

    /// One chat-completion round trip, with retry on transient failures.
    async fn chat(
        &self,
        system_prompt: Option<&str>,
        prompt: &str,
        temperature: f32,
    ) -> Result<String, LlmError> {
        retry_with_backoff(
            self.config.max_retries,
            self.config.retry_backoff_base_ms,
            || self.chat_once(system_prompt, prompt, temperature),
        )
        .await
    }

    async fn chat_once(
        &self,
        system_prompt: Option<&str>,
        prompt: &str,
        temperature: f32,
    ) -> Result<String, LlmError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system_prompt {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let request = ChatRequest {
            model: &self.config.model,
            messages,
            max_tokens: self.config.max_tokens,
            temperature,
        };

        let url = self
            .base_url
            .join("chat/completions")
            .map_err(|e| LlmError::Api {
                status: 0,
                message: format!("invalid completions URL: {e}"),
            })?;

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = {
            let raw = response.text().await?;
            serde_json::from_str(&raw).map_err(|e| LlmError::Deserialize {
                context: "chat/completions".to_string(),
                source: e,
            })?
        };

        if let Some(usage) = &body.usage {
            tracing::debug!(tokens = ?usage.total_tokens, "chat completion finished");
        }

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(LlmError::EmptyCompletion)
    }
}

/// Strip a Markdown code fence if the model wrapped its JSON answer in one.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

fn parse_json_answer<T: serde::de::DeserializeOwned>(
    raw: &str,
    context: &str,
) -> Result<T, LlmError> {
    serde_json::from_str(strip_code_fences(raw)).map_err(|e| LlmError::Deserialize {
        context: context.to_string(),
        source: e,
    })
}

impl LanguageModel for LlmClient {
    async fn generate_text(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        temperature: Option<f32>,
    ) -> Result<String, LlmError> {
        tracing::info!(prompt_length = prompt.len(), "generating text");
        let text = self
            .chat(
                system_prompt,
                prompt,
                temperature.unwrap_or(self.config.temperature),
            )
            .await?;
        tracing::info!(response_length = text.len(), "text generated");
        Ok(text)
    }

    async fn analyze_sentiment(&self, text: &str) -> Result<SentimentAnalysis, LlmError> {
        let prompt = format!("Analyze the sentiment of this text: {text}");
        let raw = self.chat(Some(SENTIMENT_SYSTEM_PROMPT), &prompt, 0.1).await?;
        let mut analysis: SentimentAnalysis = parse_json_answer(&raw, "analyze_sentiment")?;

        analysis.sentiment_score = analysis.sentiment_score.clamp(-1.0, 1.0);
        if !matches!(
            analysis.sentiment_label.as_str(),
            "positive" | "negative" | "neutral"
        ) {
            analysis.sentiment_label = label_for_score(analysis.sentiment_score).to_string();
        }

        Ok(analysis)
    }

    async fn extract_topics(&self, text: &str, max_topics: usize) -> Result<Vec<String>, LlmError> {
        let prompt = format!("Extract the main topics from this text: {text}");
        let raw = self.chat(Some(TOPICS_SYSTEM_PROMPT), &prompt, 0.1).await?;
        let topics: Vec<String> = parse_json_answer(&raw, "extract_topics")?;
        Ok(topics
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .take(max_topics)
            .collect())
    }

    async fn generate_hashtags(
        &self,
        content: &str,
        max_hashtags: usize,
    ) -> Result<Vec<String>, LlmError> {
        let prompt = format!("Generate relevant hashtags for this content: {content}");
        let raw = self.chat(Some(HASHTAGS_SYSTEM_PROMPT), &prompt, 0.3).await?;
        let hashtags: Vec<String> = parse_json_answer(&raw, "generate_hashtags")?;
        Ok(hashtags
            .into_iter()
            .map(|h| h.trim().trim_start_matches('#').to_string())
            .filter(|h| !h.is_empty())
            .take(max_hashtags)
            .collect())
    }

    async fn improve_readability(&self, text: &str) -> Result<String, LlmError> {
        let prompt = format!("Improve the readability of this post: {text}");
        self.chat(Some(READABILITY_SYSTEM_PROMPT), &prompt, 0.5).await
    }
}

/// Classify a score into a label using the same thresholds the original
/// heuristics used (±0.1 around neutral).
pub(crate) fn label_for_score(score: f64) -> &'static str {
    if score > 0.1 {
        "positive"
    } else if score < -0.1 {
        "negative"
    } else {
        "neutral"
    }
}
