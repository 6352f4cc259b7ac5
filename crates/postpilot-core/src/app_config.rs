use std::net::SocketAddr;
use std::path::PathBuf;

use crate::Tone;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Settings for the language-model API client.
#[derive(Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
}

/// Settings for the posting platform client. `access_token` is optional so
/// the rest of the system can run without publishing credentials; the
/// publish job skips its scan when no token is present.
#[derive(Clone)]
pub struct LinkedinConfig {
    pub access_token: Option<String>,
    pub author_urn: Option<String>,
    pub base_url: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub lookback_hours: i64,
}

/// Tunables for the trend-to-post pipeline. All thresholds here are
/// configuration, not constants; the values below are only env defaults.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Target number of trend topics per collect pass (1..=50).
    pub max_trends: usize,
    /// Number of top-ranked topics the filter stage keeps.
    pub top_k: usize,
    /// Topics scoring below this are deactivated by the filter stage.
    pub min_relevance: f64,
    /// Drafts scoring below this get a readability rewrite pass.
    pub min_readability: f64,
    pub default_tone: Tone,
    /// Minimum spacing between assigned posting slots.
    pub slot_spacing_minutes: i64,
    /// Cadence of the full scheduled pipeline run.
    pub interval_secs: u64,
    /// Cadence of the due-post publishing scan.
    pub publish_scan_interval_secs: u64,
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub sources_path: PathBuf,
    pub llm: LlmConfig,
    pub linkedin: LinkedinConfig,
    pub feed: FeedConfig,
    pub pipeline: PipelineConfig,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &"[redacted]")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .finish()
    }
}

impl std::fmt::Debug for LinkedinConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkedinConfig")
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[redacted]"),
            )
            .field("author_urn", &self.author_urn)
            .field("base_url", &self.base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &"[redacted]")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("sources_path", &self.sources_path)
            .field("llm", &self.llm)
            .field("linkedin", &self.linkedin)
            .field("feed", &self.feed)
            .field("pipeline", &self.pipeline)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}
