use chrono::{DateTime, Utc};

/// One item parsed out of a source's RSS feed, before any storage or
/// relevance decisions.
#[derive(Debug, Clone)]
pub struct FetchedArticle {
    pub title: String,
    pub url: String,
    pub summary: Option<String>,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub categories: Vec<String>,
    /// Name of the configured source this came from.
    pub source: String,
}
