//! HTTP client for fetching configured RSS feeds.

use std::time::Duration;

use postpilot_core::{FeedConfig, NewsSource};
use reqwest::Client;

use crate::error::NewsError;
use crate::rss::parse_rss_feed;
use crate::types::FetchedArticle;

/// Fetches and parses RSS feeds. One instance is shared across sources; the
/// per-request timeout comes from [`FeedConfig`].
#[derive(Clone)]
pub struct NewsClient {
    client: Client,
}

impl NewsClient {
    /// Build a client with the configured timeout and user agent.
    ///
    /// # Errors
    ///
    /// Returns [`NewsError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(config: &FeedConfig) -> Result<Self, NewsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { client })
    }

    /// Fetch one source's feed and parse its items.
    ///
    /// # Errors
    ///
    /// - [`NewsError::Http`] on network failure.
    /// - [`NewsError::Status`] on a non-2xx answer.
    /// - [`NewsError::Xml`] on a malformed feed body.
    pub async fn fetch_source(&self, source: &NewsSource) -> Result<Vec<FetchedArticle>, NewsError> {
        let response = self.client.get(&source.feed_url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NewsError::Status {
                status: status.as_u16(),
                url: source.feed_url.clone(),
            });
        }

        let body = response.text().await?;
        let articles = parse_rss_feed(&body, &source.name)?;

        tracing::info!(
            source = %source.name,
            items = articles.len(),
            "fetched feed"
        );

        Ok(articles)
    }
}
