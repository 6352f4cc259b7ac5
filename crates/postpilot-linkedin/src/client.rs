//! Minimal client for the LinkedIn UGC share endpoint.
//!
//! Only what the publish job needs: create one text share and get the
//! platform's post id back. The client is constructed from optional
//! credentials; a missing token is a constructor error so callers can
//! decide to skip publishing instead of failing per post.

use std::time::Duration;

use postpilot_core::LinkedinConfig;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::error::LinkedinError;

#[derive(Debug, Deserialize)]
struct ShareResponse {
    #[serde(default)]
    id: Option<String>,
}

/// Client for creating shares on the posting platform.
#[derive(Clone, Debug)]
pub struct LinkedinClient {
    client: Client,
    access_token: String,
    author_urn: String,
    base_url: Url,
}

impl LinkedinClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`LinkedinError::Missing`] when the access token or author
    /// URN is absent, [`LinkedinError::Http`] if the HTTP client cannot be
    /// constructed, or [`LinkedinError::Api`] for a malformed base URL.
    pub fn new(config: &LinkedinConfig) -> Result<Self, LinkedinError> {
        let base_url = config.base_url.clone();
        Self::with_base_url(config, &base_url)
    }

    /// Build a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Same as [`LinkedinClient::new`].
    pub fn with_base_url(config: &LinkedinConfig, base_url: &str) -> Result<Self, LinkedinError> {
        let access_token = config
            .access_token
            .clone()
            .ok_or(LinkedinError::Missing("access token"))?;
        let author_urn = config
            .author_urn
            .clone()
            .ok_or(LinkedinError::Missing("author URN"))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("postpilot/0.1 (content-automation)")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| LinkedinError::Api {
            status: 0,
            message: format!("invalid base URL '{base_url}': {e}"),
        })?;

        Ok(Self {
            client,
            access_token,
            author_urn,
            base_url,
        })
    }

    /// Create one public text share; returns the platform post id.
    ///
    /// Hashtags are appended to the text on their own line, `#`-prefixed.
    ///
    /// # Errors
    ///
    /// - [`LinkedinError::Api`] on a non-2xx answer.
    /// - [`LinkedinError::Http`] on network failure.
    /// - [`LinkedinError::UnexpectedResponse`] when no post id came back.
    pub async fn share_post(
        &self,
        content: &str,
        hashtags: &[String],
    ) -> Result<String, LinkedinError> {
        let url = self
            .base_url
            .join("v2/ugcPosts")
            .map_err(|e| LinkedinError::Api {
                status: 0,
                message: format!("invalid share URL: {e}"),
            })?;

        let body = serde_json::json!({
            "author": self.author_urn,
            "lifecycleState": "PUBLISHED",
            "specificContent": {
                "com.linkedin.ugc.ShareContent": {
                    "shareCommentary": { "text": render_share_text(content, hashtags) },
                    "shareMediaCategory": "NONE"
                }
            },
            "visibility": {
                "com.linkedin.ugc.MemberNetworkVisibility": "PUBLIC"
            }
        });

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.access_token)
            .header("X-Restli-Protocol-Version", "2.0.0")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LinkedinError::Api {
                status: status.as_u16(),
                message,
            });
        }

        // The id arrives in the body for JSON answers and in the
        // x-restli-id header otherwise; accept either.
        let header_id = response
            .headers()
            .get("x-restli-id")
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);

        let body_id = response
            .json::<ShareResponse>()
            .await
            .ok()
            .and_then(|share| share.id);

        body_id
            .or(header_id)
            .ok_or_else(|| LinkedinError::UnexpectedResponse("no post id in response".to_string()))
    }
}

/// Compose the final share text: content, then hashtags on their own line.
fn render_share_text(content: &str, hashtags: &[String]) -> String {
    if hashtags.is_empty() {
        return content.to_string();
    }
    let tags = hashtags
        .iter()
        .map(|tag| format!("#{tag}"))
        .collect::<Vec<_>>()
        .join(" ");
    format!("{content}\n\n{tags}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_share_text_appends_hashtags() {
        let text = render_share_text("Hello", &["ai".to_string(), "tech".to_string()]);
        assert_eq!(text, "Hello\n\n#ai #tech");
    }

    #[test]
    fn render_share_text_without_hashtags_is_unchanged() {
        assert_eq!(render_share_text("Hello", &[]), "Hello");
    }

    #[test]
    fn missing_token_is_a_constructor_error() {
        let config = LinkedinConfig {
            access_token: None,
            author_urn: Some("urn:li:person:1".to_string()),
            base_url: "https://api.linkedin.com".to_string(),
            request_timeout_secs: 30,
        };
        let err = LinkedinClient::new(&config).unwrap_err();
        assert!(matches!(err, LinkedinError::Missing("access token")));
    }

    #[test]
    fn missing_author_urn_is_a_constructor_error() {
        let config = LinkedinConfig {
            access_token: Some("tok".to_string()),
            author_urn: None,
            base_url: "https://api.linkedin.com".to_string(),
            request_timeout_secs: 30,
        };
        let err = LinkedinClient::new(&config).unwrap_err();
        assert!(matches!(err, LinkedinError::Missing("author URN")));
    }
}
