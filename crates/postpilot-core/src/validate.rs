//! Explicit validation constructors for inbound data.
//!
//! Every field constraint is enumerated in code here; nothing is derived
//! from schema annotations. Constructors reject bad input before any side
//! effect happens, returning a [`ValidationError`] naming the field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::text::normalize_topic;
use crate::Tone;

/// Maximum number of hashtags a post may carry.
pub const MAX_POST_HASHTAGS: usize = 5;

/// A field-level validation failure.
#[derive(Debug, Clone, Error, Serialize)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

fn check_len(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(ValidationError::new(
            field,
            format!("length must be between {min} and {max} characters; got {len}"),
        ));
    }
    Ok(())
}

fn check_unit_range(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(ValidationError::new(
            field,
            format!("must be between 0.0 and 1.0; got {value}"),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Trend topics
// ---------------------------------------------------------------------------

/// A validated trend topic ready for insertion.
#[derive(Debug, Clone)]
pub struct NewTrendTopic {
    pub topic: String,
    pub normalized_topic: String,
    pub hashtags: Vec<String>,
    pub relevance_score: f64,
    pub source: String,
}

impl NewTrendTopic {
    /// Validate and build a trend topic.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if `topic` is not 1–200 chars, `source`
    /// is not 1–100 chars, `relevance_score` is outside `[0, 1]`, or any
    /// hashtag is empty or longer than 100 chars.
    pub fn new(
        topic: impl Into<String>,
        hashtags: Vec<String>,
        relevance_score: f64,
        source: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let topic = topic.into();
        let source = source.into();

        let trimmed = topic.trim();
        check_len("topic", trimmed, 1, 200)?;
        check_len("source", source.trim(), 1, 100)?;
        check_unit_range("relevance_score", relevance_score)?;
        for tag in &hashtags {
            check_len("hashtags", tag, 1, 100)?;
        }

        Ok(Self {
            normalized_topic: normalize_topic(trimmed),
            topic: trimmed.to_string(),
            hashtags,
            relevance_score,
            source,
        })
    }
}

// ---------------------------------------------------------------------------
// Posts
// ---------------------------------------------------------------------------

/// A validated post ready for insertion in `draft` status.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub content: String,
    pub hashtags: Vec<String>,
    pub trend_topic_id: Option<i64>,
    pub readability_score: Option<f64>,
}

impl NewPost {
    /// Validate and build a post.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if `content` is not 1–3000 chars or more
    /// than [`MAX_POST_HASHTAGS`] hashtags are supplied.
    pub fn new(
        content: impl Into<String>,
        hashtags: Vec<String>,
        trend_topic_id: Option<i64>,
    ) -> Result<Self, ValidationError> {
        let content = content.into();
        check_len("content", &content, 1, 3_000)?;

        if hashtags.len() > MAX_POST_HASHTAGS {
            return Err(ValidationError::new(
                "hashtags",
                format!(
                    "at most {MAX_POST_HASHTAGS} hashtags allowed; got {}",
                    hashtags.len()
                ),
            ));
        }
        for tag in &hashtags {
            check_len("hashtags", tag, 1, 100)?;
        }

        Ok(Self {
            content,
            hashtags,
            trend_topic_id,
            readability_score: None,
        })
    }

    /// Character count persisted alongside the content.
    #[must_use]
    pub fn character_count(&self) -> i32 {
        i32::try_from(self.content.chars().count()).unwrap_or(i32::MAX)
    }
}

// ---------------------------------------------------------------------------
// Content generation requests
// ---------------------------------------------------------------------------

/// A request to draft one post, from either a stored trend topic or a
/// caller-supplied custom topic; never both, never neither.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationRequest {
    pub trend_topic_id: Option<i64>,
    pub custom_topic: Option<String>,
    #[serde(default)]
    pub tone: Option<Tone>,
    #[serde(default = "default_include_hashtags")]
    pub include_hashtags: bool,
}

fn default_include_hashtags() -> bool {
    true
}

impl GenerationRequest {
    /// Check the trend/custom exclusivity rule and the custom topic length.
    ///
    /// # Errors
    ///
    /// Returns the same [`ValidationError`] kind (field `topic`) whether
    /// both inputs are set or neither is.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match (self.trend_topic_id, &self.custom_topic) {
            (Some(_), Some(_)) | (None, None) => Err(ValidationError::new(
                "topic",
                "exactly one of trend_topic_id and custom_topic must be provided",
            )),
            (None, Some(custom)) => check_len("custom_topic", custom.trim(), 1, 200),
            (Some(_), None) => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

/// A validated inbound comment.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub linkedin_comment_id: String,
    pub post_id: Option<i64>,
    pub author_name: String,
    pub author_linkedin_id: Option<String>,
    pub content: String,
}

impl NewComment {
    /// Validate and build a comment.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] on empty or oversized fields.
    pub fn new(
        linkedin_comment_id: impl Into<String>,
        post_id: Option<i64>,
        author_name: impl Into<String>,
        author_linkedin_id: Option<String>,
        content: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let linkedin_comment_id = linkedin_comment_id.into();
        let author_name = author_name.into();
        let content = content.into();

        check_len("linkedin_comment_id", &linkedin_comment_id, 1, 255)?;
        check_len("author_name", author_name.trim(), 1, 255)?;
        if content.trim().is_empty() {
            return Err(ValidationError::new("content", "must be non-empty"));
        }

        Ok(Self {
            linkedin_comment_id,
            post_id,
            author_name,
            author_linkedin_id,
            content,
        })
    }
}

// ---------------------------------------------------------------------------
// News articles
// ---------------------------------------------------------------------------

/// A validated news article.
#[derive(Debug, Clone)]
pub struct NewNewsArticle {
    pub title: String,
    pub url: String,
    pub summary: Option<String>,
    pub author: Option<String>,
    pub source: String,
    pub published_at: DateTime<Utc>,
    pub keywords: Vec<String>,
    pub relevance_score: f64,
}

impl NewNewsArticle {
    /// Validate and build a news article.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] on out-of-range fields or a non-http URL.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        summary: Option<String>,
        author: Option<String>,
        source: impl Into<String>,
        published_at: DateTime<Utc>,
        keywords: Vec<String>,
        relevance_score: f64,
    ) -> Result<Self, ValidationError> {
        let title = title.into();
        let url = url.into();
        let source = source.into();

        check_len("title", title.trim(), 1, 500)?;
        check_len("url", &url, 1, 1_000)?;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ValidationError::new("url", "must be an http(s) URL"));
        }
        check_len("source", source.trim(), 1, 100)?;
        check_unit_range("relevance_score", relevance_score)?;

        Ok(Self {
            title,
            url,
            summary,
            author,
            source,
            published_at,
            keywords,
            relevance_score,
        })
    }
}

// ---------------------------------------------------------------------------
// Engagement metrics
// ---------------------------------------------------------------------------

/// A validated engagement snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct NewEngagementMetric {
    #[serde(default)]
    pub likes_count: i32,
    #[serde(default)]
    pub comments_count: i32,
    #[serde(default)]
    pub shares_count: i32,
    #[serde(default)]
    pub views_count: i32,
}

impl NewEngagementMetric {
    /// Reject negative counters.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] naming the first negative counter.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("likes_count", self.likes_count),
            ("comments_count", self.comments_count),
            ("shares_count", self.shares_count),
            ("views_count", self.views_count),
        ] {
            if value < 0 {
                return Err(ValidationError::new(field, "must be non-negative"));
            }
        }
        Ok(())
    }
}
