//! Database operations for `trend_topics`.
//!
//! Topics are merged by normalized name: a repeat detection updates the
//! existing row (keeping the higher relevance score) instead of inserting a
//! duplicate. Topics are deactivated, never deleted.

use chrono::{DateTime, Utc};
use postpilot_core::NewTrendTopic;
use serde::Serialize;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `trend_topics` table.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TrendTopicRow {
    pub id: i64,
    pub topic: String,
    #[serde(skip)]
    pub normalized_topic: String,
    pub hashtags: Json<Vec<String>>,
    pub relevance_score: f64,
    pub source: String,
    pub detected_at: DateTime<Utc>,
    pub is_active: bool,
}

const TOPIC_COLUMNS: &str = "id, topic, normalized_topic, hashtags, relevance_score, source, \
                             detected_at, is_active";

/// Insert a topic, or merge into the existing row with the same normalized
/// name. The merged row keeps `GREATEST(old, new)` relevance; hashtags
/// follow whichever score won. A merge always re-activates the topic.
///
/// Safe under concurrent writers: the `normalized_topic` unique constraint
/// plus `ON CONFLICT` makes the read-or-create-then-update atomic.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_trend_topic(
    pool: &PgPool,
    topic: &NewTrendTopic,
) -> Result<TrendTopicRow, DbError> {
    let row = sqlx::query_as::<_, TrendTopicRow>(&format!(
        "INSERT INTO trend_topics (topic, normalized_topic, hashtags, relevance_score, source) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (normalized_topic) DO UPDATE SET \
             relevance_score = GREATEST(trend_topics.relevance_score, EXCLUDED.relevance_score), \
             hashtags = CASE \
                 WHEN EXCLUDED.relevance_score > trend_topics.relevance_score \
                 THEN EXCLUDED.hashtags \
                 ELSE trend_topics.hashtags \
             END, \
             is_active = TRUE \
         RETURNING {TOPIC_COLUMNS}"
    ))
    .bind(&topic.topic)
    .bind(&topic.normalized_topic)
    .bind(Json(&topic.hashtags))
    .bind(topic.relevance_score)
    .bind(&topic.source)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Fetch a single topic by id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists, or [`DbError::Sqlx`] if
/// the query fails.
pub async fn get_trend_topic(pool: &PgPool, id: i64) -> Result<TrendTopicRow, DbError> {
    let row = sqlx::query_as::<_, TrendTopicRow>(&format!(
        "SELECT {TOPIC_COLUMNS} FROM trend_topics WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// List topics ordered by relevance descending, optionally active only.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_trend_topics(
    pool: &PgPool,
    active_only: bool,
    limit: i64,
) -> Result<Vec<TrendTopicRow>, DbError> {
    let rows = sqlx::query_as::<_, TrendTopicRow>(&format!(
        "SELECT {TOPIC_COLUMNS} FROM trend_topics \
         WHERE ($1 = FALSE OR is_active) \
         ORDER BY relevance_score DESC, id \
         LIMIT $2"
    ))
    .bind(active_only)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// The top-`limit` active topics at or above `min_relevance`, ordered by
/// relevance descending. This is the filter stage's selection query.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn top_active_trend_topics(
    pool: &PgPool,
    min_relevance: f64,
    limit: i64,
) -> Result<Vec<TrendTopicRow>, DbError> {
    let rows = sqlx::query_as::<_, TrendTopicRow>(&format!(
        "SELECT {TOPIC_COLUMNS} FROM trend_topics \
         WHERE is_active AND relevance_score >= $1 \
         ORDER BY relevance_score DESC, id \
         LIMIT $2"
    ))
    .bind(min_relevance)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Deactivate all active topics below `min_relevance`. Returns how many
/// rows were deactivated. Topics are never deleted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn deactivate_trend_topics_below(
    pool: &PgPool,
    min_relevance: f64,
) -> Result<u64, DbError> {
    let result = sqlx::query(
        "UPDATE trend_topics SET is_active = FALSE \
         WHERE is_active AND relevance_score < $1",
    )
    .bind(min_relevance)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
