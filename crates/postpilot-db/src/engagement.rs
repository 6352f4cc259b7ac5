//! Database operations for `engagement_metrics`: an append-only snapshot
//! series per post.

use chrono::{DateTime, Utc};
use postpilot_core::NewEngagementMetric;
use serde::Serialize;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `engagement_metrics` table.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct EngagementMetricRow {
    pub id: i64,
    pub post_id: i64,
    pub likes_count: i32,
    pub comments_count: i32,
    pub shares_count: i32,
    pub views_count: i32,
    pub recorded_at: DateTime<Utc>,
}

const METRIC_COLUMNS: &str =
    "id, post_id, likes_count, comments_count, shares_count, views_count, recorded_at";

/// Append one engagement snapshot for a post.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including an unknown
/// `post_id`, surfaced as a foreign-key violation).
pub async fn insert_engagement_metric(
    pool: &PgPool,
    post_id: i64,
    metric: &NewEngagementMetric,
) -> Result<EngagementMetricRow, DbError> {
    let row = sqlx::query_as::<_, EngagementMetricRow>(&format!(
        "INSERT INTO engagement_metrics \
             (post_id, likes_count, comments_count, shares_count, views_count) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING {METRIC_COLUMNS}"
    ))
    .bind(post_id)
    .bind(metric.likes_count)
    .bind(metric.comments_count)
    .bind(metric.shares_count)
    .bind(metric.views_count)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Snapshot history for one post, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_engagement_for_post(
    pool: &PgPool,
    post_id: i64,
    limit: i64,
) -> Result<Vec<EngagementMetricRow>, DbError> {
    let rows = sqlx::query_as::<_, EngagementMetricRow>(&format!(
        "SELECT {METRIC_COLUMNS} FROM engagement_metrics \
         WHERE post_id = $1 \
         ORDER BY recorded_at DESC, id DESC \
         LIMIT $2"
    ))
    .bind(post_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
