//! Database operations for `posts`.
//!
//! Status transitions are guarded in SQL: every transition update names the
//! status it expects, and an update matching zero rows surfaces as
//! [`DbError::InvalidPostTransition`]. That keeps the lifecycle strictly
//! forward: draft -> scheduled -> posted | failed.

use chrono::{DateTime, Utc};
use postpilot_core::NewPost;
use serde::Serialize;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `posts` table.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PostRow {
    pub id: i64,
    pub content: String,
    pub hashtags: Json<Vec<String>>,
    pub character_count: i32,
    pub readability_score: Option<f64>,
    pub status: String,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub posted_at: Option<DateTime<Utc>>,
    pub linkedin_post_id: Option<String>,
    pub trend_topic_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const POST_COLUMNS: &str = "id, content, hashtags, character_count, readability_score, status, \
                            scheduled_at, posted_at, linkedin_post_id, trend_topic_id, \
                            created_at, updated_at";

/// Insert a new post in `draft` status.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_post(pool: &PgPool, post: &NewPost) -> Result<PostRow, DbError> {
    let row = sqlx::query_as::<_, PostRow>(&format!(
        "INSERT INTO posts \
             (content, hashtags, character_count, readability_score, trend_topic_id) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING {POST_COLUMNS}"
    ))
    .bind(&post.content)
    .bind(Json(&post.hashtags))
    .bind(post.character_count())
    .bind(post.readability_score)
    .bind(post.trend_topic_id)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Fetch a single post by id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists, or [`DbError::Sqlx`] if
/// the query fails.
pub async fn get_post(pool: &PgPool, id: i64) -> Result<PostRow, DbError> {
    let row = sqlx::query_as::<_, PostRow>(&format!(
        "SELECT {POST_COLUMNS} FROM posts WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// List posts, newest first, optionally filtered by status.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_posts(
    pool: &PgPool,
    status: Option<&str>,
    limit: i64,
) -> Result<Vec<PostRow>, DbError> {
    let rows = sqlx::query_as::<_, PostRow>(&format!(
        "SELECT {POST_COLUMNS} FROM posts \
         WHERE ($1::text IS NULL OR status = $1) \
         ORDER BY created_at DESC, id DESC \
         LIMIT $2"
    ))
    .bind(status)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Persist the review stage's outcome on a draft: possibly-rewritten
/// content and the readability score that matches it.
///
/// # Errors
///
/// Returns [`DbError::InvalidPostTransition`] if the post is not a draft,
/// or [`DbError::Sqlx`] if the update fails.
pub async fn set_review_results(
    pool: &PgPool,
    id: i64,
    content: &str,
    character_count: i32,
    readability_score: f64,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE posts \
         SET content = $1, character_count = $2, readability_score = $3, updated_at = NOW() \
         WHERE id = $4 AND status = 'draft'",
    )
    .bind(content)
    .bind(character_count)
    .bind(readability_score)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidPostTransition {
            id,
            expected_status: "draft",
        });
    }

    Ok(())
}

/// Transition a draft to `scheduled` with its assigned slot.
///
/// # Errors
///
/// Returns [`DbError::InvalidPostTransition`] if the post is not a draft,
/// or [`DbError::Sqlx`] if the update fails.
pub async fn schedule_post(
    pool: &PgPool,
    id: i64,
    scheduled_at: DateTime<Utc>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE posts \
         SET status = 'scheduled', scheduled_at = $1, updated_at = NOW() \
         WHERE id = $2 AND status = 'draft'",
    )
    .bind(scheduled_at)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidPostTransition {
            id,
            expected_status: "draft",
        });
    }

    Ok(())
}

/// Transition a scheduled post to `posted`, recording the platform id.
///
/// # Errors
///
/// Returns [`DbError::InvalidPostTransition`] if the post is not scheduled,
/// or [`DbError::Sqlx`] if the update fails.
pub async fn mark_post_posted(
    pool: &PgPool,
    id: i64,
    linkedin_post_id: &str,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE posts \
         SET status = 'posted', posted_at = NOW(), linkedin_post_id = $1, updated_at = NOW() \
         WHERE id = $2 AND status = 'scheduled'",
    )
    .bind(linkedin_post_id)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidPostTransition {
            id,
            expected_status: "scheduled",
        });
    }

    Ok(())
}

/// Transition a scheduled post to `failed`. The failure reason lands on the
/// activity log, not on the post row.
///
/// # Errors
///
/// Returns [`DbError::InvalidPostTransition`] if the post is not scheduled,
/// or [`DbError::Sqlx`] if the update fails.
pub async fn mark_post_failed(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE posts \
         SET status = 'failed', updated_at = NOW() \
         WHERE id = $1 AND status = 'scheduled'",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidPostTransition {
            id,
            expected_status: "scheduled",
        });
    }

    Ok(())
}

/// Scheduled posts whose slot has arrived, oldest slot first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_due_posts(pool: &PgPool, now: DateTime<Utc>) -> Result<Vec<PostRow>, DbError> {
    let rows = sqlx::query_as::<_, PostRow>(&format!(
        "SELECT {POST_COLUMNS} FROM posts \
         WHERE status = 'scheduled' AND scheduled_at <= $1 \
         ORDER BY scheduled_at, id"
    ))
    .bind(now)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// The latest slot already handed out, across scheduled and posted posts.
/// The schedule stage starts new slots after this.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn last_scheduled_at(pool: &PgPool) -> Result<Option<DateTime<Utc>>, DbError> {
    let latest: Option<DateTime<Utc>> = sqlx::query_scalar(
        "SELECT MAX(scheduled_at) FROM posts WHERE status IN ('scheduled', 'posted')",
    )
    .fetch_one(pool)
    .await?;

    Ok(latest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn post_row_is_serializable() {
        let row = PostRow {
            id: 7,
            content: "Draft content".to_string(),
            hashtags: Json(vec!["ai".to_string(), "tech".to_string()]),
            character_count: 13,
            readability_score: Some(72.5),
            status: "draft".to_string(),
            scheduled_at: None,
            posted_at: None,
            linkedin_post_id: None,
            trend_topic_id: Some(3),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&row).expect("serialize");
        assert_eq!(json["status"], "draft");
        assert_eq!(json["hashtags"].as_array().map(Vec::len), Some(2));
        assert!(json["scheduled_at"].is_null());
    }
}
