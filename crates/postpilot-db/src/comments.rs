//! Database operations for `comments`.
//!
//! Lifecycle: received (inserted, `processed_at` NULL) -> processed
//! (sentiment attached) -> optionally responded.

use chrono::{DateTime, Utc};
use postpilot_core::NewComment;
use serde::Serialize;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `comments` table.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CommentRow {
    pub id: i64,
    pub linkedin_comment_id: String,
    pub post_id: Option<i64>,
    pub author_name: String,
    pub author_linkedin_id: Option<String>,
    pub content: String,
    pub sentiment_score: Option<f64>,
    pub sentiment_label: Option<String>,
    pub requires_response: bool,
    pub response_generated: Option<String>,
    pub response_posted: bool,
    pub response_posted_at: Option<DateTime<Utc>>,
    pub received_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

const COMMENT_COLUMNS: &str = "id, linkedin_comment_id, post_id, author_name, author_linkedin_id, \
                               content, sentiment_score, sentiment_label, requires_response, \
                               response_generated, response_posted, response_posted_at, \
                               received_at, processed_at";

/// Insert a newly received comment.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails; a duplicate
/// `linkedin_comment_id` surfaces as a unique violation.
pub async fn create_comment(pool: &PgPool, comment: &NewComment) -> Result<CommentRow, DbError> {
    let row = sqlx::query_as::<_, CommentRow>(&format!(
        "INSERT INTO comments \
             (linkedin_comment_id, post_id, author_name, author_linkedin_id, content) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING {COMMENT_COLUMNS}"
    ))
    .bind(&comment.linkedin_comment_id)
    .bind(comment.post_id)
    .bind(&comment.author_name)
    .bind(&comment.author_linkedin_id)
    .bind(&comment.content)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Fetch a single comment by id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists, or [`DbError::Sqlx`] if
/// the query fails.
pub async fn get_comment(pool: &PgPool, id: i64) -> Result<CommentRow, DbError> {
    let row = sqlx::query_as::<_, CommentRow>(&format!(
        "SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// List comments, newest first, optionally only those flagged for response.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_comments(
    pool: &PgPool,
    requires_response: Option<bool>,
    limit: i64,
) -> Result<Vec<CommentRow>, DbError> {
    let rows = sqlx::query_as::<_, CommentRow>(&format!(
        "SELECT {COMMENT_COLUMNS} FROM comments \
         WHERE ($1::boolean IS NULL OR requires_response = $1) \
         ORDER BY received_at DESC, id DESC \
         LIMIT $2"
    ))
    .bind(requires_response)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Comments awaiting sentiment processing, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_unprocessed_comments(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<CommentRow>, DbError> {
    let rows = sqlx::query_as::<_, CommentRow>(&format!(
        "SELECT {COMMENT_COLUMNS} FROM comments \
         WHERE processed_at IS NULL \
         ORDER BY received_at, id \
         LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Attach sentiment results (and an optional drafted reply) to a comment
/// and stamp it processed.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the comment does not exist, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn set_comment_analysis(
    pool: &PgPool,
    id: i64,
    sentiment_score: f64,
    sentiment_label: &str,
    requires_response: bool,
    response_generated: Option<&str>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE comments \
         SET sentiment_score = $1, sentiment_label = $2, requires_response = $3, \
             response_generated = $4, processed_at = NOW() \
         WHERE id = $5",
    )
    .bind(sentiment_score)
    .bind(sentiment_label)
    .bind(requires_response)
    .bind(response_generated)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}
