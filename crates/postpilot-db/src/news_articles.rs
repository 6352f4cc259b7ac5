//! Database operations for `news_articles`.

use chrono::{DateTime, Utc};
use postpilot_core::NewNewsArticle;
use serde::Serialize;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `news_articles` table.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct NewsArticleRow {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub summary: Option<String>,
    pub author: Option<String>,
    pub source: String,
    pub published_at: DateTime<Utc>,
    pub keywords: Json<Vec<String>>,
    pub relevance_score: f64,
    pub processed: bool,
    pub fetched_at: DateTime<Utc>,
}

const ARTICLE_COLUMNS: &str = "id, title, url, summary, author, source, published_at, keywords, \
                               relevance_score, processed, fetched_at";

/// Insert an article unless its URL is already stored. Returns the new row,
/// or `None` when the URL was a duplicate.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_article_if_new(
    pool: &PgPool,
    article: &NewNewsArticle,
) -> Result<Option<NewsArticleRow>, DbError> {
    let row = sqlx::query_as::<_, NewsArticleRow>(&format!(
        "INSERT INTO news_articles \
             (title, url, summary, author, source, published_at, keywords, relevance_score) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         ON CONFLICT (url) DO NOTHING \
         RETURNING {ARTICLE_COLUMNS}"
    ))
    .bind(&article.title)
    .bind(&article.url)
    .bind(&article.summary)
    .bind(&article.author)
    .bind(&article.source)
    .bind(article.published_at)
    .bind(Json(&article.keywords))
    .bind(article.relevance_score)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// List articles, newest first, optionally only those not yet distilled
/// into trend topics.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_news_articles(
    pool: &PgPool,
    unprocessed_only: bool,
    limit: i64,
) -> Result<Vec<NewsArticleRow>, DbError> {
    let rows = sqlx::query_as::<_, NewsArticleRow>(&format!(
        "SELECT {ARTICLE_COLUMNS} FROM news_articles \
         WHERE ($1 = FALSE OR processed = FALSE) \
         ORDER BY published_at DESC, id DESC \
         LIMIT $2"
    ))
    .bind(unprocessed_only)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Mark an article as processed into trend topics.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the article does not exist, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn mark_article_processed(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query("UPDATE news_articles SET processed = TRUE WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}
