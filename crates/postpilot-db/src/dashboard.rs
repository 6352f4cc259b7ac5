//! Aggregate queries backing the dashboard and metrics endpoints.

use serde::Serialize;
use sqlx::PgPool;

use crate::DbError;

/// Entity counts shown on the dashboard.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DashboardCounts {
    pub active_trend_topics: i64,
    pub draft_posts: i64,
    pub scheduled_posts: i64,
    pub posted_posts: i64,
    pub failed_posts: i64,
    pub comments_awaiting_response: i64,
    pub unprocessed_articles: i64,
}

/// Engagement totals across posts, using each post's latest snapshot.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct EngagementTotals {
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
    pub views: i64,
}

/// One round-trip for all dashboard counts.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn dashboard_counts(pool: &PgPool) -> Result<DashboardCounts, DbError> {
    let counts = sqlx::query_as::<_, DashboardCounts>(
        "SELECT \
             (SELECT COUNT(*) FROM trend_topics WHERE is_active)            AS active_trend_topics, \
             (SELECT COUNT(*) FROM posts WHERE status = 'draft')            AS draft_posts, \
             (SELECT COUNT(*) FROM posts WHERE status = 'scheduled')        AS scheduled_posts, \
             (SELECT COUNT(*) FROM posts WHERE status = 'posted')           AS posted_posts, \
             (SELECT COUNT(*) FROM posts WHERE status = 'failed')           AS failed_posts, \
             (SELECT COUNT(*) FROM comments \
              WHERE requires_response AND NOT response_posted)              AS comments_awaiting_response, \
             (SELECT COUNT(*) FROM news_articles WHERE NOT processed)       AS unprocessed_articles",
    )
    .fetch_one(pool)
    .await?;

    Ok(counts)
}

/// Sum the latest engagement snapshot of every post.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn engagement_totals(pool: &PgPool) -> Result<EngagementTotals, DbError> {
    let totals = sqlx::query_as::<_, EngagementTotals>(
        "SELECT \
             COALESCE(SUM(latest.likes_count), 0)::bigint    AS likes, \
             COALESCE(SUM(latest.comments_count), 0)::bigint AS comments, \
             COALESCE(SUM(latest.shares_count), 0)::bigint   AS shares, \
             COALESCE(SUM(latest.views_count), 0)::bigint    AS views \
         FROM ( \
             SELECT DISTINCT ON (post_id) \
                 likes_count, comments_count, shares_count, views_count \
             FROM engagement_metrics \
             ORDER BY post_id, recorded_at DESC, id DESC \
         ) AS latest",
    )
    .fetch_one(pool)
    .await?;

    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dashboard_counts_serializes_all_fields() {
        let counts = DashboardCounts {
            active_trend_topics: 4,
            draft_posts: 1,
            scheduled_posts: 2,
            posted_posts: 10,
            failed_posts: 0,
            comments_awaiting_response: 3,
            unprocessed_articles: 7,
        };
        let json = serde_json::to_value(&counts).expect("serialize");
        assert_eq!(json["active_trend_topics"], 4);
        assert_eq!(json["unprocessed_articles"], 7);
    }
}
