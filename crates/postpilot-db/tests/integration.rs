//! Offline unit tests for postpilot-db pool configuration and row types.
//! These tests do not require a live database connection.

use chrono::Utc;
use postpilot_db::{ActivityRow, CommentRow, NewsArticleRow, PoolConfig, PostRow, TrendTopicRow};
use sqlx::types::Json;

#[test]
fn pool_config_defaults_are_sane() {
    let config = PoolConfig::default();
    assert_eq!(config.max_connections, 10);
    assert_eq!(config.min_connections, 1);
    assert_eq!(config.acquire_timeout_secs, 10);
}

/// Compile-time smoke test: confirm that [`PostRow`] has all expected
/// fields with the correct types. No database required.
#[test]
fn post_row_has_expected_fields() {
    let row = PostRow {
        id: 1_i64,
        content: "content".to_string(),
        hashtags: Json(vec!["one".to_string()]),
        character_count: 7,
        readability_score: None,
        status: "draft".to_string(),
        scheduled_at: None,
        posted_at: None,
        linkedin_post_id: None,
        trend_topic_id: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    assert_eq!(row.status, "draft");
}

#[test]
fn trend_topic_row_has_expected_fields() {
    let row = TrendTopicRow {
        id: 1_i64,
        topic: "AI agents".to_string(),
        normalized_topic: "ai agents".to_string(),
        hashtags: Json(vec![]),
        relevance_score: 0.5_f64,
        source: "techcrunch".to_string(),
        detected_at: Utc::now(),
        is_active: true,
    };
    assert!(row.is_active);
}

#[test]
fn comment_row_serializes_lifecycle_fields() {
    let row = CommentRow {
        id: 2,
        linkedin_comment_id: "urn:li:comment:9".to_string(),
        post_id: Some(1),
        author_name: "Ada".to_string(),
        author_linkedin_id: None,
        content: "What about latency?".to_string(),
        sentiment_score: Some(-0.4),
        sentiment_label: Some("negative".to_string()),
        requires_response: true,
        response_generated: Some("Thanks for raising this".to_string()),
        response_posted: false,
        response_posted_at: None,
        received_at: Utc::now(),
        processed_at: Some(Utc::now()),
    };
    let json = serde_json::to_value(&row).expect("serialize");
    assert_eq!(json["requires_response"], true);
    assert_eq!(json["sentiment_label"], "negative");
}

#[test]
fn news_article_row_serializes_keywords() {
    let row = NewsArticleRow {
        id: 3,
        title: "New model ships".to_string(),
        url: "https://example.com/a".to_string(),
        summary: None,
        author: Some("Reporter".to_string()),
        source: "techcrunch".to_string(),
        published_at: Utc::now(),
        keywords: Json(vec!["ai".to_string()]),
        relevance_score: 0.0,
        processed: false,
        fetched_at: Utc::now(),
    };
    let json = serde_json::to_value(&row).expect("serialize");
    assert_eq!(json["keywords"][0], "ai");
}

#[test]
fn activity_row_serializes_details() {
    let row = ActivityRow {
        id: 4,
        agent_name: "pipeline".to_string(),
        activity_type: "collect".to_string(),
        status: "success".to_string(),
        details: Json(serde_json::json!({"topics": 2})),
        error_message: None,
        execution_time: Some(0.8),
        executed_at: Utc::now(),
    };
    let json = serde_json::to_value(&row).expect("serialize");
    assert_eq!(json["details"]["topics"], 2);
}
