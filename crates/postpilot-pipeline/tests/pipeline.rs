//! End-to-end pipeline tests: live Postgres via `#[sqlx::test]`, a wiremock
//! RSS feed, and a deterministic fake language model.

use chrono::{Duration, Utc};
use postpilot_core::{
    FeedConfig, GenerationRequest, LinkedinConfig, NewComment, NewsSource, PipelineConfig, Tone,
};
use postpilot_db::{
    create_comment, list_activities, list_posts, list_trend_topics, schedule_post,
};
use postpilot_linkedin::LinkedinClient;
use postpilot_llm::{LanguageModel, LlmError, SentimentAnalysis};
use postpilot_news::NewsClient;
use postpilot_pipeline::{
    process_pending_comments, publish_due_posts, Pipeline, PipelineError,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ---------------------------------------------------------------------------
// Fake language model
// ---------------------------------------------------------------------------

/// Deterministic stand-in for the LLM: topic-aware relevance scores and a
/// short, readable canned post.
struct FakeLlm;

const FAKE_POST: &str = "AI agents are moving from demos to production. Teams now ship real \
work with them.\n\nStart small. Measure the impact. Share what you learn.\n\nWhat is your team \
automating first?";

impl LanguageModel for FakeLlm {
    async fn generate_text(
        &self,
        prompt: &str,
        _system_prompt: Option<&str>,
        _temperature: Option<f32>,
    ) -> Result<String, LlmError> {
        if prompt.contains("Rate the relevance") {
            if prompt.contains("AI agents") {
                return Ok("0.8".to_string());
            }
            if prompt.contains("Remote work") {
                return Ok("0.2".to_string());
            }
            return Ok("0.5".to_string());
        }
        if prompt.starts_with("Write a reply") {
            return Ok("Thanks for the question. Rollout starts with a pilot team.".to_string());
        }
        Ok(FAKE_POST.to_string())
    }

    async fn analyze_sentiment(&self, text: &str) -> Result<SentimentAnalysis, LlmError> {
        if text.contains("terrible") {
            return Ok(SentimentAnalysis {
                sentiment_score: -0.6,
                sentiment_label: "negative".to_string(),
                explanation: None,
            });
        }
        Ok(SentimentAnalysis {
            sentiment_score: 0.0,
            sentiment_label: "neutral".to_string(),
            explanation: None,
        })
    }

    async fn extract_topics(&self, text: &str, _max_topics: usize) -> Result<Vec<String>, LlmError> {
        let mut topics = Vec::new();
        if text.contains("AI agents") {
            topics.push("AI agents".to_string());
        }
        if text.contains("Remote work") {
            topics.push("Remote work".to_string());
        }
        Ok(topics)
    }

    async fn generate_hashtags(
        &self,
        _content: &str,
        max_hashtags: usize,
    ) -> Result<Vec<String>, LlmError> {
        Ok(["ai", "agents", "tech"]
            .iter()
            .take(max_hashtags)
            .map(ToString::to_string)
            .collect())
    }

    async fn improve_readability(&self, text: &str) -> Result<String, LlmError> {
        Ok(text.to_string())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn feed_body() -> String {
    let recent = (Utc::now() - Duration::hours(1)).to_rfc2822();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Tech News</title>
    <item>
      <title>AI agents are everywhere</title>
      <link>https://example.com/ai-agents</link>
      <description>Autonomous AI agents are shipping in production software.</description>
      <pubDate>{recent}</pubDate>
    </item>
    <item>
      <title>Remote work is here to stay</title>
      <link>https://example.com/remote-work</link>
      <description>Remote work platforms keep growing fast.</description>
      <pubDate>{recent}</pubDate>
    </item>
  </channel>
</rss>"#
    )
}

fn test_config() -> PipelineConfig {
    PipelineConfig {
        max_trends: 10,
        top_k: 5,
        min_relevance: 0.3,
        min_readability: 60.0,
        default_tone: Tone::Professional,
        slot_spacing_minutes: 90,
        interval_secs: 3_600,
        publish_scan_interval_secs: 60,
    }
}

fn test_pipeline(pool: sqlx::PgPool, feed_base: &str) -> Pipeline<FakeLlm> {
    let news = NewsClient::new(&FeedConfig {
        request_timeout_secs: 5,
        user_agent: "postpilot-test/0.1".to_string(),
        lookback_hours: 24,
    })
    .expect("news client");

    let sources = vec![NewsSource {
        name: "technews".to_string(),
        feed_url: format!("{feed_base}/feed"),
        enabled: true,
    }];

    Pipeline::new(pool, FakeLlm, news, sources, test_config(), 24)
}

async fn mock_feed(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(ResponseTemplate::new(200).set_body_string(feed_body()))
        .mount(server)
        .await;
}

// ---------------------------------------------------------------------------
// Full-run scenarios
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn full_run_collects_filters_drafts_reviews_and_schedules(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    mock_feed(&server).await;

    let pipeline = test_pipeline(pool.clone(), &server.uri());
    let before = Utc::now();

    let report = pipeline.run().await;
    assert!(report.success, "run should succeed: {:?}", report.errors);
    assert_eq!(report.articles_stored, 2);
    assert_eq!(report.trends_found, 2);
    assert_eq!(report.posts_generated, 1, "only the topic above threshold drafts");
    assert_eq!(report.posts_scheduled, 1);

    // Only "AI agents" (blended score above 0.3) stays active.
    let active = list_trend_topics(&pool, true, 10).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].topic, "AI agents");

    // "Remote work" was deactivated, not deleted.
    let all = list_trend_topics(&pool, false, 10).await.unwrap();
    assert_eq!(all.len(), 2);

    let scheduled = list_posts(&pool, Some("scheduled"), 10).await.unwrap();
    assert_eq!(scheduled.len(), 1);
    let post = &scheduled[0];
    assert_eq!(post.trend_topic_id, Some(active[0].id));
    assert!(post.hashtags.0.len() <= 5);

    let readability = post.readability_score.expect("review must score the draft");
    assert!((0.0..=100.0).contains(&readability));

    assert!(
        post.scheduled_at.expect("slot assigned") > before,
        "slot must be in the future"
    );

    // One activity row per stage, in stage order, plus the run summary.
    let activities = list_activities(&pool, Some("pipeline"), None, 20).await.unwrap();
    let mut types: Vec<&str> = activities.iter().map(|a| a.activity_type.as_str()).collect();
    types.reverse(); // listing is newest-first
    assert_eq!(
        types,
        vec!["collect", "filter", "generate", "review", "schedule", "run"]
    );
    assert!(activities.iter().all(|a| a.status == "success"));
    assert!(activities.iter().all(|a| a.execution_time.is_some()));
}

#[sqlx::test(migrations = "../../migrations")]
async fn rerunning_merges_topics_instead_of_duplicating(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    mock_feed(&server).await;

    let pipeline = test_pipeline(pool.clone(), &server.uri());

    let first = pipeline.run().await;
    assert!(first.success);
    let second = pipeline.run().await;
    assert!(second.success);

    // Two runs over the same feed: still exactly one row per topic name.
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM trend_topics")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 2, "merge-by-name must not duplicate topics");

    // Articles are unique by URL as well.
    let articles: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM news_articles")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(articles, 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn all_sources_failing_fails_the_run_and_logs_an_error(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let pipeline = test_pipeline(pool.clone(), &server.uri());
    let report = pipeline.run().await;

    assert!(!report.success);
    assert!(!report.errors.is_empty());

    let activities = list_activities(&pool, Some("pipeline"), None, 10).await.unwrap();
    let collect = activities
        .iter()
        .find(|a| a.activity_type == "collect")
        .expect("collect activity recorded");
    assert_eq!(collect.status, "error");
    assert!(collect.error_message.as_deref().unwrap_or_default().contains("sources"));

    // No later stages ran.
    assert!(activities.iter().all(|a| a.activity_type != "generate"));
}

// ---------------------------------------------------------------------------
// On-demand generation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn on_demand_generation_requires_exactly_one_topic_input(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    let pipeline = test_pipeline(pool.clone(), &server.uri());

    let both = GenerationRequest {
        trend_topic_id: Some(1),
        custom_topic: Some("Rust".to_string()),
        tone: None,
        include_hashtags: true,
    };
    let neither = GenerationRequest {
        trend_topic_id: None,
        custom_topic: None,
        tone: None,
        include_hashtags: true,
    };

    let err_both = pipeline.generate_for_request(&both).await.unwrap_err();
    let err_neither = pipeline.generate_for_request(&neither).await.unwrap_err();
    assert!(matches!(err_both, PipelineError::Validation(_)));
    assert!(matches!(err_neither, PipelineError::Validation(_)));

    // Rejected before any side effect.
    let posts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(posts, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn on_demand_generation_with_custom_topic_creates_a_draft(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    let pipeline = test_pipeline(pool.clone(), &server.uri());

    let request = GenerationRequest {
        trend_topic_id: None,
        custom_topic: Some("Edge computing".to_string()),
        tone: Some(Tone::Casual),
        include_hashtags: false,
    };

    let post = pipeline.generate_for_request(&request).await.expect("draft");
    assert_eq!(post.status, "draft");
    assert!(post.trend_topic_id.is_none());
    assert!(post.hashtags.0.is_empty());
    assert!(post.character_count > 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn on_demand_generation_for_unknown_trend_is_not_found(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    let pipeline = test_pipeline(pool.clone(), &server.uri());

    let request = GenerationRequest {
        trend_topic_id: Some(999),
        custom_topic: None,
        tone: None,
        include_hashtags: true,
    };

    let err = pipeline.generate_for_request(&request).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Db(postpilot_db::DbError::NotFound)
    ));
}

// ---------------------------------------------------------------------------
// Publishing
// ---------------------------------------------------------------------------

fn linkedin_client(base_url: &str) -> LinkedinClient {
    LinkedinClient::with_base_url(
        &LinkedinConfig {
            access_token: Some("tok".to_string()),
            author_urn: Some("urn:li:person:1".to_string()),
            base_url: "http://unused.invalid".to_string(),
            request_timeout_secs: 5,
        },
        base_url,
    )
    .expect("linkedin client")
}

#[sqlx::test(migrations = "../../migrations")]
async fn publish_scan_posts_due_posts(pool: sqlx::PgPool) {
    let platform = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/ugcPosts"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": "urn:li:share:5"})),
        )
        .mount(&platform)
        .await;

    let post = postpilot_db::create_post(
        &pool,
        &postpilot_core::NewPost::new("Due content", vec!["ai".to_string()], None).unwrap(),
    )
    .await
    .unwrap();
    schedule_post(&pool, post.id, Utc::now() - Duration::minutes(1)).await.unwrap();

    let outcome = publish_due_posts(&pool, &linkedin_client(&platform.uri()))
        .await
        .expect("scan");
    assert_eq!(outcome.published, 1);
    assert_eq!(outcome.failed, 0);

    let row = postpilot_db::get_post(&pool, post.id).await.unwrap();
    assert_eq!(row.status, "posted");
    assert_eq!(row.linkedin_post_id.as_deref(), Some("urn:li:share:5"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn publish_failure_marks_post_failed_and_logs_error(pool: sqlx::PgPool) {
    let platform = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/ugcPosts"))
        .respond_with(ResponseTemplate::new(401).set_body_string("expired token"))
        .mount(&platform)
        .await;

    let post = postpilot_db::create_post(
        &pool,
        &postpilot_core::NewPost::new("Doomed content", vec![], None).unwrap(),
    )
    .await
    .unwrap();
    schedule_post(&pool, post.id, Utc::now() - Duration::minutes(1)).await.unwrap();

    let outcome = publish_due_posts(&pool, &linkedin_client(&platform.uri()))
        .await
        .expect("scan");
    assert_eq!(outcome.published, 0);
    assert_eq!(outcome.failed, 1);

    let row = postpilot_db::get_post(&pool, post.id).await.unwrap();
    assert_eq!(row.status, "failed");

    let activities = list_activities(&pool, Some("publisher"), None, 10).await.unwrap();
    assert_eq!(activities.len(), 1);
    assert_eq!(activities[0].status, "error");
    assert!(activities[0]
        .error_message
        .as_deref()
        .unwrap_or_default()
        .contains("401"));
}

// ---------------------------------------------------------------------------
// Engagement
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn engagement_job_flags_negative_and_questioning_comments(pool: sqlx::PgPool) {
    create_comment(
        &pool,
        &NewComment::new("c-1", None, "Ada", None, "This rollout was terrible for us").unwrap(),
    )
    .await
    .unwrap();
    create_comment(
        &pool,
        &NewComment::new("c-2", None, "Grace", None, "How does this scale?").unwrap(),
    )
    .await
    .unwrap();
    create_comment(
        &pool,
        &NewComment::new("c-3", None, "Alan", None, "Nice write-up, thanks").unwrap(),
    )
    .await
    .unwrap();

    let outcome = process_pending_comments(&pool, &FakeLlm, 50).await.expect("sweep");
    assert_eq!(outcome.processed, 3);
    assert_eq!(outcome.flagged, 2);

    let flagged = postpilot_db::list_comments(&pool, Some(true), 10).await.unwrap();
    assert_eq!(flagged.len(), 2);
    assert!(flagged.iter().all(|c| c.processed_at.is_some()));
    assert!(flagged.iter().all(|c| c.response_generated.is_some()));
    assert!(flagged.iter().all(|c| !c.response_posted));

    let calm = postpilot_db::list_comments(&pool, Some(false), 10).await.unwrap();
    assert_eq!(calm.len(), 1);
    assert_eq!(calm[0].sentiment_label.as_deref(), Some("neutral"));
}
