mod analytics;
mod automation;
mod comments;
mod content;
mod news_articles;
mod posts;
mod trends;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use postpilot_core::ValidationError;
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::automation::{AppPipeline, Automation};
use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub automation: Arc<Automation>,
    pub pipeline: Arc<AppPipeline>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
    scheduler: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
                field: None,
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }

    /// A 400 with the offending field named.
    pub fn validation(request_id: impl Into<String>, error: &ValidationError) -> Self {
        Self {
            error: ErrorBody {
                code: "validation_error".to_string(),
                message: error.reason.clone(),
                field: Some(error.field.to_string()),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "external_service_error" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn normalize_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(50).clamp(1, 200)
}

pub(super) fn map_db_error(request_id: String, error: &postpilot_db::DbError) -> ApiError {
    if matches!(error, postpilot_db::DbError::NotFound) {
        return ApiError::new(request_id, "not_found", "record not found");
    }
    if error.is_unique_violation() {
        return ApiError::new(request_id, "conflict", "a record with this unique field already exists");
    }
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/automation/start",
            post(automation::start_automation),
        )
        .route("/api/v1/automation/stop", post(automation::stop_automation))
        .route("/api/v1/automation/run-now", post(automation::run_now))
        .route("/api/v1/automation/status", get(automation::automation_status))
        .route(
            "/api/v1/automation/metrics",
            get(automation::automation_metrics),
        )
        .route(
            "/api/v1/trends",
            get(trends::list_trends).post(trends::create_trend),
        )
        .route(
            "/api/v1/posts",
            get(posts::list_posts).post(posts::create_post),
        )
        .route("/api/v1/posts/{id}", get(posts::get_post))
        .route(
            "/api/v1/posts/{id}/metrics",
            get(posts::list_post_metrics).post(posts::record_post_metric),
        )
        .route(
            "/api/v1/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route(
            "/api/v1/news-articles",
            get(news_articles::list_articles).post(news_articles::create_article),
        )
        .route("/api/v1/content/generate", post(content::generate_content))
        .route("/api/v1/analytics/dashboard", get(analytics::dashboard))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

/// Liveness: healthy only when both the database and the scheduler respond.
async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    let database_ok = match postpilot_db::health_check(&state.pool).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            false
        }
    };
    let scheduler_ok = state.automation.scheduler_reachable().await;

    let healthy = database_ok && scheduler_ok;
    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(ApiResponse {
            data: HealthData {
                status: if healthy { "ok" } else { "degraded" },
                database: if database_ok { "ok" } else { "unavailable" },
                scheduler: if scheduler_ok { "ok" } else { "unavailable" },
            },
            meta,
        }),
    )
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use postpilot_core::{FeedConfig, LlmConfig, PipelineConfig, Tone};
    use postpilot_llm::LlmClient;
    use postpilot_news::NewsClient;
    use postpilot_pipeline::Pipeline;
    use tower::ServiceExt;

    fn test_pipeline_config() -> PipelineConfig {
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

    fn test_state(pool: sqlx::PgPool) -> AppState {
        let llm = LlmClient::new(&LlmConfig {
            api_key: "test".to_string(),
            base_url: "http://llm.invalid".to_string(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 256,
            temperature: 0.7,
            request_timeout_secs: 5,
            max_retries: 0,
            retry_backoff_base_ms: 0,
        })
        .expect("llm client");
        let news = NewsClient::new(&FeedConfig {
            request_timeout_secs: 5,
            user_agent: "test".to_string(),
            lookback_hours: 24,
        })
        .expect("news client");

        let pipeline = Arc::new(Pipeline::new(
            pool.clone(),
            llm,
            news,
            vec![],
            test_pipeline_config(),
            24,
        ));
        let automation = Arc::new(Automation::new(
            Arc::clone(&pipeline),
            pool.clone(),
            None,
            test_pipeline_config(),
        ));

        AppState {
            pool,
            automation,
            pipeline,
        }
    }

    fn test_app(pool: sqlx::PgPool) -> Router {
        let auth = AuthState::from_env(true).expect("auth");
        build_app(test_state(pool), auth, default_rate_limit_state())
    }

    #[test]
    fn normalize_limit_applies_defaults_and_bounds() {
        assert_eq!(normalize_limit(None), 50);
        assert_eq!(normalize_limit(Some(0)), 1);
        assert_eq!(normalize_limit(Some(1_000)), 200);
        assert_eq!(normalize_limit(Some(25)), 25);
    }

    #[test]
    fn api_error_validation_error_maps_to_bad_request() {
        let response = ApiError::new("req-1", "validation_error", "invalid input").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn api_error_conflict_maps_to_409() {
        let response = ApiError::new("req-1", "conflict", "duplicate").into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn api_error_external_service_maps_to_bad_gateway() {
        let response = ApiError::new("req-1", "external_service_error", "llm down").into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn validation_error_carries_field_name() {
        let error = ValidationError::new("hashtags", "at most 5 hashtags allowed");
        let api_error = ApiError::validation("req-1", &error);
        let json = serde_json::to_value(&api_error).expect("serialize");
        assert_eq!(json["error"]["field"], "hashtags");
        assert_eq!(json["error"]["code"], "validation_error");
    }

    // -----------------------------------------------------------------------
    // Route integration tests (with DB)
    // -----------------------------------------------------------------------

    #[sqlx::test(migrations = "../../migrations")]
    async fn health_reports_ok_with_live_db_and_stopped_scheduler(pool: sqlx::PgPool) {
        let app = test_app(pool);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(json["data"]["status"], "ok");
        assert_eq!(json["data"]["database"], "ok");
        assert_eq!(json["data"]["scheduler"], "ok");
        assert!(json["meta"]["request_id"].is_string());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn trends_roundtrip_create_then_list(pool: sqlx::PgPool) {
        let app = test_app(pool);

        let create = Request::builder()
            .method("POST")
            .uri("/api/v1/trends")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({
                    "topic": "AI agents",
                    "hashtags": ["ai"],
                    "relevance_score": 0.8,
                    "source": "techcrunch"
                })
                .to_string(),
            ))
            .expect("request");
        let response = app.clone().oneshot(create).await.expect("response");
        assert_eq!(response.status(), StatusCode::CREATED);

        let list = Request::builder()
            .uri("/api/v1/trends")
            .body(Body::empty())
            .expect("request");
        let response = app.oneshot(list).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json");
        let data = json["data"].as_array().expect("data array");
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["topic"], "AI agents");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn create_trend_rejects_out_of_range_score(pool: sqlx::PgPool) {
        let app = test_app(pool);

        let create = Request::builder()
            .method("POST")
            .uri("/api/v1/trends")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({
                    "topic": "AI agents",
                    "relevance_score": 1.4,
                    "source": "techcrunch"
                })
                .to_string(),
            ))
            .expect("request");
        let response = app.oneshot(create).await.expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(json["error"]["code"], "validation_error");
        assert_eq!(json["error"]["field"], "relevance_score");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn create_post_rejects_six_hashtags(pool: sqlx::PgPool) {
        let app = test_app(pool);

        let create = Request::builder()
            .method("POST")
            .uri("/api/v1/posts")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({
                    "content": "A perfectly fine post body",
                    "hashtags": ["a", "b", "c", "d", "e", "f"]
                })
                .to_string(),
            ))
            .expect("request");
        let response = app.oneshot(create).await.expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(json["error"]["field"], "hashtags");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn get_post_returns_404_for_unknown_id(pool: sqlx::PgPool) {
        let app = test_app(pool);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/posts/4242")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn duplicate_comment_id_is_a_conflict(pool: sqlx::PgPool) {
        let app = test_app(pool);

        let body = serde_json::json!({
            "linkedin_comment_id": "urn:li:comment:1",
            "author_name": "Ada",
            "content": "Interesting take"
        })
        .to_string();

        let first = Request::builder()
            .method("POST")
            .uri("/api/v1/comments")
            .header("content-type", "application/json")
            .body(Body::from(body.clone()))
            .expect("request");
        assert_eq!(
            app.clone().oneshot(first).await.expect("response").status(),
            StatusCode::CREATED
        );

        let second = Request::builder()
            .method("POST")
            .uri("/api/v1/comments")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .expect("request");
        assert_eq!(
            app.oneshot(second).await.expect("response").status(),
            StatusCode::CONFLICT
        );
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn automation_status_reports_stopped_by_default(pool: sqlx::PgPool) {
        let app = test_app(pool);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/automation/status")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(json["data"]["automation"]["state"], "stopped");
        assert_eq!(json["data"]["automation"]["run_in_flight"], false);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn generate_content_rejects_both_topic_inputs(pool: sqlx::PgPool) {
        let app = test_app(pool);

        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/content/generate")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({
                    "trend_topic_id": 1,
                    "custom_topic": "Rust"
                })
                .to_string(),
            ))
            .expect("request");
        let response = app.oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(json["error"]["code"], "validation_error");
        assert_eq!(json["error"]["field"], "topic");
    }
}
