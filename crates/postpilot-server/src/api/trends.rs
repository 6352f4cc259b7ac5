//! Trend-topic routes.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use postpilot_core::NewTrendTopic;
use serde::Deserialize;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

#[derive(Debug, Deserialize)]
pub struct ListTrendsQuery {
    pub limit: Option<i64>,
    pub active_only: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTrendRequest {
    pub topic: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub relevance_score: f64,
    pub source: String,
}

pub async fn list_trends(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ListTrendsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = postpilot_db::list_trend_topics(
        &state.pool,
        query.active_only.unwrap_or(true),
        normalize_limit(query.limit),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub async fn create_trend(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(request): Json<CreateTrendRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let topic = NewTrendTopic::new(
        request.topic,
        request.hashtags,
        request.relevance_score,
        request.source,
    )
    .map_err(|e| ApiError::validation(req_id.0.clone(), &e))?;

    let row = postpilot_db::upsert_trend_topic(&state.pool, &topic)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: row,
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}
