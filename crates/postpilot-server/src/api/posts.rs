//! Post routes, including per-post engagement snapshots.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use postpilot_core::{NewEngagementMetric, NewPost, ValidationError};
use serde::Deserialize;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

const POST_STATUSES: &[&str] = &["draft", "scheduled", "posted", "failed"];

#[derive(Debug, Deserialize)]
pub struct ListPostsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub content: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
    pub trend_topic_id: Option<i64>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct MetricsQuery {
    pub limit: Option<i64>,
}

pub async fn list_posts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ListPostsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(status) = &query.status {
        if !POST_STATUSES.contains(&status.as_str()) {
            let error = ValidationError::new(
                "status",
                format!("must be one of draft, scheduled, posted, failed; got '{status}'"),
            );
            return Err(ApiError::validation(req_id.0, &error));
        }
    }

    let rows = postpilot_db::list_posts(
        &state.pool,
        query.status.as_deref(),
        normalize_limit(query.limit),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub async fn create_post(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(request): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let new_post = NewPost::new(request.content, request.hashtags, request.trend_topic_id)
        .map_err(|e| ApiError::validation(req_id.0.clone(), &e))?;

    if let Some(scheduled_at) = request.scheduled_at {
        if scheduled_at <= Utc::now() {
            let error = ValidationError::new("scheduled_at", "must be in the future");
            return Err(ApiError::validation(req_id.0, &error));
        }
    }

    let row = postpilot_db::create_post(&state.pool, &new_post)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    // An explicit slot on creation moves the draft straight to scheduled.
    let row = if let Some(scheduled_at) = request.scheduled_at {
        postpilot_db::schedule_post(&state.pool, row.id, scheduled_at)
            .await
            .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
        postpilot_db::get_post(&state.pool, row.id)
            .await
            .map_err(|e| map_db_error(req_id.0.clone(), &e))?
    } else {
        row
    };

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: row,
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

pub async fn get_post(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let row = postpilot_db::get_post(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: row,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub async fn list_post_metrics(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Query(query): Query<MetricsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    // 404 for an unknown post rather than an empty series.
    postpilot_db::get_post(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let rows =
        postpilot_db::list_engagement_for_post(&state.pool, id, normalize_limit(query.limit))
            .await
            .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub async fn record_post_metric(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(metric): Json<NewEngagementMetric>,
) -> Result<impl IntoResponse, ApiError> {
    metric
        .validate()
        .map_err(|e| ApiError::validation(req_id.0.clone(), &e))?;

    postpilot_db::get_post(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let row = postpilot_db::insert_engagement_metric(&state.pool, id, &metric)
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
