//! News-article routes.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use postpilot_core::NewNewsArticle;
use serde::Deserialize;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

#[derive(Debug, Deserialize)]
pub struct ListArticlesQuery {
    pub unprocessed_only: Option<bool>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateArticleRequest {
    pub title: String,
    pub url: String,
    pub summary: Option<String>,
    pub author: Option<String>,
    pub source: String,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub relevance_score: f64,
}

pub async fn list_articles(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ListArticlesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = postpilot_db::list_news_articles(
        &state.pool,
        query.unprocessed_only.unwrap_or(false),
        normalize_limit(query.limit),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub async fn create_article(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(request): Json<CreateArticleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let article = NewNewsArticle::new(
        request.title,
        request.url,
        request.summary,
        request.author,
        request.source,
        request.published_at,
        request.keywords,
        request.relevance_score,
    )
    .map_err(|e| ApiError::validation(req_id.0.clone(), &e))?;

    let row = postpilot_db::insert_article_if_new(&state.pool, &article)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    match row {
        Some(row) => Ok((
            StatusCode::CREATED,
            Json(ApiResponse {
                data: row,
                meta: ResponseMeta::new(req_id.0),
            }),
        )),
        None => Err(ApiError::new(
            req_id.0,
            "conflict",
            "an article with this URL already exists",
        )),
    }
}
