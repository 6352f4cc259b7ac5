//! Comment routes.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use postpilot_core::NewComment;
use serde::Deserialize;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

#[derive(Debug, Deserialize)]
pub struct ListCommentsQuery {
    pub requires_response: Option<bool>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub linkedin_comment_id: String,
    pub post_id: Option<i64>,
    pub author_name: String,
    pub author_linkedin_id: Option<String>,
    pub content: String,
}

pub async fn list_comments(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ListCommentsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = postpilot_db::list_comments(
        &state.pool,
        query.requires_response,
        normalize_limit(query.limit),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub async fn create_comment(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(request): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let comment = NewComment::new(
        request.linkedin_comment_id,
        request.post_id,
        request.author_name,
        request.author_linkedin_id,
        request.content,
    )
    .map_err(|e| ApiError::validation(req_id.0.clone(), &e))?;

    let row = postpilot_db::create_comment(&state.pool, &comment)
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
