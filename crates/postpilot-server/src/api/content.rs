//! On-demand content generation.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use postpilot_core::GenerationRequest;
use postpilot_pipeline::PipelineError;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

pub async fn generate_content(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(request): Json<GenerationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state
        .pipeline
        .generate_for_request(&request)
        .await
        .map_err(|e| map_pipeline_error(req_id.0.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: post,
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

fn map_pipeline_error(request_id: String, error: &PipelineError) -> ApiError {
    match error {
        PipelineError::Validation(e) => ApiError::validation(request_id, e),
        PipelineError::Db(e) => map_db_error(request_id, e),
        PipelineError::Llm(e) => {
            tracing::error!(error = %e, "content generation failed at the language model");
            ApiError::new(
                request_id,
                "external_service_error",
                "language model request failed",
            )
        }
        other => {
            tracing::error!(error = %other, "content generation failed");
            ApiError::new(request_id, "internal_error", "content generation failed")
        }
    }
}
