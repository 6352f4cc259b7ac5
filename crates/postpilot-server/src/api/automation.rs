//! Automation lifecycle and metrics routes.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use serde::Serialize;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

/// Pipeline run summaries surfaced on status/metrics.
const RECENT_RUNS: usize = 5;

#[derive(Debug, Serialize)]
pub struct StatusData {
    automation: crate::automation::AutomationStatus,
    recent_runs: Vec<postpilot_db::ActivityRow>,
}

#[derive(Debug, Serialize)]
pub struct MetricsData {
    counts: postpilot_db::DashboardCounts,
    engagement: postpilot_db::EngagementTotals,
    recent_runs: Vec<postpilot_db::ActivityRow>,
}

pub async fn start_automation(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.automation.start().await.map_err(|e| {
        tracing::error!(error = %e, "failed to start automation");
        ApiError::new(req_id.0.clone(), "internal_error", "failed to start automation")
    })?;

    Ok(Json(ApiResponse {
        data: outcome,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub async fn stop_automation(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.automation.stop().await.map_err(|e| {
        tracing::error!(error = %e, "failed to stop automation");
        ApiError::new(req_id.0.clone(), "internal_error", "failed to stop automation")
    })?;

    Ok(Json(ApiResponse {
        data: outcome,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub async fn run_now(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.automation.run_now().await;

    if !outcome.started {
        return Err(ApiError::new(req_id.0, "conflict", outcome.message));
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse {
            data: outcome,
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

pub async fn automation_status(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<impl IntoResponse, ApiError> {
    let automation = state.automation.status().await;
    let recent_runs = recent_run_activities(&state).await.map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: StatusData {
            automation,
            recent_runs,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub async fn automation_metrics(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<impl IntoResponse, ApiError> {
    let counts = postpilot_db::dashboard_counts(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let engagement = postpilot_db::engagement_totals(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let recent_runs = recent_run_activities(&state).await.map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: MetricsData {
            counts,
            engagement,
            recent_runs,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// The latest whole-run summary rows from the activity log.
async fn recent_run_activities(
    state: &AppState,
) -> Result<Vec<postpilot_db::ActivityRow>, postpilot_db::DbError> {
    let rows = postpilot_db::list_activities(
        &state.pool,
        Some(postpilot_pipeline::AGENT_PIPELINE),
        None,
        100,
    )
    .await?;

    Ok(rows
        .into_iter()
        .filter(|a| a.activity_type == "run")
        .take(RECENT_RUNS)
        .collect())
}
