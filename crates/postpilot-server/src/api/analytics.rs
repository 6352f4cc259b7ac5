//! Dashboard aggregation route.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    /// Lower bound for the recent-activity listing.
    pub since: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct DashboardData {
    counts: postpilot_db::DashboardCounts,
    engagement: postpilot_db::EngagementTotals,
    recent_activity: Vec<postpilot_db::ActivityRow>,
}

pub async fn dashboard(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<DashboardQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let counts = postpilot_db::dashboard_counts(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let engagement = postpilot_db::engagement_totals(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let recent_activity = postpilot_db::list_activities(
        &state.pool,
        None,
        query.since,
        normalize_limit(query.limit),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: DashboardData {
            counts,
            engagement,
            recent_activity,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
