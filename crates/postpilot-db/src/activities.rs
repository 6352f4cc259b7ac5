//! Database operations for `agent_activities`, the append-only audit log.
//!
//! There are deliberately no update or delete operations in this module;
//! an activity row is immutable once written.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::DbError;

/// A new audit-log entry. `details` is free-form JSON; keep it small.
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub agent_name: String,
    pub activity_type: String,
    pub status: String,
    pub details: serde_json::Value,
    pub error_message: Option<String>,
    pub execution_time: Option<f64>,
}

impl NewActivity {
    #[must_use]
    pub fn success(
        agent_name: &str,
        activity_type: &str,
        details: serde_json::Value,
        execution_time: f64,
    ) -> Self {
        Self {
            agent_name: agent_name.to_string(),
            activity_type: activity_type.to_string(),
            status: "success".to_string(),
            details,
            error_message: None,
            execution_time: Some(execution_time),
        }
    }

    #[must_use]
    pub fn error(
        agent_name: &str,
        activity_type: &str,
        error_message: &str,
        execution_time: f64,
    ) -> Self {
        Self {
            agent_name: agent_name.to_string(),
            activity_type: activity_type.to_string(),
            status: "error".to_string(),
            details: serde_json::json!({}),
            error_message: Some(error_message.to_string()),
            execution_time: Some(execution_time),
        }
    }
}

/// A row from the `agent_activities` table.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ActivityRow {
    pub id: i64,
    pub agent_name: String,
    pub activity_type: String,
    pub status: String,
    pub details: Json<serde_json::Value>,
    pub error_message: Option<String>,
    pub execution_time: Option<f64>,
    pub executed_at: DateTime<Utc>,
}

const ACTIVITY_COLUMNS: &str = "id, agent_name, activity_type, status, details, error_message, \
                                execution_time, executed_at";

/// Append one activity row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn record_activity(pool: &PgPool, activity: &NewActivity) -> Result<ActivityRow, DbError> {
    let row = sqlx::query_as::<_, ActivityRow>(&format!(
        "INSERT INTO agent_activities \
             (agent_name, activity_type, status, details, error_message, execution_time) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING {ACTIVITY_COLUMNS}"
    ))
    .bind(&activity.agent_name)
    .bind(&activity.activity_type)
    .bind(&activity.status)
    .bind(Json(&activity.details))
    .bind(&activity.error_message)
    .bind(activity.execution_time)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// List activities newest first, optionally restricted to one agent and/or
/// a lower time bound.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_activities(
    pool: &PgPool,
    agent_name: Option<&str>,
    since: Option<DateTime<Utc>>,
    limit: i64,
) -> Result<Vec<ActivityRow>, DbError> {
    let rows = sqlx::query_as::<_, ActivityRow>(&format!(
        "SELECT {ACTIVITY_COLUMNS} FROM agent_activities \
         WHERE ($1::text IS NULL OR agent_name = $1) \
           AND ($2::timestamptz IS NULL OR executed_at >= $2) \
         ORDER BY executed_at DESC, id DESC \
         LIMIT $3"
    ))
    .bind(agent_name)
    .bind(since)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_constructor_fills_status_and_time() {
        let activity =
            NewActivity::success("pipeline", "collect", serde_json::json!({"topics": 3}), 1.25);
        assert_eq!(activity.status, "success");
        assert_eq!(activity.error_message, None);
        assert!((activity.execution_time.unwrap() - 1.25).abs() < f64::EPSILON);
    }

    #[test]
    fn error_constructor_records_message() {
        let activity = NewActivity::error("pipeline", "generate", "llm unavailable", 0.5);
        assert_eq!(activity.status, "error");
        assert_eq!(activity.error_message.as_deref(), Some("llm unavailable"));
    }
}
