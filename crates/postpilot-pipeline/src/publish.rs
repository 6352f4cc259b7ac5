//! The due-post publishing scan: hand scheduled posts whose slot has
//! arrived to the platform client, and move each to `posted` or `failed`.

use std::time::Instant;

use chrono::Utc;
use postpilot_db::{list_due_posts, mark_post_failed, mark_post_posted, NewActivity};
use postpilot_linkedin::LinkedinClient;
use serde::Serialize;
use sqlx::PgPool;

use crate::error::PipelineError;
use crate::log_activity;

/// Activity-log agent name used by the publishing scan.
pub const AGENT_PUBLISHER: &str = "publisher";

#[derive(Debug, Default, Clone, Serialize)]
pub struct PublishOutcome {
    pub published: usize,
    pub failed: usize,
}

/// Publish every due post. One activity row is written per attempt; a
/// failed share moves the post to `failed` terminally and records the
/// error message on the log.
///
/// # Errors
///
/// Returns [`PipelineError::Db`] if the due-post scan or a status update
/// fails; individual share failures do not abort the scan.
pub async fn publish_due_posts(
    pool: &PgPool,
    publisher: &LinkedinClient,
) -> Result<PublishOutcome, PipelineError> {
    let due = list_due_posts(pool, Utc::now()).await?;
    let mut outcome = PublishOutcome::default();

    for post in due {
        let started = Instant::now();
        match publisher.share_post(&post.content, &post.hashtags.0).await {
            Ok(platform_id) => {
                mark_post_posted(pool, post.id, &platform_id).await?;
                log_activity(
                    pool,
                    &NewActivity::success(
                        AGENT_PUBLISHER,
                        "publish_post",
                        serde_json::json!({
                            "post_id": post.id,
                            "linkedin_post_id": platform_id,
                        }),
                        started.elapsed().as_secs_f64(),
                    ),
                )
                .await;
                outcome.published += 1;
            }
            Err(e) => {
                tracing::error!(post = post.id, error = %e, "publish failed");
                mark_post_failed(pool, post.id).await?;
                log_activity(
                    pool,
                    &NewActivity::error(
                        AGENT_PUBLISHER,
                        "publish_post",
                        &e.to_string(),
                        started.elapsed().as_secs_f64(),
                    ),
                )
                .await;
                outcome.failed += 1;
            }
        }
    }

    if outcome.published > 0 || outcome.failed > 0 {
        tracing::info!(
            published = outcome.published,
            failed = outcome.failed,
            "publish scan complete"
        );
    }

    Ok(outcome)
}
