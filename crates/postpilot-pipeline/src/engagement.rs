//! Comment-sentiment processing: the engagement job's body.
//!
//! Unprocessed comments get a sentiment score and label; negative or
//! questioning comments are flagged for response and a reply is drafted
//! (never auto-posted). A failed sentiment call leaves the comment
//! unprocessed so the next sweep retries it.

use std::time::Instant;

use postpilot_db::{list_unprocessed_comments, set_comment_analysis, NewActivity};
use postpilot_llm::LanguageModel;
use serde::Serialize;
use sqlx::PgPool;

use crate::error::PipelineError;
use crate::{log_activity, prompts};

/// Activity-log agent name used by the engagement job.
pub const AGENT_ENGAGEMENT: &str = "engagement";

#[derive(Debug, Default, Clone, Serialize)]
pub struct EngagementOutcome {
    pub processed: usize,
    pub flagged: usize,
}

/// Process up to `limit` pending comments.
///
/// # Errors
///
/// Returns [`PipelineError::Db`] if listing or updating comments fails;
/// per-comment model failures are logged and skipped.
pub async fn process_pending_comments<L: LanguageModel>(
    pool: &PgPool,
    llm: &L,
    limit: i64,
) -> Result<EngagementOutcome, PipelineError> {
    let pending = list_unprocessed_comments(pool, limit).await?;
    if pending.is_empty() {
        return Ok(EngagementOutcome::default());
    }

    let started = Instant::now();
    let mut outcome = EngagementOutcome::default();

    for comment in pending {
        let analysis = match llm.analyze_sentiment(&comment.content).await {
            Ok(a) => a,
            Err(e) => {
                tracing::warn!(comment = comment.id, error = %e, "sentiment analysis failed");
                continue;
            }
        };

        let requires_response =
            analysis.sentiment_label == "negative" || comment.content.contains('?');

        let reply = if requires_response {
            match llm
                .generate_text(
                    &prompts::reply_prompt(&comment.author_name, &comment.content),
                    Some(prompts::REPLY_SYSTEM_PROMPT),
                    None,
                )
                .await
            {
                Ok(text) => Some(text),
                Err(e) => {
                    tracing::warn!(comment = comment.id, error = %e, "reply draft failed");
                    None
                }
            }
        } else {
            None
        };

        set_comment_analysis(
            pool,
            comment.id,
            analysis.sentiment_score,
            &analysis.sentiment_label,
            requires_response,
            reply.as_deref(),
        )
        .await?;

        outcome.processed += 1;
        if requires_response {
            outcome.flagged += 1;
        }
    }

    if outcome.processed > 0 {
        log_activity(
            pool,
            &NewActivity::success(
                AGENT_ENGAGEMENT,
                "process_comments",
                serde_json::json!({
                    "processed": outcome.processed,
                    "flagged": outcome.flagged,
                }),
                started.elapsed().as_secs_f64(),
            ),
        )
        .await;
    }

    Ok(outcome)
}
