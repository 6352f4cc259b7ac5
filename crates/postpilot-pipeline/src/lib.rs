//! Trend-to-post pipeline orchestration.
//!
//! One run walks five stages in order (collect, filter, generate, review,
//! schedule) over an explicit [`RunContext`]. Every stage writes exactly
//! one activity row; a stage failure records an `error` row and stops the
//! run, keeping whatever earlier stages already committed. Re-running is
//! safe: collect merges topics by normalized name, and schedule only
//! touches drafts.

mod context;
mod engagement;
mod error;
mod prompts;
mod publish;
mod stages;

use std::time::Instant;

use postpilot_core::{GenerationRequest, NewsSource, PipelineConfig};
use postpilot_db::{record_activity, NewActivity, PostRow};
use postpilot_llm::LanguageModel;
use postpilot_news::NewsClient;
use sqlx::PgPool;
use uuid::Uuid;

pub use context::{RunContext, RunReport};
pub use engagement::{process_pending_comments, EngagementOutcome, AGENT_ENGAGEMENT};
pub use error::PipelineError;
pub use publish::{publish_due_posts, PublishOutcome, AGENT_PUBLISHER};

/// Activity-log agent name used by pipeline stages.
pub const AGENT_PIPELINE: &str = "pipeline";

/// The orchestrator. Generic over the language model so tests can inject a
/// fake; production holds an `LlmClient`.
pub struct Pipeline<L> {
    pub(crate) pool: PgPool,
    pub(crate) llm: L,
    pub(crate) news: NewsClient,
    pub(crate) sources: Vec<NewsSource>,
    pub(crate) config: PipelineConfig,
    pub(crate) lookback_hours: i64,
}

impl<L: LanguageModel> Pipeline<L> {
    #[must_use]
    pub fn new(
        pool: PgPool,
        llm: L,
        news: NewsClient,
        sources: Vec<NewsSource>,
        config: PipelineConfig,
        lookback_hours: i64,
    ) -> Self {
        Self {
            pool,
            llm,
            news,
            sources,
            config,
            lookback_hours,
        }
    }

    /// Run all five stages to completion or first unrecoverable failure.
    ///
    /// Never returns an error: failures are recorded on the activity log
    /// and reflected in the returned [`RunReport`].
    pub async fn run(&self) -> RunReport {
        let run_id = Uuid::new_v4();
        let run_started = Instant::now();
        let mut ctx = RunContext::new(run_id);
        tracing::info!(%run_id, "pipeline run starting");

        let started = Instant::now();
        let collect = self.collect(&mut ctx).await;
        if !self.finish_stage(&mut ctx, "collect", started, collect).await {
            return self.finish_run(ctx, false, run_started).await;
        }

        let started = Instant::now();
        let filter = self.filter(&mut ctx).await;
        if !self.finish_stage(&mut ctx, "filter", started, filter).await {
            return self.finish_run(ctx, false, run_started).await;
        }

        let started = Instant::now();
        let generate = self.generate(&mut ctx).await;
        if !self.finish_stage(&mut ctx, "generate", started, generate).await {
            return self.finish_run(ctx, false, run_started).await;
        }

        let started = Instant::now();
        let review = self.review(&mut ctx).await;
        if !self.finish_stage(&mut ctx, "review", started, review).await {
            return self.finish_run(ctx, false, run_started).await;
        }

        let started = Instant::now();
        let schedule = self.schedule(&mut ctx).await;
        if !self.finish_stage(&mut ctx, "schedule", started, schedule).await {
            return self.finish_run(ctx, false, run_started).await;
        }

        self.finish_run(ctx, true, run_started).await
    }

    /// Draft one post on demand, outside a scheduled run.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Validation`] before any side effect when the
    /// request is malformed, or the collaborator error that stopped
    /// generation.
    pub async fn generate_for_request(
        &self,
        request: &GenerationRequest,
    ) -> Result<PostRow, PipelineError> {
        request.validate()?;

        let started = Instant::now();
        let tone = request.tone.unwrap_or(self.config.default_tone);

        let outcome = match request.trend_topic_id {
            Some(id) => {
                let topic = postpilot_db::get_trend_topic(&self.pool, id).await?;
                self.draft_post(
                    &topic.topic,
                    &topic.hashtags.0,
                    Some(topic.id),
                    Some(topic.relevance_score),
                    tone,
                    request.include_hashtags,
                )
                .await
            }
            None => {
                let custom = request.custom_topic.as_deref().unwrap_or_default().trim();
                self.draft_post(custom, &[], None, None, tone, request.include_hashtags)
                    .await
            }
        };

        let elapsed = started.elapsed().as_secs_f64();
        match &outcome {
            Ok(post) => {
                log_activity(
                    &self.pool,
                    &NewActivity::success(
                        AGENT_PIPELINE,
                        "generate_on_demand",
                        serde_json::json!({ "post_id": post.id, "tone": tone.to_string() }),
                        elapsed,
                    ),
                )
                .await;
            }
            Err(e) => {
                log_activity(
                    &self.pool,
                    &NewActivity::error(AGENT_PIPELINE, "generate_on_demand", &e.to_string(), elapsed),
                )
                .await;
            }
        }

        outcome
    }

    /// Run one engagement sweep with this pipeline's model and pool.
    ///
    /// # Errors
    ///
    /// See [`process_pending_comments`].
    pub async fn process_comments(&self, limit: i64) -> Result<EngagementOutcome, PipelineError> {
        process_pending_comments(&self.pool, &self.llm, limit).await
    }

    /// Record the stage's activity row; returns whether the run continues.
    async fn finish_stage(
        &self,
        ctx: &mut RunContext,
        stage: &'static str,
        started: Instant,
        result: Result<serde_json::Value, PipelineError>,
    ) -> bool {
        let elapsed = started.elapsed().as_secs_f64();
        match result {
            Ok(mut details) => {
                if let Some(map) = details.as_object_mut() {
                    map.insert("run_id".to_string(), serde_json::json!(ctx.run_id));
                }
                tracing::info!(run_id = %ctx.run_id, stage, elapsed, "stage complete");
                log_activity(
                    &self.pool,
                    &NewActivity::success(AGENT_PIPELINE, stage, details, elapsed),
                )
                .await;
                true
            }
            Err(e) => {
                tracing::error!(run_id = %ctx.run_id, stage, error = %e, "stage failed");
                ctx.errors.push(format!("{stage}: {e}"));
                log_activity(
                    &self.pool,
                    &NewActivity::error(AGENT_PIPELINE, stage, &e.to_string(), elapsed),
                )
                .await;
                false
            }
        }
    }

    /// Record the run-summary activity row and collapse the context.
    async fn finish_run(&self, ctx: RunContext, success: bool, run_started: Instant) -> RunReport {
        let report = ctx.into_report(success);
        let details = serde_json::to_value(&report).unwrap_or_else(|_| serde_json::json!({}));
        let elapsed = run_started.elapsed().as_secs_f64();

        let activity = if success {
            NewActivity::success(AGENT_PIPELINE, "run", details, elapsed)
        } else {
            NewActivity {
                agent_name: AGENT_PIPELINE.to_string(),
                activity_type: "run".to_string(),
                status: "error".to_string(),
                details,
                error_message: report.errors.last().cloned(),
                execution_time: Some(elapsed),
            }
        };
        log_activity(&self.pool, &activity).await;

        tracing::info!(
            run_id = %report.run_id,
            success = report.success,
            trends = report.trends_found,
            drafts = report.posts_generated,
            scheduled = report.posts_scheduled,
            "pipeline run finished"
        );
        report
    }
}

/// Best-effort activity insert; a logging failure must never fail the work
/// being logged.
pub(crate) async fn log_activity(pool: &PgPool, activity: &NewActivity) {
    if let Err(e) = record_activity(pool, activity).await {
        tracing::warn!(error = %e, activity = %activity.activity_type, "failed to record activity");
    }
}
