//! The automation lifecycle object.
//!
//! Owns the background job scheduler and the single-run lock, and is
//! injected into the API layer; there is no process-global running flag.
//! `start`/`stop` are idempotent; `run_now` is fire-and-forget and rejected
//! with an "already running" answer when a run is in flight (the timer job
//! takes the same lock, so a manual run and a timer firing never overlap).

use std::sync::Arc;
use std::time::Duration;

use postpilot_core::PipelineConfig;
use postpilot_linkedin::LinkedinClient;
use postpilot_llm::LlmClient;
use postpilot_pipeline::{publish_due_posts, Pipeline};
use serde::Serialize;
use sqlx::PgPool;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Comments processed per engagement sweep.
const ENGAGEMENT_BATCH: i64 = 50;
const ENGAGEMENT_INTERVAL_SECS: u64 = 3_600;

pub type AppPipeline = Pipeline<LlmClient>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AutomationState {
    Stopped,
    Running,
}

struct AutomationInner {
    state: AutomationState,
    // Must be kept alive while running — dropping it shuts down all jobs.
    scheduler: Option<JobScheduler>,
}

/// Answer to a lifecycle call; `changed` is false for idempotent no-ops.
#[derive(Debug, Clone, Serialize)]
pub struct LifecycleOutcome {
    pub changed: bool,
    pub state: &'static str,
}

/// Answer to a `run_now` call.
#[derive(Debug, Clone, Serialize)]
pub struct RunNowOutcome {
    pub started: bool,
    pub message: &'static str,
}

/// Current automation state for the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct AutomationStatus {
    pub state: &'static str,
    pub run_in_flight: bool,
    pub publisher_configured: bool,
    pub pipeline_interval_secs: u64,
    pub publish_scan_interval_secs: u64,
}

pub struct Automation {
    pipeline: Arc<AppPipeline>,
    pool: PgPool,
    publisher: Option<LinkedinClient>,
    config: PipelineConfig,
    run_lock: Arc<Mutex<()>>,
    inner: Mutex<AutomationInner>,
}

impl Automation {
    #[must_use]
    pub fn new(
        pipeline: Arc<AppPipeline>,
        pool: PgPool,
        publisher: Option<LinkedinClient>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            pipeline,
            pool,
            publisher,
            config,
            run_lock: Arc::new(Mutex::new(())),
            inner: Mutex::new(AutomationInner {
                state: AutomationState::Stopped,
                scheduler: None,
            }),
        }
    }

    /// Start the timers. Idempotent: starting a running automation changes
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns [`JobSchedulerError`] if the scheduler cannot be built,
    /// a job cannot be registered, or the scheduler fails to start.
    pub async fn start(&self) -> Result<LifecycleOutcome, JobSchedulerError> {
        let mut inner = self.inner.lock().await;
        if inner.state == AutomationState::Running {
            return Ok(LifecycleOutcome {
                changed: false,
                state: "running",
            });
        }

        let scheduler = JobScheduler::new().await?;

        self.register_pipeline_job(&scheduler).await?;
        self.register_publish_job(&scheduler).await?;
        self.register_engagement_job(&scheduler).await?;

        scheduler.start().await?;
        inner.scheduler = Some(scheduler);
        inner.state = AutomationState::Running;

        tracing::info!(
            pipeline_interval_secs = self.config.interval_secs,
            publish_scan_interval_secs = self.config.publish_scan_interval_secs,
            "automation started"
        );

        Ok(LifecycleOutcome {
            changed: true,
            state: "running",
        })
    }

    /// Stop the timers. Idempotent; an in-flight pipeline run is not
    /// aborted; only future firings are cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`JobSchedulerError`] if the scheduler refuses to shut down.
    pub async fn stop(&self) -> Result<LifecycleOutcome, JobSchedulerError> {
        let mut inner = self.inner.lock().await;
        if inner.state == AutomationState::Stopped {
            return Ok(LifecycleOutcome {
                changed: false,
                state: "stopped",
            });
        }

        if let Some(mut scheduler) = inner.scheduler.take() {
            scheduler.shutdown().await?;
        }
        inner.state = AutomationState::Stopped;

        tracing::info!("automation stopped");
        Ok(LifecycleOutcome {
            changed: true,
            state: "stopped",
        })
    }

    /// Trigger one pipeline pass outside the timer cadence. Returns
    /// immediately; the outcome lands on the activity log.
    pub async fn run_now(&self) -> RunNowOutcome {
        match Arc::clone(&self.run_lock).try_lock_owned() {
            Ok(guard) => {
                let pipeline = Arc::clone(&self.pipeline);
                tokio::spawn(async move {
                    let _guard = guard;
                    let report = pipeline.run().await;
                    tracing::info!(run_id = %report.run_id, success = report.success, "manual run finished");
                });
                RunNowOutcome {
                    started: true,
                    message: "pipeline run started in background",
                }
            }
            Err(_) => RunNowOutcome {
                started: false,
                message: "a pipeline run is already in progress",
            },
        }
    }

    pub async fn status(&self) -> AutomationStatus {
        let inner = self.inner.lock().await;
        AutomationStatus {
            state: match inner.state {
                AutomationState::Running => "running",
                AutomationState::Stopped => "stopped",
            },
            run_in_flight: self.run_lock.try_lock().is_err(),
            publisher_configured: self.publisher.is_some(),
            pipeline_interval_secs: self.config.interval_secs,
            publish_scan_interval_secs: self.config.publish_scan_interval_secs,
        }
    }

    /// True when the scheduler side of the health check is fine: either
    /// cleanly stopped, or running with its scheduler handle still alive.
    pub async fn scheduler_reachable(&self) -> bool {
        let inner = self.inner.lock().await;
        match inner.state {
            AutomationState::Stopped => true,
            AutomationState::Running => inner.scheduler.is_some(),
        }
    }

    async fn register_pipeline_job(&self, scheduler: &JobScheduler) -> Result<(), JobSchedulerError> {
        let pipeline = Arc::clone(&self.pipeline);
        let run_lock = Arc::clone(&self.run_lock);
        let interval = Duration::from_secs(self.config.interval_secs.max(1));

        let job = Job::new_repeated_async(interval, move |_uuid, _lock| {
            let pipeline = Arc::clone(&pipeline);
            let run_lock = Arc::clone(&run_lock);

            Box::pin(async move {
                match run_lock.try_lock_owned() {
                    Ok(guard) => {
                        tracing::info!("scheduler: starting pipeline run");
                        let _guard = guard;
                        let report = pipeline.run().await;
                        tracing::info!(
                            run_id = %report.run_id,
                            success = report.success,
                            "scheduler: pipeline run complete"
                        );
                    }
                    Err(_) => {
                        tracing::warn!("scheduler: previous pipeline run still in flight; skipping");
                    }
                }
            })
        })?;

        scheduler.add(job).await?;
        Ok(())
    }

    async fn register_publish_job(&self, scheduler: &JobScheduler) -> Result<(), JobSchedulerError> {
        let Some(publisher) = self.publisher.clone() else {
            tracing::warn!("no publishing credentials configured; due-post scan disabled");
            return Ok(());
        };

        let pool = self.pool.clone();
        let interval = Duration::from_secs(self.config.publish_scan_interval_secs.max(1));

        let job = Job::new_repeated_async(interval, move |_uuid, _lock| {
            let pool = pool.clone();
            let publisher = publisher.clone();

            Box::pin(async move {
                if let Err(e) = publish_due_posts(&pool, &publisher).await {
                    tracing::error!(error = %e, "scheduler: publish scan failed");
                }
            })
        })?;

        scheduler.add(job).await?;
        Ok(())
    }

    async fn register_engagement_job(
        &self,
        scheduler: &JobScheduler,
    ) -> Result<(), JobSchedulerError> {
        let pipeline = Arc::clone(&self.pipeline);
        let interval = Duration::from_secs(ENGAGEMENT_INTERVAL_SECS);

        let job = Job::new_repeated_async(interval, move |_uuid, _lock| {
            let pipeline = Arc::clone(&pipeline);

            Box::pin(async move {
                match pipeline.process_comments(ENGAGEMENT_BATCH).await {
                    Ok(outcome) if outcome.processed > 0 => {
                        tracing::info!(
                            processed = outcome.processed,
                            flagged = outcome.flagged,
                            "scheduler: comments processed"
                        );
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::error!(error = %e, "scheduler: comment processing failed");
                    }
                }
            })
        })?;

        scheduler.add(job).await?;
        Ok(())
    }
}
