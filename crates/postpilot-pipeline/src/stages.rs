//! The five stage functions, as methods on [`Pipeline`].
//!
//! Each returns a JSON details object on success; the orchestrator turns
//! that into the stage's activity row. Per-item problems (one source down,
//! one topic failing to generate) are pushed onto `ctx.errors` and skipped;
//! only problems that leave the stage with nothing to show become stage
//! errors.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use postpilot_core::text::{clean_generated_content, flesch_reading_ease, normalize_topic};
use postpilot_core::validate::MAX_POST_HASHTAGS;
use postpilot_core::{NewNewsArticle, NewPost, NewTrendTopic, Tone};
use postpilot_db::{
    create_post, deactivate_trend_topics_below, insert_article_if_new, last_scheduled_at,
    mark_article_processed, schedule_post, set_review_results, top_active_trend_topics,
    upsert_trend_topic, DbError, PostRow,
};
use postpilot_llm::LanguageModel;
use postpilot_news::{filter_recent_relevant, FetchedArticle};

use crate::context::RunContext;
use crate::error::PipelineError;
use crate::{prompts, Pipeline};

/// Weight of the model's relevance judgement vs mention frequency when
/// blending a topic's final score.
const RELEVANCE_WEIGHT: f64 = 0.7;
const FREQUENCY_WEIGHT: f64 = 0.3;
/// Mentions at which the frequency component saturates.
const FREQUENCY_SATURATION: f64 = 5.0;

/// Fallback relevance when the model's answer is unusable.
const DEFAULT_RELEVANCE: f64 = 0.5;

const TOPICS_PER_ARTICLE: usize = 3;
const HASHTAGS_PER_TOPIC: usize = 3;

struct TopicDraft {
    topic: String,
    hashtags: Vec<String>,
    source: String,
    mentions: usize,
}

impl<L: LanguageModel> Pipeline<L> {
    // -----------------------------------------------------------------------
    // Stage 1: collect
    // -----------------------------------------------------------------------

    pub(crate) async fn collect(
        &self,
        ctx: &mut RunContext,
    ) -> Result<serde_json::Value, PipelineError> {
        if self.sources.is_empty() {
            tracing::warn!("no enabled news sources configured; collect is a no-op");
            return Ok(serde_json::json!({ "articles_stored": 0, "topics_found": 0 }));
        }

        let cutoff = Utc::now() - Duration::hours(self.lookback_hours);
        let mut fresh: Vec<FetchedArticle> = Vec::new();
        let mut failed_sources = 0usize;

        for source in &self.sources {
            match self.news.fetch_source(source).await {
                Ok(articles) => fresh.extend(filter_recent_relevant(articles, cutoff)),
                Err(e) => {
                    failed_sources += 1;
                    tracing::warn!(source = %source.name, error = %e, "source fetch failed; skipping");
                    ctx.errors.push(format!("source {}: {e}", source.name));
                }
            }
        }

        if failed_sources == self.sources.len() {
            return Err(PipelineError::AllSourcesFailed);
        }

        let stored = self.store_articles(&fresh).await?;
        ctx.articles_stored = stored.len();

        let (drafts, processed_article_ids) = self.distill_topics(ctx, &stored).await;

        for draft in drafts.into_iter().take(self.config.max_trends) {
            let relevance = self.rate_relevance(&draft.topic).await;
            #[allow(clippy::cast_precision_loss)]
            let frequency = (draft.mentions as f64 / FREQUENCY_SATURATION).min(1.0);
            let blended =
                (RELEVANCE_WEIGHT * relevance + FREQUENCY_WEIGHT * frequency).clamp(0.0, 1.0);

            let topic =
                match NewTrendTopic::new(&draft.topic, draft.hashtags, blended, &draft.source) {
                    Ok(t) => t,
                    Err(e) => {
                        tracing::warn!(topic = %draft.topic, error = %e, "skipping invalid topic");
                        continue;
                    }
                };

            upsert_trend_topic(&self.pool, &topic).await?;
            ctx.topics_found += 1;
        }

        for article_id in processed_article_ids {
            mark_article_processed(&self.pool, article_id).await?;
        }

        Ok(serde_json::json!({
            "articles_stored": ctx.articles_stored,
            "topics_found": ctx.topics_found,
            "failed_sources": failed_sources,
        }))
    }

    /// Persist fetched articles, skipping URLs already stored.
    async fn store_articles(
        &self,
        fresh: &[FetchedArticle],
    ) -> Result<Vec<postpilot_db::NewsArticleRow>, PipelineError> {
        let mut stored = Vec::new();

        for article in fresh {
            // filter_recent_relevant only passes dated articles through.
            let Some(published_at) = article.published_at else {
                continue;
            };

            let new_article = match NewNewsArticle::new(
                article.title.clone(),
                article.url.clone(),
                article.summary.clone(),
                article.author.clone(),
                article.source.clone(),
                published_at,
                article.categories.clone(),
                0.0,
            ) {
                Ok(a) => a,
                Err(e) => {
                    tracing::warn!(url = %article.url, error = %e, "skipping invalid article");
                    continue;
                }
            };

            if let Some(row) = insert_article_if_new(&self.pool, &new_article).await? {
                stored.push(row);
            }
        }

        Ok(stored)
    }

    /// Ask the model for topics (and per-topic hashtags) per new article,
    /// merging repeat mentions by normalized name. Articles whose
    /// extraction failed stay unprocessed for the next run.
    async fn distill_topics(
        &self,
        ctx: &mut RunContext,
        stored: &[postpilot_db::NewsArticleRow],
    ) -> (Vec<TopicDraft>, Vec<i64>) {
        let mut drafts: Vec<TopicDraft> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut processed_article_ids = Vec::new();

        for row in stored {
            let text = match &row.summary {
                Some(summary) => format!("{} {summary}", row.title),
                None => row.title.clone(),
            };

            match self.llm.extract_topics(&text, TOPICS_PER_ARTICLE).await {
                Ok(topics) => {
                    for topic in topics {
                        let key = normalize_topic(&topic);
                        if key.is_empty() {
                            continue;
                        }
                        if let Some(&at) = index.get(&key) {
                            drafts[at].mentions += 1;
                        } else {
                            let hashtags = match self
                                .llm
                                .generate_hashtags(&topic, HASHTAGS_PER_TOPIC)
                                .await
                            {
                                Ok(tags) => tags,
                                Err(e) => {
                                    tracing::warn!(topic = %topic, error = %e, "hashtag generation failed");
                                    Vec::new()
                                }
                            };
                            index.insert(key, drafts.len());
                            drafts.push(TopicDraft {
                                topic,
                                hashtags,
                                source: row.source.clone(),
                                mentions: 1,
                            });
                        }
                    }
                    processed_article_ids.push(row.id);
                }
                Err(e) => {
                    tracing::warn!(article = row.id, error = %e, "topic extraction failed");
                    ctx.errors
                        .push(format!("topic extraction failed for article {}: {e}", row.id));
                }
            }
        }

        (drafts, processed_article_ids)
    }

    /// Ask the model for a `[0, 1]` relevance judgement; unusable answers
    /// fall back to a middling score rather than losing the topic.
    async fn rate_relevance(&self, topic: &str) -> f64 {
        match self
            .llm
            .generate_text(&prompts::relevance_prompt(topic), None, Some(0.1))
            .await
        {
            Ok(raw) => raw
                .trim()
                .parse::<f64>()
                .map(|v| v.clamp(0.0, 1.0))
                .unwrap_or(DEFAULT_RELEVANCE),
            Err(e) => {
                tracing::warn!(topic, error = %e, "relevance rating failed; using default");
                DEFAULT_RELEVANCE
            }
        }
    }

    // -----------------------------------------------------------------------
    // Stage 2: filter
    // -----------------------------------------------------------------------

    pub(crate) async fn filter(
        &self,
        ctx: &mut RunContext,
    ) -> Result<serde_json::Value, PipelineError> {
        let limit = i64::try_from(self.config.top_k).unwrap_or(i64::MAX);
        ctx.selected =
            top_active_trend_topics(&self.pool, self.config.min_relevance, limit).await?;

        let deactivated =
            deactivate_trend_topics_below(&self.pool, self.config.min_relevance).await?;

        Ok(serde_json::json!({
            "selected": ctx.selected.len(),
            "deactivated": deactivated,
        }))
    }

    // -----------------------------------------------------------------------
    // Stage 3: generate
    // -----------------------------------------------------------------------

    pub(crate) async fn generate(
        &self,
        ctx: &mut RunContext,
    ) -> Result<serde_json::Value, PipelineError> {
        let RunContext {
            selected,
            drafts,
            errors,
            ..
        } = ctx;

        if selected.is_empty() {
            return Ok(serde_json::json!({ "drafts": 0 }));
        }

        let mut last_error: Option<PipelineError> = None;

        for topic in selected.iter() {
            match self
                .draft_post(
                    &topic.topic,
                    &topic.hashtags.0,
                    Some(topic.id),
                    Some(topic.relevance_score),
                    self.config.default_tone,
                    true,
                )
                .await
            {
                Ok(post) => drafts.push(post),
                Err(e) => {
                    tracing::warn!(topic = %topic.topic, error = %e, "generation failed for topic");
                    errors.push(format!("generation failed for '{}': {e}", topic.topic));
                    last_error = Some(e);
                }
            }
        }

        if drafts.is_empty() {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        Ok(serde_json::json!({ "drafts": drafts.len() }))
    }

    /// Draft and store one post for a topic.
    pub(crate) async fn draft_post(
        &self,
        topic: &str,
        topic_hashtags: &[String],
        trend_topic_id: Option<i64>,
        relevance: Option<f64>,
        tone: Tone,
        include_hashtags: bool,
    ) -> Result<PostRow, PipelineError> {
        let system = prompts::generation_system_prompt(tone);
        let prompt = prompts::generation_prompt(topic, relevance);

        let raw = self.llm.generate_text(&prompt, Some(&system), None).await?;
        let content = clean_generated_content(&raw);

        let hashtags = if include_hashtags {
            self.assemble_hashtags(topic_hashtags, &content).await
        } else {
            Vec::new()
        };

        let new_post = NewPost::new(content, hashtags, trend_topic_id)?;
        Ok(create_post(&self.pool, &new_post).await?)
    }

    /// Topic hashtags first, then model-generated ones, deduplicated
    /// case-insensitively and capped at the post limit. A hashtag-model
    /// failure degrades to the topic's own hashtags.
    async fn assemble_hashtags(&self, topic_hashtags: &[String], content: &str) -> Vec<String> {
        let generated = match self.llm.generate_hashtags(content, MAX_POST_HASHTAGS).await {
            Ok(tags) => tags,
            Err(e) => {
                tracing::warn!(error = %e, "content hashtag generation failed");
                Vec::new()
            }
        };

        let mut merged: Vec<String> = Vec::new();
        for candidate in topic_hashtags.iter().chain(generated.iter()) {
            let tag = candidate.trim().trim_start_matches('#');
            if tag.is_empty() || merged.len() >= MAX_POST_HASHTAGS {
                continue;
            }
            if !merged.iter().any(|m| m.eq_ignore_ascii_case(tag)) {
                merged.push(tag.to_string());
            }
        }
        merged
    }

    // -----------------------------------------------------------------------
    // Stage 4: review
    // -----------------------------------------------------------------------

    pub(crate) async fn review(
        &self,
        ctx: &mut RunContext,
    ) -> Result<serde_json::Value, PipelineError> {
        let RunContext { drafts, errors, .. } = ctx;
        let mut rewritten = 0usize;

        for draft in drafts.iter_mut() {
            let mut content = draft.content.clone();
            let mut score = flesch_reading_ease(&content);

            if score < self.config.min_readability {
                match self.llm.improve_readability(&content).await {
                    Ok(improved) => {
                        let cleaned = clean_generated_content(&improved);
                        if !cleaned.is_empty() {
                            let new_score = flesch_reading_ease(&cleaned);
                            // Keep the rewrite only when it actually reads better.
                            if new_score >= score {
                                content = cleaned;
                                score = new_score;
                                rewritten += 1;
                            }
                        }
                    }
                    Err(e) => {
                        tracing::warn!(post = draft.id, error = %e, "readability rewrite failed");
                        errors.push(format!("readability rewrite failed for post {}: {e}", draft.id));
                    }
                }
            }

            let character_count = i32::try_from(content.chars().count()).unwrap_or(i32::MAX);
            set_review_results(&self.pool, draft.id, &content, character_count, score).await?;

            draft.content = content;
            draft.character_count = character_count;
            draft.readability_score = Some(score);
        }

        Ok(serde_json::json!({
            "reviewed": drafts.len(),
            "rewritten": rewritten,
        }))
    }

    // -----------------------------------------------------------------------
    // Stage 5: schedule
    // -----------------------------------------------------------------------

    pub(crate) async fn schedule(
        &self,
        ctx: &mut RunContext,
    ) -> Result<serde_json::Value, PipelineError> {
        let RunContext {
            drafts, scheduled, ..
        } = ctx;

        if drafts.is_empty() {
            return Ok(serde_json::json!({ "scheduled": 0 }));
        }

        let last = last_scheduled_at(&self.pool).await?;
        let slots = next_slots(
            Utc::now(),
            last,
            self.config.slot_spacing_minutes,
            drafts.len(),
        );

        for (draft, slot) in drafts.iter().zip(slots) {
            match schedule_post(&self.pool, draft.id, slot).await {
                Ok(()) => *scheduled += 1,
                // Already past draft (e.g. a re-run raced this one): skip, do not fail.
                Err(DbError::InvalidPostTransition { .. }) => {
                    tracing::debug!(post = draft.id, "post no longer a draft; skipping slot");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(serde_json::json!({ "scheduled": *scheduled }))
    }
}

/// Compute `count` posting slots, spaced `spacing_minutes` apart, starting
/// after both `now` and the latest slot already handed out.
#[must_use]
pub(crate) fn next_slots(
    now: DateTime<Utc>,
    last_assigned: Option<DateTime<Utc>>,
    spacing_minutes: i64,
    count: usize,
) -> Vec<DateTime<Utc>> {
    let spacing = Duration::minutes(spacing_minutes.max(1));
    let mut cursor = match last_assigned {
        Some(last) if last > now => last,
        _ => now,
    };

    (0..count)
        .map(|_| {
            cursor = cursor + spacing;
            cursor
        })
        .collect()
}
