//! The explicit run-context value threaded through the stage functions,
//! and the report a finished run collapses into.

use postpilot_db::{PostRow, TrendTopicRow};
use serde::Serialize;
use uuid::Uuid;

/// Mutable state accumulated across one pipeline run. Each stage reads what
/// earlier stages produced and appends its own results.
#[derive(Debug)]
pub struct RunContext {
    pub run_id: Uuid,
    pub articles_stored: usize,
    pub topics_found: usize,
    pub selected: Vec<TrendTopicRow>,
    pub drafts: Vec<PostRow>,
    pub scheduled: usize,
    /// Non-fatal problems (skipped sources, per-topic failures).
    pub errors: Vec<String>,
}

impl RunContext {
    #[must_use]
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            articles_stored: 0,
            topics_found: 0,
            selected: Vec::new(),
            drafts: Vec::new(),
            scheduled: 0,
            errors: Vec::new(),
        }
    }

    #[must_use]
    pub fn into_report(self, success: bool) -> RunReport {
        RunReport {
            run_id: self.run_id,
            success,
            articles_stored: self.articles_stored,
            trends_found: self.topics_found,
            posts_generated: self.drafts.len(),
            posts_scheduled: self.scheduled,
            errors: self.errors,
        }
    }
}

/// Summary of one run, serialized into the activity log and returned to
/// `run-now` callers.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub success: bool,
    pub articles_stored: usize,
    pub trends_found: usize,
    pub posts_generated: usize,
    pub posts_scheduled: usize,
    pub errors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_carries_context_counters() {
        let mut ctx = RunContext::new(Uuid::new_v4());
        ctx.articles_stored = 4;
        ctx.topics_found = 2;
        ctx.scheduled = 1;
        ctx.errors.push("source x skipped".to_string());

        let report = ctx.into_report(true);
        assert!(report.success);
        assert_eq!(report.articles_stored, 4);
        assert_eq!(report.trends_found, 2);
        assert_eq!(report.posts_scheduled, 1);
        assert_eq!(report.errors.len(), 1);
    }
}
