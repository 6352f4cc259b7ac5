//! Keyword relevance filter for collected articles.
//!
//! Cheap pre-filter applied before any LLM call: an article has to mention
//! at least one technology/business keyword in its title, summary, or
//! categories to be worth distilling into trend topics.

use chrono::{DateTime, Utc};

use crate::types::FetchedArticle;

const TECH_KEYWORDS: &[&str] = &[
    "ai",
    "artificial intelligence",
    "machine learning",
    "startup",
    "funding",
    "software",
    "technology",
    "tech",
    "programming",
    "developer",
    "cloud",
    "cybersecurity",
    "blockchain",
    "cryptocurrency",
    "fintech",
    "saas",
    "api",
    "mobile",
    "app",
    "platform",
    "innovation",
    "digital",
    "automation",
    "robotics",
    "iot",
    "internet of things",
    "big data",
    "analytics",
    "venture capital",
    "ipo",
    "acquisition",
    "merger",
    "enterprise",
];

/// True when the article mentions at least one tech/business keyword.
#[must_use]
pub fn is_relevant(article: &FetchedArticle) -> bool {
    let haystack = format!(
        "{} {} {}",
        article.title,
        article.summary.as_deref().unwrap_or(""),
        article.categories.join(" ")
    )
    .to_lowercase();

    TECH_KEYWORDS.iter().any(|keyword| haystack.contains(keyword))
}

/// Keep articles that are relevant and published after `cutoff`. Articles
/// without a parseable publication date are dropped.
#[must_use]
pub fn filter_recent_relevant(
    articles: Vec<FetchedArticle>,
    cutoff: DateTime<Utc>,
) -> Vec<FetchedArticle> {
    articles
        .into_iter()
        .filter(|article| {
            article
                .published_at
                .is_some_and(|published| published > cutoff)
        })
        .filter(is_relevant)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn article(title: &str, summary: Option<&str>, hours_ago: i64) -> FetchedArticle {
        FetchedArticle {
            title: title.to_string(),
            url: format!("https://example.com/{}", title.replace(' ', "-")),
            summary: summary.map(ToString::to_string),
            author: None,
            published_at: Some(Utc::now() - Duration::hours(hours_ago)),
            categories: vec![],
            source: "techcrunch".to_string(),
        }
    }

    #[test]
    fn tech_article_is_relevant() {
        assert!(is_relevant(&article("New AI startup raises funding", None, 1)));
    }

    #[test]
    fn keyword_in_summary_counts() {
        assert!(is_relevant(&article(
            "Quarterly results",
            Some("Strong growth for the cloud division"),
            1
        )));
    }

    #[test]
    fn keyword_in_category_counts() {
        let mut a = article("Company news roundup", None, 1);
        a.categories = vec!["Fintech".to_string()];
        assert!(is_relevant(&a));
    }

    #[test]
    fn unrelated_article_is_filtered() {
        assert!(!is_relevant(&article(
            "Local bakery wins regional pastry award",
            Some("Croissants were praised by judges"),
            1
        )));
    }

    #[test]
    fn lookback_window_drops_old_and_undated_articles() {
        let cutoff = Utc::now() - Duration::hours(24);
        let mut undated = article("Fresh AI news", None, 1);
        undated.published_at = None;

        let kept = filter_recent_relevant(
            vec![
                article("AI agents everywhere", None, 2),
                article("Stale software story", None, 48),
                undated,
            ],
            cutoff,
        );

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "AI agents everywhere");
    }
}
