//! News collection: RSS fetching, parsing, and the keyword relevance
//! pre-filter applied before topics are distilled.

mod client;
mod error;
mod relevance;
mod rss;
mod types;

pub use client::NewsClient;
pub use error::NewsError;
pub use relevance::{filter_recent_relevant, is_relevant};
pub use rss::parse_rss_feed;
pub use types::FetchedArticle;
