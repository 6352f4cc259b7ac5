use thiserror::Error;

/// Errors returned by the news-feed collector.
#[derive(Debug, Error)]
pub enum NewsError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The feed endpoint answered with a non-2xx status.
    #[error("feed request to {url} failed with status {status}")]
    Status { status: u16, url: String },

    /// The feed body was not parseable XML.
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),
}
