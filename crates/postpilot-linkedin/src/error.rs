use thiserror::Error;

/// Errors returned by the posting-platform client.
#[derive(Debug, Error)]
pub enum LinkedinError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The platform answered with a non-2xx status.
    #[error("LinkedIn API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Required credentials are not configured.
    #[error("LinkedIn client is not configured: {0}")]
    Missing(&'static str),

    /// The response body did not contain the expected fields.
    #[error("unexpected LinkedIn response: {0}")]
    UnexpectedResponse(String),
}
