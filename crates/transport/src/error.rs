use thiserror::Error;

pub type Result<T> = std::result::Result<T, TransportError>;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Rate limited (HTTP 429): {0}")]
    RateLimited(String),

    #[error("HTTP error {0}: {1}")]
    Http(u16, String),

    #[error("Failed to parse GraphQL response: {0}")]
    Parse(String),
}

impl TransportError {
    /// Network failures, timeouts, rate limiting and 5xx responses are worth retrying.
    /// Parse errors and other 4xx responses are not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) | Self::RateLimited(_) => true,
            Self::Http(status, _) => *status >= 500,
            Self::Parse(_) => false,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error.to_string())
        } else {
            Self::Network(error.to_string())
        }
    }
}
