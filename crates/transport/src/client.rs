//! HTTP transport for probe queries.
//!
//! This module provides a configurable client that POSTs GraphQL queries as JSON,
//! with support for custom headers, timeouts, and retry logic.

use crate::{GraphQLResponse, QueryTransport, Result, TransportError};
use std::collections::HashMap;
use std::sync::OnceLock;
use std::time::Duration;

/// Default timeout for a probe request (30 seconds).
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default connection timeout (10 seconds).
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default number of retry attempts after the first one.
const DEFAULT_RETRIES: u32 = 1;

/// Default delay before the first retry; doubles on each further attempt.
const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

/// User agent sent unless one is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("blindql/", env!("CARGO_PKG_VERSION"));

/// A configurable HTTP client for executing GraphQL queries.
///
/// The client supports:
/// - Custom HTTP headers (e.g., for authentication)
/// - Configurable request and connection timeouts
/// - Automatic retry with exponential backoff for network errors, timeouts,
///   HTTP 429 and 5xx responses
///
/// Responses with other non-success statuses are still parsed as GraphQL when
/// the body is JSON, since many servers answer validation failures with
/// `400 Bad Request` and a regular `errors` array.
///
/// # Examples
///
/// ```no_run
/// use blindql_transport::{HttpTransport, QueryTransport};
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = HttpTransport::new()
///     .with_header("Authorization", "Bearer token")
///     .with_timeout(Duration::from_secs(60))
///     .with_retries(2);
/// let response = transport
///     .send_query("https://api.example.com/graphql", "query { __typename }")
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    headers: HashMap<String, String>,
    user_agent: String,
    timeout: Duration,
    connect_timeout: Duration,
    retries: u32,
    backoff: Duration,
    client: OnceLock<reqwest::Client>,
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport {
    /// Creates a new transport with default settings.
    ///
    /// Default settings:
    /// - 30 second request timeout
    /// - 10 second connection timeout
    /// - 1 retry, starting after 1 second
    /// - No custom headers
    #[must_use]
    pub fn new() -> Self {
        Self {
            headers: HashMap::new(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            retries: DEFAULT_RETRIES,
            backoff: DEFAULT_BACKOFF,
            client: OnceLock::new(),
        }
    }

    /// Adds a custom HTTP header to be sent with every query.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Adds multiple HTTP headers from an iterator.
    #[must_use]
    pub fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in headers {
            self.headers.insert(name.into(), value.into());
        }
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self.client = OnceLock::new();
        self
    }

    /// Sets the request timeout (connection + transfer).
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self.client = OnceLock::new();
        self
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self.client = OnceLock::new();
        self
    }

    /// Sets the number of retry attempts after the first request fails.
    #[must_use]
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Sets the delay before the first retry. Each further retry doubles it.
    #[must_use]
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    fn client(&self) -> Result<&reqwest::Client> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }

        tracing::debug!("Creating HTTP client with timeouts");
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(self.user_agent.clone())
            .build()
            .map_err(|e| TransportError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(self.client.get_or_init(|| client))
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        self.backoff
            .saturating_mul(1_u32 << attempt.saturating_sub(1).min(16))
    }

    /// Executes a single query without retry logic.
    async fn send_once(&self, endpoint: &str, query: &str) -> Result<GraphQLResponse> {
        let client = self.client()?;
        let body = serde_json::json!({ "query": query });

        let mut request = client
            .post(endpoint)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json");

        for (name, value) in &self.headers {
            request = request.header(name, value);
        }

        let response = request.json(&body).send().await?;
        let status = response.status();
        tracing::trace!(status = status.as_u16(), "Received response");

        let text = response.text().await?;

        if status.as_u16() == 429 {
            return Err(TransportError::RateLimited(text));
        }
        if status.is_server_error() {
            return Err(TransportError::Http(status.as_u16(), text));
        }

        match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(value) => Ok(GraphQLResponse::from_value(value)),
            Err(_) if !status.is_success() => Err(TransportError::Http(status.as_u16(), text)),
            Err(e) => Err(TransportError::Parse(e.to_string())),
        }
    }
}

#[async_trait::async_trait]
impl QueryTransport for HttpTransport {
    #[tracing::instrument(skip(self, query), fields(query_len = query.len()))]
    async fn send_query(&self, endpoint: &str, query: &str) -> Result<GraphQLResponse> {
        let mut last_error = None;
        let attempts = self.retries + 1;

        for attempt in 0..attempts {
            if attempt > 0 {
                let delay = self.backoff_delay(attempt);
                tracing::debug!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying after delay"
                );
                tokio::time::sleep(delay).await;
            }

            match self.send_once(endpoint, query).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "Request failed");
                    let retryable = e.is_retryable();
                    last_error = Some(e);
                    if !retryable {
                        break;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| TransportError::Network("No attempts made".to_string())))
    }
}
