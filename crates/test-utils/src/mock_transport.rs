use crate::QueryLog;
use async_trait::async_trait;
use blindql_transport::{GraphQLResponse, QueryTransport, Result, TransportError};
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

type Responder = Arc<dyn Fn(&str) -> Option<Result<Value>> + Send + Sync>;

/// A transport that answers from scripted rules.
///
/// Rules are tried in the order they were added; the first one that answers
/// wins. Queries no rule answers get the fallback body, which by default is a
/// single error message that carries no schema information.
///
/// ```
/// use blindql_test_utils::MockTransport;
/// use blindql_transport::QueryTransport;
/// use serde_json::json;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let transport = MockTransport::new().on("g0: user", json!({"data": {"g0": null}}));
/// let response = transport
///     .send_query("http://localhost/graphql", "query BlindProbe { g0: user }")
///     .await
///     .unwrap();
/// assert_eq!(response.data, Some(json!({"g0": null})));
/// assert_eq!(transport.queries().len(), 1);
/// # }
/// ```
pub struct MockTransport {
    rules: Vec<Responder>,
    fallback: Value,
    latency: Option<Duration>,
    log: QueryLog,
}

impl fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockTransport")
            .field("rules", &self.rules.len())
            .field("fallback", &self.fallback)
            .field("latency", &self.latency)
            .field("log", &self.log)
            .finish()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            fallback: json!({"errors": [{"message": "no mock response"}]}),
            latency: None,
            log: QueryLog::default(),
        }
    }

    /// Answers queries containing `needle` with `body`.
    #[must_use]
    pub fn on(self, needle: impl Into<String>, body: Value) -> Self {
        let needle = needle.into();
        self.on_fn(move |query| query.contains(&needle).then(|| body.clone()))
    }

    /// Answers with whatever `respond` returns, or passes if it returns `None`.
    #[must_use]
    pub fn on_fn(
        mut self,
        respond: impl Fn(&str) -> Option<Value> + Send + Sync + 'static,
    ) -> Self {
        self.rules
            .push(Arc::new(move |query: &str| -> Option<Result<Value>> {
                respond(query).map(Ok)
            }));
        self
    }

    /// Fails queries containing `needle` with a network error.
    #[must_use]
    pub fn fail_on(self, needle: impl Into<String>) -> Self {
        let needle = needle.into();
        self.fail_with(move |query| {
            query
                .contains(&needle)
                .then(|| TransportError::Network("injected failure".to_string()))
        })
    }

    /// Fails with whatever error `fail` returns, or passes if it returns `None`.
    #[must_use]
    pub fn fail_with(
        mut self,
        fail: impl Fn(&str) -> Option<TransportError> + Send + Sync + 'static,
    ) -> Self {
        self.rules
            .push(Arc::new(move |query: &str| -> Option<Result<Value>> {
                fail(query).map(Err)
            }));
        self
    }

    #[must_use]
    pub fn with_fallback(mut self, body: Value) -> Self {
        self.fallback = body;
        self
    }

    /// Delays every response, after the query has been recorded.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    #[must_use]
    pub fn log(&self) -> &QueryLog {
        &self.log
    }

    #[must_use]
    pub fn queries(&self) -> Vec<String> {
        self.log.all()
    }

    #[must_use]
    pub fn count_matching(&self, needle: &str) -> usize {
        self.log.count_matching(needle)
    }
}

#[async_trait]
impl QueryTransport for MockTransport {
    async fn send_query(&self, _endpoint: &str, query: &str) -> Result<GraphQLResponse> {
        self.log.record(query);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let body = self
            .rules
            .iter()
            .find_map(|rule| rule(query))
            .unwrap_or_else(|| Ok(self.fallback.clone()))?;
        Ok(GraphQLResponse::from_value(body))
    }
}
