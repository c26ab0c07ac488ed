use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Top-level blindql configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlindqlConfig {
    /// The GraphQL endpoint to reconstruct
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Path to a newline-delimited wordlist of candidate field names
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wordlist: Option<PathBuf>,

    /// HTTP transport settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Reconstruction tuning
    #[serde(default)]
    pub reconstruction: ReconstructionConfig,
}

/// HTTP settings for probe requests
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpConfig {
    /// HTTP headers to include in every request (e.g., for authentication)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,

    /// Request timeout in seconds (default: 30)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Connection timeout in seconds (default: 10)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_timeout: Option<u64>,

    /// Number of retry attempts after a failed request (default: 1)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,

    /// User-Agent header override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// Tuning for the reconstruction engine.
///
/// Every value has a default, so the whole section may be omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReconstructionConfig {
    /// Candidate names per root-level probe query
    pub bucket_size: usize,

    /// Candidate names per nested probe query (default: half of `bucket_size`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nested_bucket_size: Option<usize>,

    /// Maximum number of probe requests in flight
    pub concurrency: usize,

    /// Maximum exploration depth below the root types
    pub max_depth: usize,

    /// Minimum spacing between any two outgoing requests, in milliseconds
    pub request_delay_ms: u64,

    /// How long shutdown waits for running work before aborting it, in seconds
    pub shutdown_grace_secs: u64,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            bucket_size: 64,
            nested_bucket_size: None,
            concurrency: 8,
            max_depth: 10,
            request_delay_ms: 50,
            shutdown_grace_secs: 5,
        }
    }
}

impl ReconstructionConfig {
    /// The nested bucket size, falling back to half the root bucket size.
    #[must_use]
    pub fn effective_nested_bucket_size(&self) -> usize {
        self.nested_bucket_size
            .unwrap_or(self.bucket_size / 2)
            .max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_sections_missing() {
        let config: BlindqlConfig =
            serde_json::from_str(r#"{"endpoint": "https://api.example.com/graphql"}"#).unwrap();
        assert_eq!(config.reconstruction, ReconstructionConfig::default());
        assert_eq!(config.http, HttpConfig::default());
        assert!(config.wordlist.is_none());
    }

    #[test]
    fn test_partial_reconstruction_section() {
        let config: BlindqlConfig =
            serde_json::from_str(r#"{"reconstruction": {"concurrency": 2, "maxDepth": 3}}"#)
                .unwrap();
        assert_eq!(config.reconstruction.concurrency, 2);
        assert_eq!(config.reconstruction.max_depth, 3);
        assert_eq!(config.reconstruction.bucket_size, 64);
    }

    #[test]
    fn test_effective_nested_bucket_size() {
        let mut config = ReconstructionConfig::default();
        assert_eq!(config.effective_nested_bucket_size(), 32);

        config.nested_bucket_size = Some(10);
        assert_eq!(config.effective_nested_bucket_size(), 10);

        config.nested_bucket_size = None;
        config.bucket_size = 1;
        assert_eq!(config.effective_nested_bucket_size(), 1);
    }

    #[test]
    fn test_http_headers() {
        let config: BlindqlConfig = serde_json::from_str(
            r#"{"http": {"headers": {"Authorization": "Bearer x"}, "retries": 3}}"#,
        )
        .unwrap();
        let headers = config.http.headers.unwrap();
        assert_eq!(headers.get("Authorization").map(String::as_str), Some("Bearer x"));
        assert_eq!(config.http.retries, Some(3));
    }
}
