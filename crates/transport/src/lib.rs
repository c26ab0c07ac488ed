//! Query execution for blind GraphQL probing.
//!
//! The reconstruction engine only needs one capability from the network: send a
//! query document to an endpoint and get back the parsed `{ data, errors }`
//! body. That contract is the [`QueryTransport`] trait. [`HttpTransport`] is the
//! production implementation; tests substitute scripted transports.
//!
//! # Examples
//!
//! ```no_run
//! use blindql_transport::{HttpTransport, QueryTransport};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = HttpTransport::new().with_retries(2);
//!     let response = transport
//!         .send_query("https://api.example.com/graphql", "query { __typename }")
//!         .await?;
//!     for message in response.error_messages() {
//!         println!("{message}");
//!     }
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod response;

pub use client::{HttpTransport, DEFAULT_USER_AGENT};
pub use error::{Result, TransportError};
pub use response::GraphQLResponse;

/// Sends GraphQL query documents to an endpoint.
///
/// Implementations own their retry policy. Callers treat any returned error as
/// "this query yielded nothing".
#[async_trait::async_trait]
pub trait QueryTransport: Send + Sync {
    async fn send_query(&self, endpoint: &str, query: &str) -> Result<GraphQLResponse>;
}

#[async_trait::async_trait]
impl<T: QueryTransport + ?Sized> QueryTransport for std::sync::Arc<T> {
    async fn send_query(&self, endpoint: &str, query: &str) -> Result<GraphQLResponse> {
        (**self).send_query(endpoint, query).await
    }
}
