//! Test doubles for the query transport.
//!
//! - [`MockTransport`] answers from scripted rules keyed by query substrings.
//! - [`SchemaServer`] answers probe queries from a small in-memory schema, with
//!   graphql-js style validation errors.
//!
//! Both record every query they receive in a [`QueryLog`].

mod log;
mod mock_transport;
mod schema_server;

pub use log::QueryLog;
pub use mock_transport::MockTransport;
pub use schema_server::SchemaServer;
