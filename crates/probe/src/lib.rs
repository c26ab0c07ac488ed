//! Blind GraphQL schema reconstruction.
//!
//! When introspection is disabled, a server still answers ordinary queries,
//! and its validation errors leak a great deal: whether a name is a field,
//! whether that field returns an object or a scalar, which type it returns,
//! and which similarly named fields exist. This crate turns those answers into
//! a [`Schema`](blindql_types::Schema).
//!
//! The pipeline:
//!
//! 1. Candidate names from a [`Wordlist`] are split into buckets and probed as
//!    aliased selections against the Query root, then the Mutation root.
//! 2. Each response is read through the dialect [`classifier`].
//! 3. Query field return types are resolved from error hints or
//!    `__typename` probes.
//! 4. Object types are explored breadth-first by the
//!    [`TypeExplorationScheduler`] up to a maximum depth.
//! 5. The [`assembler`] folds everything into a schema.
//!
//! [`Reconstructor`] drives the whole run.

pub mod assembler;
mod bucket;
pub mod classifier;
mod context;
mod discoveries;
mod error;
mod field_probe;
mod pacing;
pub mod query;
mod reconstructor;
mod scheduler;
mod settings;
mod wordlist;

pub use bucket::create_buckets;
pub use context::{ProbeContext, ProbeStats, ProgressSink};
pub use discoveries::{DiscoveredField, DiscoveredFields, Discoveries};
pub use error::{ReconstructError, Result, WordlistError};
pub use field_probe::{
    interpret_bucket_response, interpret_typename_response, probe_bucket, probe_fields,
    resolve_field_type, ProbeOutcome, TypeResolution,
};
pub use pacing::Pacer;
pub use reconstructor::Reconstructor;
pub use scheduler::{ExplorationTask, TypeExplorationScheduler};
pub use settings::{
    ProbeSettings, DEFAULT_BUCKET_SIZE, DEFAULT_CONCURRENCY, DEFAULT_MAX_DEPTH,
    DEFAULT_REQUEST_DELAY, DEFAULT_SHUTDOWN_GRACE,
};
pub use wordlist::{is_valid_name, Wordlist, DEFAULT_WORDS};
