//! Error types for the reconstruction engine.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to read a wordlist file.
#[derive(Debug, Error)]
pub enum WordlistError {
    #[error("Failed to read wordlist {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures that abort a whole reconstruction run.
///
/// These never escape [`Reconstructor::reconstruct`](crate::Reconstructor::reconstruct);
/// they are turned into an empty partial schema at the top level.
#[derive(Debug, Error)]
pub enum ReconstructError {
    #[error("probe worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    #[error("reconstructor has been shut down")]
    Closed,
}

pub type Result<T> = std::result::Result<T, ReconstructError>;
