//! State shared by every probe task of one reconstruction run.

use crate::pacing::Pacer;
use blindql_transport::{GraphQLResponse, QueryTransport};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// Receives human-readable progress lines from any worker task.
pub type ProgressSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Probe counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbeStats {
    /// Every probe query attempted.
    pub total: usize,
    /// Probes that discovered or resolved something.
    pub successful: usize,
}

/// Everything a probe task needs, passed explicitly to each worker.
///
/// The semaphore and pacer are shared with other runs of the same
/// reconstructor; the counters and cancellation token belong to this run.
pub struct ProbeContext {
    endpoint: String,
    transport: Arc<dyn QueryTransport>,
    permits: Arc<Semaphore>,
    pacer: Arc<Pacer>,
    cancel: CancellationToken,
    progress: Option<ProgressSink>,
    total: AtomicUsize,
    successful: AtomicUsize,
}

impl fmt::Debug for ProbeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbeContext")
            .field("endpoint", &self.endpoint)
            .field("cancelled", &self.cancel.is_cancelled())
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl ProbeContext {
    #[must_use]
    pub fn new(
        endpoint: impl Into<String>,
        transport: Arc<dyn QueryTransport>,
        permits: Arc<Semaphore>,
        pacer: Arc<Pacer>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            transport,
            permits,
            pacer,
            cancel,
            progress: None,
            total: AtomicUsize::new(0),
            successful: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn with_progress(mut self, progress: Option<ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Emits a progress line to the sink and the log.
    pub fn report(&self, message: &str) {
        tracing::info!("{message}");
        if let Some(progress) = &self.progress {
            progress(message);
        }
    }

    pub fn record_probe(&self, successful: bool) {
        self.total.fetch_add(1, Ordering::Relaxed);
        if successful {
            self.successful.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[must_use]
    pub fn stats(&self) -> ProbeStats {
        ProbeStats {
            total: self.total.load(Ordering::Relaxed),
            successful: self.successful.load(Ordering::Relaxed),
        }
    }

    /// Sends one probe query under the concurrency and pacing limits.
    ///
    /// Returns `None` if the run was cancelled before the request went out or
    /// the transport failed. A request that has been sent always completes.
    pub async fn execute(&self, query: &str) -> Option<GraphQLResponse> {
        let _permit = tokio::select! {
            () = self.cancel.cancelled() => return None,
            permit = self.permits.acquire() => permit.ok()?,
        };

        tokio::select! {
            () = self.cancel.cancelled() => return None,
            () = self.pacer.wait() => {}
        }

        if self.is_cancelled() {
            return None;
        }

        match self.transport.send_query(&self.endpoint, query).await {
            Ok(response) => Some(response),
            Err(e) => {
                tracing::warn!(error = %e, "Probe request failed");
                None
            }
        }
    }
}
