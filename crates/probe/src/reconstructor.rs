//! The reconstruction pipeline.

use crate::assembler::assemble;
use crate::context::{ProbeContext, ProbeStats, ProgressSink};
use crate::discoveries::Discoveries;
use crate::error::{ReconstructError, Result};
use crate::field_probe::probe_fields;
use crate::pacing::Pacer;
use crate::query::{OperationKind, SelectionPath};
use crate::scheduler::TypeExplorationScheduler;
use crate::settings::ProbeSettings;
use crate::wordlist::Wordlist;
use blindql_transport::QueryTransport;
use blindql_types::Schema;
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};
use tokio::task::{AbortHandle, JoinHandle};
use tokio_util::sync::CancellationToken;

/// State of the most recent run, kept for statistics.
struct LastRun {
    context: Arc<ProbeContext>,
    discoveries: Arc<Discoveries>,
}

/// Reconstructs a GraphQL schema without introspection.
///
/// A run discovers root Query fields, then Mutation fields, then resolves the
/// Query fields' return types and explores object types breadth-first. All
/// network access goes through the [`QueryTransport`].
///
/// # Examples
///
/// ```no_run
/// use blindql_probe::{ProbeSettings, Reconstructor};
/// use blindql_transport::HttpTransport;
///
/// # async fn run() {
/// let reconstructor = Reconstructor::new(HttpTransport::new())
///     .with_settings(ProbeSettings::default().with_concurrency(4))
///     .with_progress(|line| eprintln!("{line}"));
///
/// let schema = reconstructor.reconstruct("https://api.example.com/graphql").await;
/// println!("{} types", schema.type_count());
/// # }
/// ```
pub struct Reconstructor {
    transport: Arc<dyn QueryTransport>,
    settings: ProbeSettings,
    wordlist: RwLock<Wordlist>,
    progress: Option<ProgressSink>,
    permits: Arc<Semaphore>,
    pacer: Arc<Pacer>,
    cancel: Mutex<CancellationToken>,
    last_run: RwLock<Option<LastRun>>,
    active_runs: AtomicUsize,
    idle: Notify,
    spawned: Mutex<Vec<AbortHandle>>,
    closed: AtomicBool,
}

impl fmt::Debug for Reconstructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconstructor")
            .field("settings", &self.settings)
            .field("words", &self.wordlist.read().len())
            .field("active_runs", &self.active_runs.load(Ordering::SeqCst))
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Counts a run as active until dropped.
struct ActiveRun<'a> {
    owner: &'a Reconstructor,
}

impl<'a> ActiveRun<'a> {
    fn enter(owner: &'a Reconstructor) -> Self {
        owner.active_runs.fetch_add(1, Ordering::SeqCst);
        Self { owner }
    }
}

impl Drop for ActiveRun<'_> {
    fn drop(&mut self) {
        if self.owner.active_runs.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.owner.idle.notify_waiters();
        }
    }
}

impl Reconstructor {
    #[must_use]
    pub fn new(transport: impl QueryTransport + 'static) -> Self {
        Self::from_shared(Arc::new(transport))
    }

    /// Creates a reconstructor around an already shared transport.
    #[must_use]
    pub fn from_shared(transport: Arc<dyn QueryTransport>) -> Self {
        let settings = ProbeSettings::default();
        Self {
            transport,
            permits: Arc::new(Semaphore::new(settings.concurrency)),
            pacer: Arc::new(Pacer::new(settings.request_delay)),
            settings,
            wordlist: RwLock::new(Wordlist::default()),
            progress: None,
            cancel: Mutex::new(CancellationToken::new()),
            last_run: RwLock::new(None),
            active_runs: AtomicUsize::new(0),
            idle: Notify::new(),
            spawned: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: ProbeSettings) -> Self {
        self.permits = Arc::new(Semaphore::new(settings.concurrency.max(1)));
        self.pacer = Arc::new(Pacer::new(settings.request_delay));
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn with_wordlist(self, wordlist: Wordlist) -> Self {
        *self.wordlist.write() = wordlist;
        self
    }

    /// Sets the callback receiving progress lines.
    #[must_use]
    pub fn with_progress(mut self, progress: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.progress = Some(Arc::new(progress));
        self
    }

    #[must_use]
    pub fn settings(&self) -> &ProbeSettings {
        &self.settings
    }

    /// Replaces the candidate names used by later runs.
    pub fn set_wordlist(&self, wordlist: Wordlist) {
        *self.wordlist.write() = wordlist;
    }

    /// Adds candidate names for later runs.
    pub fn extend_wordlist<I, S>(&self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.wordlist.write().extend(words);
    }

    #[must_use]
    pub fn wordlist(&self) -> Wordlist {
        self.wordlist.read().clone()
    }

    /// Runs a full reconstruction against `endpoint`.
    ///
    /// Never fails: a run that cannot complete yields an empty schema marked
    /// `partial`, and a cancelled run yields what was found so far, also marked
    /// `partial`.
    #[tracing::instrument(skip(self))]
    pub async fn reconstruct(&self, endpoint: &str) -> Schema {
        let _active = ActiveRun::enter(self);
        let ctx = Arc::new(
            ProbeContext::new(
                endpoint,
                Arc::clone(&self.transport),
                Arc::clone(&self.permits),
                Arc::clone(&self.pacer),
                self.run_token(),
            )
            .with_progress(self.progress.clone()),
        );
        let discoveries = Arc::new(Discoveries::new());
        *self.last_run.write() = Some(LastRun {
            context: Arc::clone(&ctx),
            discoveries: Arc::clone(&discoveries),
        });

        ctx.report(&format!("Starting schema reconstruction for {endpoint}"));
        match self.run(&ctx, &discoveries).await {
            Ok(schema) => {
                let stats = ctx.stats();
                ctx.report(&format!(
                    "Reconstruction finished: {} types, {} fields, {} probes ({} successful)",
                    schema.type_count(),
                    schema.total_field_count(),
                    stats.total,
                    stats.successful
                ));
                schema
            }
            Err(e) => {
                tracing::error!(error = %e, "Reconstruction failed");
                ctx.report(&format!("Reconstruction failed: {e}"));
                Schema::empty_reconstructed(endpoint, true)
            }
        }
    }

    async fn run(&self, ctx: &Arc<ProbeContext>, discoveries: &Arc<Discoveries>) -> Result<Schema> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ReconstructError::Closed);
        }

        let words: Arc<[String]> = self.wordlist.read().words().into();
        let endpoint = ctx.endpoint();

        ctx.report(&format!("Probing Query fields with {} candidates", words.len()));
        let query = probe_fields(
            ctx,
            OperationKind::Query,
            &SelectionPath::root(),
            &words,
            self.settings.bucket_size,
        )
        .await?;
        if query.is_empty() {
            ctx.report("No Query fields discovered");
            return Ok(Schema::empty_reconstructed(endpoint, true));
        }

        let query_root = query.root_type_name(OperationKind::Query);
        discoveries.set_root(OperationKind::Query, &query_root);
        discoveries.mark_visited(&query_root);
        query.record_into(discoveries, &query_root);
        ctx.report(&format!("Found {} Query fields", query.fields.len()));

        if !ctx.is_cancelled() {
            ctx.report("Probing Mutation fields");
            let mutation = probe_fields(
                ctx,
                OperationKind::Mutation,
                &SelectionPath::root(),
                &words,
                self.settings.bucket_size,
            )
            .await?;
            if !mutation.is_empty() {
                let mutation_root = mutation.root_type_name(OperationKind::Mutation);
                discoveries.set_root(OperationKind::Mutation, &mutation_root);
                discoveries.mark_visited(&mutation_root);
                mutation.record_into(discoveries, &mutation_root);
                // Mutation fields are never probed further; only types already
                // named by errors are kept.
                for (field, hint) in &mutation.type_hints {
                    discoveries.set_field_type(&mutation_root, field, hint.clone());
                }
                ctx.report(&format!("Found {} Mutation fields", mutation.fields.len()));
            }
        }

        let mut scheduler = TypeExplorationScheduler::new(
            Arc::clone(ctx),
            Arc::clone(discoveries),
            Arc::clone(&words),
            self.settings.clone(),
        );

        if !ctx.is_cancelled() {
            ctx.report("Resolving Query field types");
            let fields: Vec<String> = query.fields.iter().cloned().collect();
            scheduler
                .resolve_field_types(&query_root, &SelectionPath::root(), &fields, &query, 1)
                .await?;
        }

        scheduler.explore().await?;

        let mut schema = assemble(endpoint, discoveries);
        if ctx.is_cancelled() {
            ctx.report("Reconstruction cancelled, returning partial schema");
            schema.partial = true;
        }
        Ok(schema)
    }

    /// Starts a reconstruction on the runtime.
    ///
    /// Spawned runs are aborted by [`shutdown`](Self::shutdown) if they do not
    /// finish within the grace period.
    pub fn spawn(self: &Arc<Self>, endpoint: impl Into<String>) -> JoinHandle<Schema> {
        let this = Arc::clone(self);
        let endpoint = endpoint.into();
        let handle = tokio::spawn(async move { this.reconstruct(&endpoint).await });

        let mut spawned = self.spawned.lock();
        spawned.retain(|h| !h.is_finished());
        spawned.push(handle.abort_handle());
        handle
    }

    /// Stops running reconstructions between probe units.
    ///
    /// Requests already sent complete. Runs started afterwards are unaffected.
    pub fn cancel(&self) {
        self.cancel.lock().cancel();
    }

    fn run_token(&self) -> CancellationToken {
        let mut token = self.cancel.lock();
        if token.is_cancelled() && !self.closed.load(Ordering::SeqCst) {
            *token = CancellationToken::new();
        }
        token.clone()
    }

    /// Shuts down with the configured grace period.
    pub async fn shutdown(&self) -> bool {
        self.shutdown_with_grace(self.settings.shutdown_grace).await
    }

    /// Cancels running reconstructions and waits up to `grace` for them to
    /// finish, then aborts spawned runs still going.
    ///
    /// Returns true if every run finished in time. Later calls to
    /// [`reconstruct`](Self::reconstruct) return an empty partial schema.
    pub async fn shutdown_with_grace(&self, grace: Duration) -> bool {
        self.closed.store(true, Ordering::SeqCst);
        self.cancel.lock().cancel();

        let drained = tokio::time::timeout(grace, self.wait_idle()).await.is_ok();
        let handles: Vec<AbortHandle> = self.spawned.lock().drain(..).collect();
        if !drained {
            tracing::warn!(
                runs = self.active_runs.load(Ordering::SeqCst),
                "Reconstructions did not stop within the grace period, aborting"
            );
            for handle in handles {
                handle.abort();
            }
        }
        drained
    }

    async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if self.active_runs.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Probe counters of the most recent run.
    #[must_use]
    pub fn stats(&self) -> ProbeStats {
        self.last_run
            .read()
            .as_ref()
            .map(|run| run.context.stats())
            .unwrap_or_default()
    }

    /// Number of types with discovered fields in the most recent run.
    #[must_use]
    pub fn discovered_type_count(&self) -> usize {
        self.last_run
            .read()
            .as_ref()
            .map_or(0, |run| run.discoveries.type_count())
    }

    /// Every field name discovered in the most recent run.
    #[must_use]
    pub fn all_discovered_fields(&self) -> BTreeSet<String> {
        self.last_run
            .read()
            .as_ref()
            .map(|run| run.discoveries.all_field_names())
            .unwrap_or_default()
    }
}
