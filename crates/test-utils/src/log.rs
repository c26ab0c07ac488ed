use parking_lot::Mutex;

/// Every query document a test transport received, in arrival order.
///
/// Checkpoints let a test look only at queries sent after some point:
///
/// ```
/// use blindql_test_utils::QueryLog;
///
/// let log = QueryLog::default();
/// log.record("query { a }");
/// let checkpoint = log.checkpoint();
/// log.record("query { b }");
/// assert_eq!(log.since(checkpoint), ["query { b }"]);
/// ```
#[derive(Debug, Default)]
pub struct QueryLog {
    queries: Mutex<Vec<String>>,
}

impl QueryLog {
    pub fn record(&self, query: &str) {
        self.queries.lock().push(query.to_string());
    }

    #[must_use]
    pub fn all(&self) -> Vec<String> {
        self.queries.lock().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queries.lock().is_empty()
    }

    /// Marks the current position in the log.
    #[must_use]
    pub fn checkpoint(&self) -> usize {
        self.len()
    }

    /// Queries received after `checkpoint`.
    #[must_use]
    pub fn since(&self, checkpoint: usize) -> Vec<String> {
        self.queries
            .lock()
            .iter()
            .skip(checkpoint)
            .cloned()
            .collect()
    }

    /// Number of queries containing `needle`.
    #[must_use]
    pub fn count_matching(&self, needle: &str) -> usize {
        self.queries
            .lock()
            .iter()
            .filter(|query| query.contains(needle))
            .count()
    }

    pub fn clear(&self) {
        self.queries.lock().clear();
    }
}
