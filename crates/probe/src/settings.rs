use std::time::Duration;

/// Default number of candidate names per root-level probe query.
pub const DEFAULT_BUCKET_SIZE: usize = 64;
/// Default maximum number of probe requests in flight.
pub const DEFAULT_CONCURRENCY: usize = 8;
/// Default maximum BFS depth below the root types.
pub const DEFAULT_MAX_DEPTH: usize = 10;
/// Default spacing between consecutive requests.
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(50);
/// Default time `shutdown` waits for running reconstructions.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Tuning knobs for a [`Reconstructor`](crate::Reconstructor).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSettings {
    pub bucket_size: usize,
    /// Bucket size used below the root. Nested queries are larger, so buckets
    /// are smaller.
    pub nested_bucket_size: usize,
    pub concurrency: usize,
    pub max_depth: usize,
    pub request_delay: Duration,
    pub shutdown_grace: Duration,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            bucket_size: DEFAULT_BUCKET_SIZE,
            nested_bucket_size: DEFAULT_BUCKET_SIZE / 2,
            concurrency: DEFAULT_CONCURRENCY,
            max_depth: DEFAULT_MAX_DEPTH,
            request_delay: DEFAULT_REQUEST_DELAY,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }
}

impl ProbeSettings {
    /// Sets the root bucket size and derives the nested size from it.
    #[must_use]
    pub fn with_bucket_size(mut self, size: usize) -> Self {
        self.bucket_size = size.max(1);
        self.nested_bucket_size = (self.bucket_size / 2).max(1);
        self
    }

    #[must_use]
    pub fn with_nested_bucket_size(mut self, size: usize) -> Self {
        self.nested_bucket_size = size.max(1);
        self
    }

    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    #[must_use]
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    #[must_use]
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = ProbeSettings::default();
        assert_eq!(settings.bucket_size, 64);
        assert_eq!(settings.nested_bucket_size, 32);
        assert_eq!(settings.concurrency, 8);
        assert_eq!(settings.max_depth, 10);
        assert_eq!(settings.request_delay, Duration::from_millis(50));
        assert_eq!(settings.shutdown_grace, Duration::from_secs(5));
    }

    #[test]
    fn test_bucket_size_derives_nested_size() {
        let settings = ProbeSettings::default().with_bucket_size(10);
        assert_eq!(settings.bucket_size, 10);
        assert_eq!(settings.nested_bucket_size, 5);

        let settings = ProbeSettings::default().with_bucket_size(1);
        assert_eq!(settings.nested_bucket_size, 1);
    }

    #[test]
    fn test_zero_sizes_are_clamped() {
        let settings = ProbeSettings::default()
            .with_bucket_size(0)
            .with_nested_bucket_size(0)
            .with_concurrency(0);
        assert_eq!(settings.bucket_size, 1);
        assert_eq!(settings.nested_bucket_size, 1);
        assert_eq!(settings.concurrency, 1);
    }
}
