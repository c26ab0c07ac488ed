//! Global request pacing.

use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Spaces requests at least `interval` apart across every worker.
///
/// Each caller reserves the next free slot, so concurrent callers are queued
/// behind each other rather than all waking at once.
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    last_slot: Mutex<Option<Instant>>,
}

impl Pacer {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_slot: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Claims the next request slot and returns when it starts.
    pub fn reserve(&self) -> Instant {
        let now = Instant::now();
        if self.interval.is_zero() {
            return now;
        }

        let mut last = self.last_slot.lock();
        let slot = match *last {
            Some(previous) => (previous + self.interval).max(now),
            None => now,
        };
        *last = Some(slot);
        slot
    }

    /// Waits for a reserved slot.
    pub async fn wait(&self) {
        let slot = self.reserve();
        if slot > Instant::now() {
            tokio::time::sleep_until(slot).await;
        }
    }
}
