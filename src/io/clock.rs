//! Monotonic time for the guest clock import

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Monotonic time source. Only differences between readings matter.
pub trait Clock: Send {
    fn now(&self) -> Duration;
}

/// Wall-independent clock backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-driven clock; clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    millis: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(
        &self,
        by: Duration,
    ) {
        let ms = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.millis.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

/// Start of the current run on some [`Clock`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeAnchor {
    at: Duration,
}

impl TimeAnchor {
    pub fn capture(clock: &dyn Clock) -> Self {
        Self { at: clock.now() }
    }

    /// Milliseconds since the anchor, saturating at `u32::MAX`.
    pub fn elapsed_millis(
        &self,
        clock: &dyn Clock,
    ) -> u32 {
        let elapsed = clock.now().saturating_sub(self.at);
        u32::try_from(elapsed.as_millis()).unwrap_or(u32::MAX)
    }
}
