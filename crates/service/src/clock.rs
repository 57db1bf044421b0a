//! Time source for review timestamps.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use models::Timestamp;

pub trait Clock: Send + Sync {
    /// Nanoseconds since the Unix epoch. Never smaller than a previous call.
    fn now(&self) -> Timestamp;
}

/// Wall clock that never runs backwards.
#[derive(Debug, Default)]
pub struct SystemClock {
    last: AtomicU64,
}

impl SystemClock {
    pub fn new() -> Self { Self::default() }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let wall = Utc::now()
            .timestamp_nanos_opt()
            .and_then(|n| u64::try_from(n).ok())
            .unwrap_or_default();
        let prev = self.last.fetch_max(wall, Ordering::SeqCst);
        prev.max(wall)
    }
}

/// Settable clock for tests and replays.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn starting_at(ts: Timestamp) -> Self { Self { now: AtomicU64::new(ts) } }

    pub fn set(&self, ts: Timestamp) { self.now.store(ts, Ordering::SeqCst); }

    pub fn advance(&self, by: Timestamp) -> Timestamp {
        self.now.fetch_add(by, Ordering::SeqCst) + by
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp { self.now.load(Ordering::SeqCst) }
}
