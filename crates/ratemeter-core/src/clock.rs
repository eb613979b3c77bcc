//! Time source injected into the estimator.
//!
//! The estimator never reads the system time directly; it asks a [`Clock`].
//! Production code uses [`SystemClock`], tests and simulations drive a
//! [`ManualClock`] so every bucket boundary is reproducible.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Source of the current instant.
pub trait Clock: Send {
    fn now(&self) -> Instant;
}

/// Any `Fn() -> Instant` closure can stand in for a clock.
impl<F> Clock for F
where
    F: Fn() -> Instant + Send,
{
    fn now(&self) -> Instant {
        self()
    }
}

/// Monotonic wall clock (`Instant::now`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Deterministic clock: a fixed base instant plus a settable offset.
///
/// Clones share the offset, so a test can hand one clone to a `Progress` and
/// keep another to move time forward.
#[derive(Debug, Clone)]
pub struct ManualClock {
    base: Instant,
    offset_nanos: Arc<AtomicU64>,
}

impl ManualClock {
    /// Clock starting at the current instant with zero elapsed time.
    pub fn new() -> Self {
        Self::at(Instant::now())
    }

    /// Clock starting at `base` with zero elapsed time.
    pub fn at(base: Instant) -> Self {
        Self {
            base,
            offset_nanos: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn base(&self) -> Instant {
        self.base
    }

    /// Time elapsed since `base`.
    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.offset_nanos.load(Ordering::Relaxed))
    }

    /// Set the elapsed time since `base`. Moving backwards is allowed.
    pub fn set(&self, elapsed: Duration) {
        self.offset_nanos
            .store(duration_nanos(elapsed), Ordering::Relaxed);
    }

    /// Move the clock forward by `d`.
    pub fn advance(&self, d: Duration) {
        self.offset_nanos
            .fetch_add(duration_nanos(d), Ordering::Relaxed);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + self.elapsed()
    }
}

fn duration_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}
