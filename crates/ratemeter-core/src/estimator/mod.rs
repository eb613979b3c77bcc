//! Progress estimator: sliding-window throughput plus a weighted moving
//! average of predicted completion times.
//!
//! Callers feed non-negative increments through [`Progress::update`]. Time is
//! read from the injected [`Clock`] and snapped to [`RESOLUTION`] buckets; the
//! cached [`Status`] is only recomputed when a later bucket begins, so
//! increments inside one bucket become visible at the next boundary.
//!
//! ```
//! use std::time::Duration;
//! use ratemeter_core::clock::ManualClock;
//! use ratemeter_core::estimator::{Progress, ProgressOptions};
//!
//! let clock = ManualClock::new();
//! let mut p = Progress::with_options(
//!     Some(10_000),
//!     ProgressOptions::default().with_clock(clock.clone()),
//! );
//! for _ in 0..20 {
//!     clock.advance(Duration::from_millis(100));
//!     p.update(100);
//! }
//! assert_eq!(p.status().done, 1_900);
//! ```

mod completion;
mod status;
mod window;


pub use status::{format_duration, Status};

use std::fmt;
use std::time::{Duration, Instant};

use crate::clock::{Clock, SystemClock};
use crate::config::MeterConfig;
use completion::CompletionAvg;
use window::SampleRing;

/// Granularity of all internal times.
pub const RESOLUTION: Duration = Duration::from_millis(100);

/// Default trailing window for throughput estimation.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(5);

/// Longest accepted window; longer requests are clamped to it.
pub const MAX_WINDOW: Duration = Duration::from_secs(3600);

/// Number of completion predictions averaged for the ETA.
pub const DEFAULT_COMPLETION_SAMPLES: usize = 8;

/// Callback invoked with the new status on every bucket advance.
pub type StatusCallback = Box<dyn FnMut(Status) + Send>;

/// Construction-time configuration for [`Progress`].
pub struct ProgressOptions {
    clock: Box<dyn Clock>,
    window: Duration,
    status_callback: Option<StatusCallback>,
}

impl Default for ProgressOptions {
    fn default() -> Self {
        Self {
            clock: Box::new(SystemClock),
            window: DEFAULT_WINDOW,
            status_callback: None,
        }
    }
}

impl ProgressOptions {
    /// Options seeded from the loaded configuration (sample window).
    pub fn from_config(cfg: &MeterConfig) -> Self {
        Self::default().with_window(cfg.window())
    }

    /// Replace the time source, e.g. with a `ManualClock` in tests.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Trailing window for throughput. Clamped to [`MAX_WINDOW`], truncated
    /// to a multiple of [`RESOLUTION`] and raised to one resolution if shorter.
    #[must_use]
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Call `f` synchronously after every status change. `f` must not block.
    #[must_use]
    pub fn with_status_callback(mut self, f: impl FnMut(Status) + Send + 'static) -> Self {
        self.status_callback = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for ProgressOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressOptions")
            .field("window", &self.window)
            .field("status_callback", &self.status_callback.is_some())
            .finish_non_exhaustive()
    }
}

/// Throughput and ETA estimator for one monotonically progressing task.
///
/// Not meant to be shared between threads; calls must be serialised by the
/// owner.
pub struct Progress {
    start: Instant,
    clock: Box<dyn Clock>,
    window: Duration,
    status_callback: Option<StatusCallback>,
    samples: SampleRing,
    completion: CompletionAvg,
    /// Live cumulative total; `status.done` lags it until the next advance.
    done: u64,
    status: Status,
}

impl Progress {
    /// Estimator with default options. `total` of `None` or `Some(0)` means
    /// the total is unknown; only throughput is reported then.
    pub fn new(total: Option<u64>) -> Self {
        Self::with_options(total, ProgressOptions::default())
    }

    pub fn with_options(total: Option<u64>, options: ProgressOptions) -> Self {
        let window = normalize_window(options.window);
        if window != options.window {
            tracing::debug!(
                requested = ?options.window,
                window = ?window,
                "sample window normalised"
            );
        }
        let start = options.clock.now();
        Self {
            start,
            clock: options.clock,
            window,
            status_callback: options.status_callback,
            samples: SampleRing::new(window, RESOLUTION),
            completion: CompletionAvg::new(DEFAULT_COMPLETION_SAMPLES),
            done: 0,
            status: Status::new(total),
        }
    }

    /// Record `delta` more units of progress.
    ///
    /// Returns true when a new time bucket began; the cached status was then
    /// recomputed and the status callback (if any) has been called.
    pub fn update(&mut self, delta: u64) -> bool {
        let t = truncate(self.elapsed(), RESOLUTION);
        let changed = self.add(t, delta);
        self.done = self.done.saturating_add(delta);
        if changed {
            if let Some(cb) = self.status_callback.as_mut() {
                cb(self.status);
            }
        }
        changed
    }

    /// Status as of the last bucket advance.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Instant captured from the clock at construction.
    pub fn start(&self) -> Instant {
        self.start
    }

    /// Effective (normalised) sample window.
    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn total(&self) -> Option<u64> {
        self.status.total
    }

    /// Cumulative units recorded so far, including the current bucket.
    pub fn done(&self) -> u64 {
        self.done
    }

    /// Clock time since start; zero if the clock reads before start.
    pub fn elapsed(&self) -> Duration {
        self.clock.now().saturating_duration_since(self.start)
    }

    /// Number of slots the sample ring was allocated with.
    pub fn sample_capacity(&self) -> usize {
        self.samples.capacity()
    }

    fn add(&mut self, t: Duration, v: u64) -> bool {
        let last_t = self.samples.head_time();
        if t > last_t {
            // The status reflects the window before `v` lands in the new head.
            self.refresh_status(last_t, t);
        }
        self.samples.record(t, v).is_some()
    }

    fn refresh_status(&mut self, last_t: Duration, t: Duration) {
        let status = &mut self.status;
        status.done = self.done;
        status.window_sum = self.samples.sum();
        status.time_left = None;
        status.eta = None;

        if t >= self.window {
            if !status.accurate {
                tracing::debug!(elapsed = ?t, "throughput window filled");
            }
            status.accurate = true;
            status.window_span = self.window;
        } else {
            status.window_span = t;
        }

        tracing::trace!(
            elapsed = ?t,
            done = status.done,
            window_sum = status.window_sum,
            slots = self.samples.len(),
            "bucket advance"
        );

        if status.total.is_none() {
            return;
        }
        let Some(left) = status.time_left_estimate() else {
            return;
        };

        let finish = buckets(t.saturating_add(left));
        let confidence = buckets(t - last_t);
        self.completion.add(confidence, finish);

        if t < self.window {
            return;
        }
        if let Some(finish) = self.completion.value() {
            let finish_at = from_buckets(finish);
            status.time_left = Some(finish_at.saturating_sub(t));
            status.eta = self.start.checked_add(finish_at);
            tracing::trace!(
                finish_at = ?finish_at,
                samples = self.completion.len(),
                "completion estimate"
            );
        }
    }
}

impl fmt::Debug for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Progress")
            .field("start", &self.start)
            .field("window", &self.window)
            .field("done", &self.done)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

fn normalize_window(window: Duration) -> Duration {
    let window = truncate(window.min(MAX_WINDOW), RESOLUTION);
    if window.is_zero() {
        RESOLUTION
    } else {
        window
    }
}

/// Truncate `d` toward zero to a multiple of `res`.
fn truncate(d: Duration, res: Duration) -> Duration {
    let res_nanos = res.as_nanos();
    if res_nanos == 0 {
        return d;
    }
    let nanos = d.as_nanos() / res_nanos * res_nanos;
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

/// Whole buckets in `d`.
fn buckets(d: Duration) -> u64 {
    u64::try_from(d.as_nanos() / RESOLUTION.as_nanos()).unwrap_or(u64::MAX)
}

fn from_buckets(n: u64) -> Duration {
    let nanos = u128::from(n) * RESOLUTION.as_nanos();
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}
