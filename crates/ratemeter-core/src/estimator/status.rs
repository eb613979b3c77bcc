//! Status snapshot and its one-line rendering.

use std::fmt::{self, Write as _};
use std::time::{Duration, Instant};

/// Throughput suffixes, one per factor of 1000.
const SUFFIXES: [&str; 6] = ["", "ki", "Mi", "Gi", "Ti", "Ei"];

/// Quantities derived by the estimator at the last bucket boundary.
///
/// `window_sum / window_span` is the current throughput in units per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    /// Cumulative units seen before the last bucket advance.
    pub done: u64,
    /// Expected total, `None` when unknown.
    pub total: Option<u64>,
    /// True once the elapsed time has reached the sample window. Never clears.
    pub accurate: bool,
    /// Predicted time left; only published when the total is known, the
    /// window is full and the completion average has data.
    pub time_left: Option<Duration>,
    /// Predicted completion instant, published together with `time_left`.
    pub eta: Option<Instant>,
    /// Sum of units inside the sample window.
    pub window_sum: u64,
    /// Time spanned by the sample window, capped at the window length.
    pub window_span: Duration,
}

impl Status {
    pub(crate) fn new(total: Option<u64>) -> Self {
        Self {
            done: 0,
            total: total.filter(|&t| t > 0),
            accurate: false,
            time_left: None,
            eta: None,
            window_sum: 0,
            window_span: Duration::ZERO,
        }
    }

    /// Units per second over the sample window, `0.0` for an empty span.
    pub fn throughput(&self) -> f64 {
        if self.window_span.is_zero() {
            return 0.0;
        }
        self.window_sum as f64 / self.window_span.as_secs_f64()
    }

    /// Time left at the current throughput.
    ///
    /// `None` when the total is unknown, the window span is empty, or the
    /// throughput is below one unit per second.
    pub fn time_left_estimate(&self) -> Option<Duration> {
        let total = self.total?;
        if self.window_span.is_zero() {
            return None;
        }
        let throughput = self.throughput();
        if throughput < 1.0 {
            return None;
        }
        let left = total.saturating_sub(self.done) as f64;
        Duration::try_from_secs_f64(left / throughput).ok()
    }

    /// Published time left together with the accuracy flag.
    pub fn time_remaining(&self) -> (Option<Duration>, bool) {
        (self.time_left, self.accurate)
    }

    /// Completed fraction in `[0.0, 1.0]`, `None` when the total is unknown.
    pub fn fraction(&self) -> Option<f64> {
        self.total
            .map(|total| (self.done as f64 / total as f64).min(1.0))
    }

    /// Done as a percentage of the total, uncapped.
    pub fn percentage(&self) -> Option<f64> {
        self.total
            .map(|total| self.done as f64 * 100.0 / total as f64)
    }
}

impl fmt::Display for Status {
    /// `"  42.00%  1.5 MiB/s  ETA 1m2s"`; the percentage only appears with a
    /// known total and the ETA only while a positive time left is published.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(pct) = self.percentage() {
            write!(f, "{pct:7.2}%  ")?;
        }

        let mut tp = self.throughput();
        let mut sfx = 0;
        while tp > 999.0 && sfx + 1 < SUFFIXES.len() {
            sfx += 1;
            tp /= 1000.0;
        }
        if tp <= 0.0 {
            f.write_str("0 ")?;
        } else if tp < 10.0 {
            write!(f, "{tp:.1} {}", SUFFIXES[sfx])?;
        } else {
            write!(f, "{tp:.0} {}", SUFFIXES[sfx])?;
        }
        f.write_str("B/s")?;

        if let Some(left) = self.time_left.filter(|d| !d.is_zero()) {
            write!(f, "  ETA {}", format_duration(left))?;
        }
        Ok(())
    }
}

/// Format `d` truncated to whole seconds as `1h2m3s`, `4m0s` or `59s`.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    let (h, m, s) = (secs / 3600, secs % 3600 / 60, secs % 60);
    let mut out = String::new();
    if h > 0 {
        let _ = write!(out, "{h}h{m}m");
    } else if m > 0 {
        let _ = write!(out, "{m}m");
    }
    let _ = write!(out, "{s}s");
    out
}
