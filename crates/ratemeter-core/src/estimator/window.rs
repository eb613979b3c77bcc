//! Time-bucketed ring of throughput samples.

use std::time::Duration;

/// One bucket of the sample window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Slot {
    t: Duration,
    v: u64,
}

/// Fixed-capacity ring of `(bucket time, accumulated value)` slots covering a
/// trailing window of real time, plus the running sum of the active slots.
///
/// Slots from `r` to `w` (inclusive, wrapping) are active. Timestamps are
/// strictly increasing along `r -> w`; the slot at `w` keeps absorbing values
/// while time stays inside its bucket. Capacity is `window / resolution + 1`,
/// one full window plus the newest bucket.
#[derive(Debug, Clone)]
pub(crate) struct SampleRing {
    elem: Vec<Slot>,
    w: usize,
    r: usize,
    /// Wide enough that the sum of saturated slots never overflows.
    sum: u128,
    window: Duration,
}

impl SampleRing {
    /// `window` must already be a non-zero multiple of `resolution`.
    pub fn new(window: Duration, resolution: Duration) -> Self {
        let buckets = window.as_nanos() / resolution.as_nanos().max(1);
        let capacity = usize::try_from(buckets).unwrap_or(usize::MAX - 1) + 1;
        Self {
            elem: vec![Slot::default(); capacity],
            w: 0,
            r: 0,
            sum: 0,
            window,
        }
    }

    /// Record `v` at bucketised time `t`.
    ///
    /// Returns `None` when `t` falls into (or before) the head bucket and `v`
    /// was folded into it. Otherwise a new head slot is written, slots at or
    /// before `t - window` are evicted, and the previous head time is
    /// returned.
    pub fn record(&mut self, t: Duration, v: u64) -> Option<Duration> {
        let last_t = self.elem[self.w].t;
        if t <= last_t {
            let head = &mut self.elem[self.w];
            let before = head.v;
            head.v = head.v.saturating_add(v);
            self.sum += u128::from(head.v - before);
            return None;
        }

        self.w = (self.w + 1) % self.elem.len();
        if self.w == self.r {
            self.evict_oldest();
        }
        self.elem[self.w] = Slot { t, v };
        self.sum += u128::from(v);

        // Slots at or before the window start have expired; the head never does.
        if let Some(start) = t.checked_sub(self.window) {
            while self.r != self.w && self.elem[self.r].t <= start {
                self.evict_oldest();
            }
        }
        Some(last_t)
    }

    fn evict_oldest(&mut self) {
        self.sum -= u128::from(self.elem[self.r].v);
        self.r = (self.r + 1) % self.elem.len();
    }

    /// Sum of values across the active slots, saturating at `u64::MAX`.
    pub fn sum(&self) -> u64 {
        u64::try_from(self.sum).unwrap_or(u64::MAX)
    }

    /// Time of the head (newest) bucket.
    pub fn head_time(&self) -> Duration {
        self.elem[self.w].t
    }

    /// Number of active slots, head included.
    pub fn len(&self) -> usize {
        (self.w + self.elem.len() - self.r) % self.elem.len() + 1
    }

    pub fn capacity(&self) -> usize {
        self.elem.len()
    }

    #[cfg(test)]
    fn active(&self) -> Vec<(Duration, u64)> {
        (0..self.len())
            .map(|i| self.elem[(self.r + i) % self.elem.len()])
            .map(|s| (s.t, s.v))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RES: Duration = Duration::from_millis(100);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn capacity_covers_window_plus_head() {
        assert_eq!(SampleRing::new(Duration::from_secs(5), RES).capacity(), 51);
        assert_eq!(SampleRing::new(RES, RES).capacity(), 2);
    }

    #[test]
    fn equal_time_folds_into_head() {
        let mut ring = SampleRing::new(ms(500), RES);
        assert_eq!(ring.record(ms(0), 3), None);
        assert_eq!(ring.record(ms(0), 4), None);
        assert_eq!(ring.len(), 1);
        assert_eq!(ring.sum(), 7);
        assert_eq!(ring.active(), vec![(ms(0), 7)]);
    }

    #[test]
    fn earlier_time_folds_into_head() {
        let mut ring = SampleRing::new(ms(500), RES);
        assert_eq!(ring.record(ms(300), 1), Some(ms(0)));
        assert_eq!(ring.record(ms(100), 2), None);
        assert_eq!(ring.head_time(), ms(300));
        assert_eq!(ring.sum(), 3);
    }

    #[test]
    fn advance_returns_previous_head() {
        let mut ring = SampleRing::new(ms(500), RES);
        ring.record(ms(0), 1);
        assert_eq!(ring.record(ms(100), 1), Some(ms(0)));
        assert_eq!(ring.record(ms(400), 1), Some(ms(100)));
        assert_eq!(ring.head_time(), ms(400));
    }

    #[test]
    fn expired_slots_are_evicted() {
        let mut ring = SampleRing::new(ms(300), RES);
        for i in 0..4 {
            ring.record(ms(i * 100), 10);
        }
        // (0, 300] is active at t = 300
        assert_eq!(ring.active(), vec![(ms(100), 10), (ms(200), 10), (ms(300), 10)]);
        assert_eq!(ring.sum(), 30);

        ring.record(ms(1000), 5);
        assert_eq!(ring.active(), vec![(ms(1000), 5)]);
        assert_eq!(ring.sum(), 5);
    }

    #[test]
    fn head_is_never_evicted() {
        let mut ring = SampleRing::new(RES, RES);
        ring.record(ms(0), 1);
        ring.record(ms(5000), 2);
        assert_eq!(ring.len(), 1);
        assert_eq!(ring.sum(), 2);
        ring.record(ms(5000), 3);
        assert_eq!(ring.sum(), 5);
    }

    #[test]
    fn huge_values_saturate_instead_of_overflowing() {
        let mut ring = SampleRing::new(ms(300), RES);
        ring.record(ms(0), u64::MAX);
        ring.record(ms(0), 1);
        assert_eq!(ring.active(), vec![(ms(0), u64::MAX)]);
        assert_eq!(ring.sum(), u64::MAX);

        ring.record(ms(100), u64::MAX);
        assert_eq!(ring.sum(), u64::MAX);

        // both huge slots expire
        ring.record(ms(1000), 7);
        assert_eq!(ring.sum(), 7);
    }

    #[test]
    fn sum_tracks_active_slots_through_wraparound() {
        let mut ring = SampleRing::new(ms(500), RES);
        for i in 0..50u64 {
            ring.record(ms(i * 100), i);
            if i % 3 == 0 {
                ring.record(ms(i * 100), 1);
            }
            let expected: u64 = ring.active().iter().map(|(_, v)| v).sum();
            assert_eq!(ring.sum(), expected);
            assert!(ring.len() <= ring.capacity());
        }
    }
}
