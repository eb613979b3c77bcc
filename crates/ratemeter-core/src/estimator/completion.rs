//! Weighted moving average of predicted completion times.

/// Fixed-capacity ring of `(weight, value)` pairs reporting
/// `sum(weight * value) / sum(weight)`.
///
/// Values are absolute finish predictions in buckets since start; weights are
/// the size of the bucket jump each prediction was made at, so estimates drawn
/// from longer observed intervals count for more.
#[derive(Debug, Clone)]
pub(crate) struct CompletionAvg {
    elem: Vec<Entry>,
    /// Index of the newest entry.
    w: usize,
    /// Index of the oldest entry.
    r: usize,
    len: usize,
    sum_w: u64,
    sum_wv: u128,
}

#[derive(Debug, Clone, Copy, Default)]
struct Entry {
    weight: u64,
    value: u64,
}

impl CompletionAvg {
    /// New empty averager holding at most `capacity` entries (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            elem: vec![Entry::default(); capacity],
            w: capacity - 1,
            r: 0,
            len: 0,
            sum_w: 0,
            sum_wv: 0,
        }
    }

    /// Add a prediction. Zero-weight entries are ignored; when full the oldest
    /// entry is evicted first.
    pub fn add(&mut self, weight: u64, value: u64) {
        if weight == 0 {
            return;
        }
        self.w = (self.w + 1) % self.elem.len();
        if self.len == self.elem.len() {
            let old = self.elem[self.r];
            self.sum_w -= old.weight;
            self.sum_wv -= u128::from(old.weight) * u128::from(old.value);
            self.r = (self.r + 1) % self.elem.len();
        } else {
            self.len += 1;
        }
        self.elem[self.w] = Entry { weight, value };
        self.sum_w += weight;
        self.sum_wv += u128::from(weight) * u128::from(value);
    }

    /// Weighted average in buckets, or `None` while empty.
    pub fn value(&self) -> Option<u64> {
        if self.sum_w == 0 {
            return None;
        }
        let avg = self.sum_wv / u128::from(self.sum_w);
        Some(u64::try_from(avg).unwrap_or(u64::MAX))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[cfg(test)]
    pub fn capacity(&self) -> usize {
        self.elem.len()
    }
}
