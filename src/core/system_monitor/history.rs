use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::metrics::clamp_percent;

pub const DEFAULT_HISTORY_SIZE: usize = 60;

/// One hour of one-second ticks
pub const MAX_HISTORY_SIZE: usize = 3600;

/// A time-ordered metric tracked for history charts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Series {
    Cpu,
    Gpu,
    Memory,
    Upload,
    Download,
}

impl Series {
    pub const ALL: [Series; 5] = [
        Series::Cpu,
        Series::Gpu,
        Series::Memory,
        Series::Upload,
        Series::Download,
    ];

    fn index(self) -> usize {
        match self {
            Series::Cpu => 0,
            Series::Gpu => 1,
            Series::Memory => 2,
            Series::Upload => 3,
            Series::Download => 4,
        }
    }

    /// Percentage series are bounded to [0, 100]; rate series only from below.
    pub fn is_percentage(self) -> bool {
        matches!(self, Series::Cpu | Series::Gpu | Series::Memory)
    }

    fn coerce(self, value: f32) -> f32 {
        if self.is_percentage() {
            clamp_percent(value)
        } else if value.is_finite() {
            value.max(0.0)
        } else {
            0.0
        }
    }
}

/// Circular buffers storing metric history (for the bar charts)
///
/// Every series holds at most `capacity` values, oldest first. Appending to a
/// full series evicts its oldest value.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricHistory {
    capacity: usize,
    series: [VecDeque<f32>; 5],
}

impl MetricHistory {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, MAX_HISTORY_SIZE);
        Self {
            capacity,
            series: std::array::from_fn(|_| VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a value, coercing it instead of rejecting it.
    pub fn append(&mut self, series: Series, value: f32) {
        let queue = &mut self.series[series.index()];
        if queue.len() >= self.capacity {
            queue.pop_front();
        }
        queue.push_back(series.coerce(value));
    }

    pub fn len(&self, series: Series) -> usize {
        self.series[series.index()].len()
    }

    pub fn is_empty(&self, series: Series) -> bool {
        self.series[series.index()].is_empty()
    }

    pub fn latest(&self, series: Series) -> Option<f32> {
        self.series[series.index()].back().copied()
    }

    /// Values oldest to newest, up to `capacity` of them.
    pub fn snapshot_series(&self, series: Series) -> Vec<f32> {
        self.series[series.index()].iter().copied().collect()
    }

    /// Same as [`snapshot_series`](Self::snapshot_series) but left-padded with
    /// zeros to exactly `capacity` values, for full-width charts.
    pub fn padded_series(&self, series: Series) -> Vec<f32> {
        let queue = &self.series[series.index()];
        let mut out = vec![0.0; self.capacity - queue.len()];
        out.extend(queue.iter().copied());
        out
    }

    /// Scaled by 10 to keep one decimal for `u64`-based chart widgets
    pub fn series_as_u64(&self, series: Series) -> Vec<u64> {
        self.padded_series(series)
            .into_iter()
            .map(|v| (v * 10.0) as u64)
            .collect()
    }
}

impl Default for MetricHistory {
    fn default() -> Self {
        Self::new()
    }
}
