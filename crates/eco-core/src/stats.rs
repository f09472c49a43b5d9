//! Streaming statistics: running moments, inequality, histograms.

use serde::{Deserialize, Serialize};

/// Welford's online mean and variance with min/max tracking.
///
/// Single pass, O(1) memory. All accessors return 0 before the first push, and
/// `sd` stays 0 until two samples have been seen.
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    n: u64,
    mean: f64,
    /// Sum of squared differences from the mean
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, x: f64) {
        self.n += 1;
        let delta = x - self.mean;
        self.mean += delta / self.n as f64;
        self.m2 += delta * (x - self.mean);
        if self.n == 1 {
            self.min = x;
            self.max = x;
        } else {
            self.min = self.min.min(x);
            self.max = self.max.max(x);
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn count(&self) -> u64 {
        self.n
    }

    pub fn avg(&self) -> f64 {
        self.mean
    }

    /// Sample standard deviation
    pub fn sd(&self) -> f64 {
        if self.n > 1 {
            (self.m2 / (self.n - 1) as f64).sqrt()
        } else {
            0.0
        }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

impl Extend<f64> for RunningStats {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for x in iter {
            self.push(x);
        }
    }
}

impl FromIterator<f64> for RunningStats {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut stats = Self::new();
        stats.extend(iter);
        stats
    }
}

/// Gini coefficient of non-negative values, in `[0, 1)`.
///
/// Sorts a copy, so each call is O(n log n). Empty, all-zero and constant
/// inputs yield 0.
pub fn calculate_gini(values: &[f64]) -> f64 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let total: f64 = sorted.iter().sum();
    if total <= 0.0 || sorted[0] == sorted[n - 1] {
        return 0.0;
    }

    let weighted: f64 = sorted
        .iter()
        .enumerate()
        .map(|(i, x)| (i + 1) as f64 * x)
        .sum();
    let n = n as f64;
    let gini = 2.0 * weighted / (n * total) - (n + 1.0) / n;
    gini.max(0.0)
}

/// Fixed-width histogram over `[min, max)`; out-of-range samples land in the
/// first or last bin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Histogram {
    bins: Vec<u32>,
    min: f64,
    bin_width: f64,
}

impl Histogram {
    /// `bins` is at least 1.
    pub fn new(bins: usize, min: f64, max: f64) -> Self {
        let bins = bins.max(1);
        Self {
            bins: vec![0; bins],
            min,
            bin_width: (max - min) / bins as f64,
        }
    }

    pub fn reset(&mut self) {
        self.bins.iter_mut().for_each(|b| *b = 0);
    }

    pub fn add(&mut self, value: f64) {
        let last = self.bins.len() - 1;
        let raw = ((value - self.min) / self.bin_width).floor();
        let index = if raw.is_nan() || raw < 0.0 {
            0
        } else {
            (raw as usize).min(last)
        };
        self.bins[index] += 1;
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.iter().all(|&b| b == 0)
    }

    pub fn counts(&self) -> &[u32] {
        &self.bins
    }

    pub fn to_vec(&self) -> Vec<u32> {
        self.bins.clone()
    }
}
