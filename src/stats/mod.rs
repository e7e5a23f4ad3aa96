//! Latency statistics accumulated over one scheduler run

use crate::models::ProbeResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Summary of a finished run.
///
/// Derived on demand from the aggregator; all fields are zero when no probe
/// was counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub successes: usize,
    pub failures: usize,
    pub min: Duration,
    pub max: Duration,
    pub mean: Duration,
    pub p50: Duration,
    pub p95: Duration,
    pub p99: Duration,
}

impl Summary {
    /// Percentage of counted probes that connected
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.successes as f64 / self.total as f64 * 100.0
        }
    }
}

/// Accumulates probe durations and failures.
///
/// Durations are stored as nanoseconds. Samples are only appended while a
/// run is active; `summarize` sorts them in place.
#[derive(Debug, Default)]
pub struct StatsAggregator {
    durations: Vec<f64>,
    failed: usize,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one result. Failures count with their time to failure.
    ///
    /// The caller decides what is a sample: results aborted by shutdown must
    /// be filtered out before they get here.
    pub fn observe(&mut self, result: &ProbeResult) {
        self.durations.push(result.duration.as_nanos() as f64);
        if !result.connected {
            self.failed += 1;
        }
    }

    pub fn total(&self) -> usize {
        self.durations.len()
    }

    pub fn failures(&self) -> usize {
        self.failed
    }

    pub fn successes(&self) -> usize {
        self.total() - self.failures()
    }

    pub fn is_empty(&self) -> bool {
        self.durations.is_empty()
    }

    /// Compute the summary over every sample observed so far
    pub fn summarize(&mut self) -> Summary {
        if self.durations.is_empty() {
            return Summary {
                failures: self.failed,
                ..Summary::default()
            };
        }

        self.durations.sort_by(f64::total_cmp);
        let sorted = &self.durations;

        Summary {
            total: self.total(),
            successes: self.successes(),
            failures: self.failures(),
            min: nanos(empirical_quantile(0.0, sorted)),
            max: nanos(empirical_quantile(1.0, sorted)),
            mean: nanos(mean(sorted)),
            p50: nanos(lin_interp_quantile(0.50, sorted)),
            p95: nanos(lin_interp_quantile(0.95, sorted)),
            p99: nanos(lin_interp_quantile(0.99, sorted)),
        }
    }
}

/// Quantile by linear interpolation of the empirical CDF.
///
/// Sample `k` (1-based) sits at cumulative weight `k`; `p * n` is located
/// between two neighbouring ranks and the value interpolated between them.
/// `sorted` must be ascending. Returns 0 for an empty slice.
pub fn lin_interp_quantile(p: f64, sorted: &[f64]) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let p = p.clamp(0.0, 1.0);
    let target = p * sorted.len() as f64;

    for (i, &value) in sorted.iter().enumerate() {
        let cumulative = (i + 1) as f64;
        if cumulative >= target {
            if i == 0 {
                return value;
            }
            let t = cumulative - target;
            let previous = sorted[i - 1];
            return previous + (1.0 - t) * (value - previous);
        }
    }
    sorted[sorted.len() - 1]
}

/// Quantile returning an observed sample (lower empirical estimator).
///
/// `p = 0` is the minimum and `p = 1` the maximum. Returns 0 for an empty
/// slice.
pub fn empirical_quantile(p: f64, sorted: &[f64]) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let p = p.clamp(0.0, 1.0);
    let target = p * sorted.len() as f64;

    for (i, &value) in sorted.iter().enumerate() {
        if (i + 1) as f64 >= target {
            return value;
        }
    }
    sorted[sorted.len() - 1]
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn nanos(value: f64) -> Duration {
    if value.is_finite() && value > 0.0 {
        Duration::from_nanos(value as u64)
    } else {
        Duration::ZERO
    }
}

#[cfg(test)]
mod comprehensive_tests;
