//! Property-based tests for the statistics aggregator
//!
//! Checks the ordering and accounting invariants of `Summary` over arbitrary
//! sequences of successful and failed probes.

use super::{lin_interp_quantile, StatsAggregator};
use crate::{error::ProbeError, models::ProbeResult};
use proptest::collection::vec;
use proptest::prelude::*;
use std::time::Duration;

/// Property-based test generators
mod generators {
    use super::*;

    /// A probe outcome: (duration in microseconds, connected)
    pub fn probe_outcome() -> impl Strategy<Value = (u64, bool)> {
        (0u64..5_000_000, prop::bool::weighted(0.8))
    }

    pub fn outcomes() -> impl Strategy<Value = Vec<(u64, bool)>> {
        vec(probe_outcome(), 1..300)
    }

    pub fn sorted_samples() -> impl Strategy<Value = Vec<f64>> {
        vec(0.0f64..1e10, 1..500).prop_map(|mut values| {
            values.sort_by(f64::total_cmp);
            values
        })
    }
}

fn to_result((micros, connected): (u64, bool)) -> ProbeResult {
    let duration = Duration::from_micros(micros);
    if connected {
        ProbeResult::success(duration)
    } else {
        ProbeResult::failure(ProbeError::Other("refused".into()), duration)
    }
}

proptest! {
    /// min <= p50 <= p95 <= p99 <= max for any non-empty sample
    #[test]
    fn quantiles_are_monotonic(outcomes in generators::outcomes()) {
        let mut stats = StatsAggregator::new();
        for outcome in outcomes {
            stats.observe(&to_result(outcome));
        }
        let summary = stats.summarize();

        prop_assert!(summary.min <= summary.p50);
        prop_assert!(summary.p50 <= summary.p95);
        prop_assert!(summary.p95 <= summary.p99);
        prop_assert!(summary.p99 <= summary.max);
    }

    /// total == successes + failures after every observation
    #[test]
    fn accounting_holds_at_every_step(outcomes in generators::outcomes()) {
        let mut stats = StatsAggregator::new();
        let mut expected_failures = 0;
        for (i, outcome) in outcomes.iter().enumerate() {
            stats.observe(&to_result(*outcome));
            if !outcome.1 {
                expected_failures += 1;
            }
            prop_assert_eq!(stats.total(), i + 1);
            prop_assert_eq!(stats.failures(), expected_failures);
            prop_assert_eq!(stats.successes() + stats.failures(), stats.total());
        }

        let summary = stats.summarize();
        prop_assert_eq!(summary.successes + summary.failures, summary.total);
    }

    /// Min and max are the literal extremes of the observed durations
    #[test]
    fn extremes_are_observed_values(outcomes in generators::outcomes()) {
        let mut stats = StatsAggregator::new();
        for outcome in &outcomes {
            stats.observe(&to_result(*outcome));
        }
        let summary = stats.summarize();

        let min = outcomes.iter().map(|o| o.0).min().unwrap();
        let max = outcomes.iter().map(|o| o.0).max().unwrap();
        prop_assert_eq!(summary.min, Duration::from_micros(min));
        prop_assert_eq!(summary.max, Duration::from_micros(max));
    }

    /// Mean lies between min and max
    #[test]
    fn mean_between_min_max(outcomes in generators::outcomes()) {
        let mut stats = StatsAggregator::new();
        for outcome in outcomes {
            stats.observe(&to_result(outcome));
        }
        let summary = stats.summarize();

        // the mean is truncated to whole nanoseconds
        prop_assert!(summary.mean + Duration::from_nanos(1) >= summary.min);
        prop_assert!(summary.mean <= summary.max);
    }

    /// The estimator never leaves the sample range and grows with p
    #[test]
    fn lin_interp_is_bounded_and_monotonic(samples in generators::sorted_samples(), a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let q_lo = lin_interp_quantile(lo, &samples);
        let q_hi = lin_interp_quantile(hi, &samples);
        let first = samples[0];
        let last = samples[samples.len() - 1];
        let eps = last.abs() * 1e-12 + 1e-9;

        prop_assert!(q_lo >= first - eps);
        prop_assert!(q_hi <= last + eps);
        prop_assert!(q_lo <= q_hi + eps);
    }

    /// Order of observation does not affect the summary
    #[test]
    fn summary_is_order_independent(outcomes in generators::outcomes()) {
        let mut forward = StatsAggregator::new();
        let mut backward = StatsAggregator::new();
        for outcome in &outcomes {
            forward.observe(&to_result(*outcome));
        }
        for outcome in outcomes.iter().rev() {
            backward.observe(&to_result(*outcome));
        }
        prop_assert_eq!(forward.summarize(), backward.summarize());
    }
}

#[test]
fn test_constant_samples_collapse_all_statistics() {
    let mut stats = StatsAggregator::new();
    for _ in 0..50 {
        stats.observe(&ProbeResult::success(Duration::from_millis(7)));
    }
    let summary = stats.summarize();
    let seven = Duration::from_millis(7);

    assert_eq!(summary.min, seven);
    assert_eq!(summary.p50, seven);
    assert_eq!(summary.p95, seven);
    assert_eq!(summary.p99, seven);
    assert_eq!(summary.max, seven);
    assert_eq!(summary.mean, seven);
}

#[test]
fn test_hundred_samples_percentiles() {
    let mut stats = StatsAggregator::new();
    for ms in 1..=100 {
        stats.observe(&ProbeResult::success(Duration::from_millis(ms)));
    }
    let summary = stats.summarize();

    assert_eq!(summary.min, Duration::from_millis(1));
    assert_eq!(summary.max, Duration::from_millis(100));
    assert_eq!(summary.p50, Duration::from_millis(50));
    assert_eq!(summary.p95, Duration::from_millis(95));
    assert_eq!(summary.p99, Duration::from_millis(99));
}
