// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use chrono::{NaiveDate, TimeDelta};
use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};
use pvqc_core::{QcError, TimeSeries};
use pvqc_gaps::{
    CompletenessConfig, DayStatus, InterpolationConfig, StaleConfig, TrimConfig,
    completeness_score, detect_interpolation, detect_stale, trim,
};

/// Hourly naive series with `counts[d]` samples on day `d`.
fn hourly_series(counts: &[usize]) -> Option<TimeSeries> {
    let origin = NaiveDate::from_ymd_opt(2022, 1, 1)?.and_hms_opt(0, 0, 0)?;
    let mut timestamps = Vec::new();
    for (day, &count) in counts.iter().enumerate() {
        for hour in 0..count {
            timestamps.push(origin + TimeDelta::days(day as i64) + TimeDelta::hours(hour as i64));
        }
    }
    if timestamps.is_empty() {
        return None;
    }
    let values = (0..timestamps.len()).map(|i| (i % 17) as f64).collect();
    let series = TimeSeries::from_naive(timestamps, values)
        .and_then(|series| series.with_freq(TimeDelta::hours(1)))
        .expect("generated index should be valid");
    Some(series)
}

fn day_counts() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(
        prop_oneof![3 => Just(24usize), 1 => 0usize..24],
        1..40,
    )
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 1024,
        failure_persistence: Some(Box::new(FileFailurePersistence::Direct("proptest-regressions/tests/proptest_invariants.txt"))),
        .. ProptestConfig::default()
    })]

    #[test]
    fn strictly_increasing_values_are_never_stale(
        steps in prop::collection::vec(1u32..1_000, 5..200),
        min_run in 2usize..6,
    ) {
        let values: Vec<f64> = steps
            .iter()
            .scan(0.0f64, |acc, &step| {
                *acc += f64::from(step);
                Some(*acc)
            })
            .collect();
        let detection = detect_stale(&values, &StaleConfig::exact(min_run))
            .expect("valid config");
        prop_assert!(!detection.mask.any());
    }

    #[test]
    fn stale_mask_is_the_union_of_long_runs(
        values in prop::collection::vec(prop_oneof![Just(1.0f64), Just(2.0), Just(f64::NAN)], 0..120),
        min_run in 2usize..6,
    ) {
        if values.len() < min_run {
            let err = detect_stale(&values, &StaleConfig::exact(min_run))
                .expect_err("shorter than one run");
            prop_assert!(matches!(err, QcError::Input(_) | QcError::InsufficientData(_)));
            return Ok(());
        }
        let detection = detect_stale(&values, &StaleConfig::exact(min_run))
            .expect("valid config");
        let mut covered = vec![false; values.len()];
        for run in &detection.runs {
            prop_assert!(run.len() >= min_run);
            let anchor = values[run.start];
            for idx in run.start..run.end {
                prop_assert_eq!(values[idx].to_bits(), anchor.to_bits());
                covered[idx] = true;
            }
        }
        prop_assert_eq!(detection.mask.as_slice(), covered.as_slice());
    }

    #[test]
    fn interpolation_runs_are_collinear(
        values in prop::collection::vec(prop_oneof![Just(0.0f64), Just(1.0), Just(2.0), Just(3.0)], 3..80),
    ) {
        let detection = detect_interpolation(&values, &InterpolationConfig::exact(3))
            .expect("valid config");
        for run in &detection.runs {
            prop_assert!(run.len() >= 3);
            let slope = values[run.start + 1] - values[run.start];
            for idx in run.start + 1..run.end {
                prop_assert_eq!(values[idx] - values[idx - 1], slope);
            }
        }
    }

    #[test]
    fn completeness_is_exactly_present_over_expected(counts in day_counts()) {
        let Some(series) = hourly_series(&counts) else {
            return Ok(());
        };
        let config = CompletenessConfig::default();
        let report = completeness_score(&series, &config, None).expect("valid series");
        let first_sampled = counts.iter().position(|&c| c > 0).expect("non-empty series");
        for (offset, (&score, status)) in report
            .scores()
            .values()
            .iter()
            .zip(report.statuses())
            .enumerate()
        {
            let count = counts[first_sampled + offset];
            if count == 0 {
                prop_assert_eq!(*status, DayStatus::Excluded);
                prop_assert!(score.is_nan());
                continue;
            }
            prop_assert_eq!(score, count as f64 / 24.0);
            let expected = if score >= config.threshold {
                DayStatus::Complete
            } else {
                DayStatus::Incomplete
            };
            prop_assert_eq!(*status, expected);
        }
    }

    #[test]
    fn trim_is_idempotent(
        counts in day_counts(),
        window_days in 1usize..6,
        min_fraction in prop_oneof![Just(0.5f64), Just(0.75), Just(1.0)],
    ) {
        let Some(series) = hourly_series(&counts) else {
            return Ok(());
        };
        let config = TrimConfig {
            window_days,
            min_fraction,
            ..TrimConfig::default()
        };
        let Some(once) = trim(&series, &config).expect("valid config") else {
            return Ok(());
        };
        let twice = trim(&once, &config)
            .expect("valid config")
            .expect("a trimmed series keeps its qualifying days");
        prop_assert_eq!(once, twice);
    }
}
