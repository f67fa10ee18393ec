// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Change-date scoring and deterministic synthetic PV data for pvqc.

pub mod synthetic;

use chrono::{Datelike, NaiveDate};
use pvqc_core::QcError;

/// Precision/recall/F1 summary for tolerance-based matching.
#[derive(Clone, Debug, PartialEq)]
pub struct F1Metrics {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Aggregated change-date metrics.
#[derive(Clone, Debug, PartialEq)]
pub struct ChangeDateMetrics {
    pub f1: F1Metrics,
    pub hausdorff_days: u64,
    pub annotation_error_days: f64,
}

/// Scores detected change dates against known ones.
///
/// Returns an error when exactly one side is empty, because the distance
/// metrics are undefined for that case.
pub fn change_date_metrics(
    detected: &[NaiveDate],
    truth: &[NaiveDate],
    tolerance_days: u64,
) -> Result<ChangeDateMetrics, QcError> {
    let detected_days = day_numbers(detected, "detected")?;
    let truth_days = day_numbers(truth, "true")?;
    if exactly_one_empty(&detected_days, &truth_days) {
        return Err(QcError::input(
            "change-date metrics are undefined when exactly one date set is empty",
        ));
    }

    Ok(ChangeDateMetrics {
        f1: f1_from_days(&detected_days, &truth_days, tolerance_days),
        hausdorff_days: hausdorff_from_days(&detected_days, &truth_days),
        annotation_error_days: annotation_from_days(&detected_days, &truth_days),
    })
}

/// Computes precision, recall, and F1 using one-to-one matching within
/// `tolerance_days`.
pub fn f1_with_tolerance(
    detected: &[NaiveDate],
    truth: &[NaiveDate],
    tolerance_days: u64,
) -> Result<F1Metrics, QcError> {
    let detected_days = day_numbers(detected, "detected")?;
    let truth_days = day_numbers(truth, "true")?;
    Ok(f1_from_days(&detected_days, &truth_days, tolerance_days))
}

/// Symmetric Hausdorff distance between two change-date sets, in days.
pub fn hausdorff_days(detected: &[NaiveDate], truth: &[NaiveDate]) -> Result<u64, QcError> {
    let detected_days = day_numbers(detected, "detected")?;
    let truth_days = day_numbers(truth, "true")?;
    if exactly_one_empty(&detected_days, &truth_days) {
        return Err(QcError::input(
            "hausdorff distance is undefined when exactly one date set is empty",
        ));
    }
    Ok(hausdorff_from_days(&detected_days, &truth_days))
}

fn day_numbers(dates: &[NaiveDate], label: &str) -> Result<Vec<i64>, QcError> {
    for (idx, pair) in dates.windows(2).enumerate() {
        if pair[1] <= pair[0] {
            return Err(QcError::input(format!(
                "{label} change dates must be strictly increasing; got {} then {} at index {}",
                pair[0],
                pair[1],
                idx + 1
            )));
        }
    }
    Ok(dates
        .iter()
        .map(|date| i64::from(date.num_days_from_ce()))
        .collect())
}

fn exactly_one_empty(a: &[i64], b: &[i64]) -> bool {
    a.is_empty() != b.is_empty()
}

fn f1_from_days(detected: &[i64], truth: &[i64], tolerance: u64) -> F1Metrics {
    let true_positives = count_tolerance_matches(detected, truth, tolerance);
    let false_positives = detected.len() - true_positives;
    let false_negatives = truth.len() - true_positives;

    if detected.is_empty() && truth.is_empty() {
        return F1Metrics {
            true_positives,
            false_positives,
            false_negatives,
            precision: 1.0,
            recall: 1.0,
            f1: 1.0,
        };
    }

    let precision = if detected.is_empty() {
        0.0
    } else {
        true_positives as f64 / detected.len() as f64
    };
    let recall = if truth.is_empty() {
        0.0
    } else {
        true_positives as f64 / truth.len() as f64
    };
    let f1 = if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    };

    F1Metrics {
        true_positives,
        false_positives,
        false_negatives,
        precision,
        recall,
        f1,
    }
}

fn hausdorff_from_days(detected: &[i64], truth: &[i64]) -> u64 {
    directed_hausdorff(detected, truth).max(directed_hausdorff(truth, detected))
}

fn annotation_from_days(detected: &[i64], truth: &[i64]) -> f64 {
    if detected.is_empty() {
        return 0.0;
    }
    let total = detected
        .iter()
        .map(|&day| nearest_distance(day, truth))
        .sum::<u64>();
    total as f64 / detected.len() as f64
}

fn count_tolerance_matches(detected: &[i64], truth: &[i64], tolerance: u64) -> usize {
    let mut i = 0usize;
    let mut j = 0usize;
    let mut matches = 0usize;

    while i < detected.len() && j < truth.len() {
        let d = detected[i];
        let t = truth[j];
        if d.abs_diff(t) <= tolerance {
            matches += 1;
            i += 1;
            j += 1;
            continue;
        }
        if d < t {
            i += 1;
        } else {
            j += 1;
        }
    }

    matches
}

fn directed_hausdorff(a: &[i64], b: &[i64]) -> u64 {
    a.iter()
        .map(|&day| nearest_distance(day, b))
        .max()
        .unwrap_or(0)
}

fn nearest_distance(day: i64, sorted: &[i64]) -> u64 {
    let insertion = sorted.partition_point(|&candidate| candidate < day);
    let mut best = u64::MAX;
    if insertion < sorted.len() {
        best = best.min(day.abs_diff(sorted[insertion]));
    }
    if insertion > 0 {
        best = best.min(day.abs_diff(sorted[insertion - 1]));
    }
    best
}

#[cfg(test)]
mod tests {
    use super::{change_date_metrics, f1_with_tolerance, hausdorff_days};
    use chrono::NaiveDate;

    fn day(offset: u64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 1, 1)
            .and_then(|d| d.checked_add_days(chrono::Days::new(offset)))
            .expect("valid date")
    }

    #[test]
    fn f1_matches_within_tolerance() {
        let metrics =
            f1_with_tolerance(&[day(10), day(50)], &[day(12), day(90)], 3).expect("f1");
        assert_eq!(metrics.true_positives, 1);
        assert_eq!(metrics.false_positives, 1);
        assert_eq!(metrics.false_negatives, 1);
        assert!((metrics.f1 - 0.5).abs() < 1e-12);
    }

    #[test]
    fn f1_empty_sets() {
        let both = f1_with_tolerance(&[], &[], 0).expect("f1");
        assert_eq!(both.f1, 1.0);
        let missed = f1_with_tolerance(&[], &[day(3)], 0).expect("f1");
        assert_eq!(missed.recall, 0.0);
        assert_eq!(missed.f1, 0.0);
    }

    #[test]
    fn matching_is_one_to_one() {
        let metrics = f1_with_tolerance(&[day(9), day(10), day(11)], &[day(10)], 2).expect("f1");
        assert_eq!(metrics.true_positives, 1);
        assert_eq!(metrics.false_positives, 2);
    }

    #[test]
    fn hausdorff_crosses_year_boundaries() {
        let detected = [NaiveDate::from_ymd_opt(2021, 12, 30).expect("valid date")];
        assert_eq!(hausdorff_days(&detected, &[day(2)]).expect("hausdorff"), 4);
        assert!(hausdorff_days(&detected, &[]).is_err());
        assert_eq!(hausdorff_days(&[], &[]).expect("hausdorff"), 0);
    }

    #[test]
    fn aggregated_metrics_report_annotation_error() {
        let metrics =
            change_date_metrics(&[day(5), day(40)], &[day(7), day(30)], 5).expect("metrics");
        assert_eq!(metrics.hausdorff_days, 10);
        assert!((metrics.annotation_error_days - 6.0).abs() < 1e-12);
        assert_eq!(metrics.f1.true_positives, 1);
    }

    #[test]
    fn unsorted_dates_are_rejected() {
        let err = f1_with_tolerance(&[day(5), day(5)], &[], 0).expect_err("duplicate");
        assert!(err.to_string().contains("strictly increasing"));
    }
}
