// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use chrono::{NaiveDate, TimeDelta};
use pvqc_core::{DailyAggregate, Mask, QcError, TimeSeries, require_unit_interval, validate_freq};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Daily completeness parameters.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct CompletenessConfig {
    /// Minimum fraction for a day to count as complete.
    pub threshold: f64,
    /// Leave days without any index entry out of scoring instead of scoring 0.
    pub exclude_unsampled_days: bool,
}

impl Default for CompletenessConfig {
    fn default() -> Self {
        Self {
            threshold: 1.0 - 1e-9,
            exclude_unsampled_days: true,
        }
    }
}

impl CompletenessConfig {
    pub fn validate(&self) -> Result<(), QcError> {
        require_unit_interval(self.threshold, "completeness.threshold")
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DayStatus {
    Complete,
    Incomplete,
    /// Not scored; neither complete nor incomplete.
    Excluded,
}

/// Per-day completeness scores and classification.
#[derive(Clone, Debug, PartialEq)]
pub struct CompletenessReport {
    scores: DailyAggregate,
    statuses: Vec<DayStatus>,
    expected_per_day: usize,
}

impl CompletenessReport {
    /// Present over expected samples per day; `NaN` on excluded days.
    pub fn scores(&self) -> &DailyAggregate {
        &self.scores
    }

    pub fn statuses(&self) -> &[DayStatus] {
        &self.statuses
    }

    pub fn expected_per_day(&self) -> usize {
        self.expected_per_day
    }

    pub fn status(&self, date: NaiveDate) -> Option<DayStatus> {
        self.scores.index_of(date).map(|idx| self.statuses[idx])
    }

    /// One flag per day of the range, `true` for complete days.
    pub fn complete_days(&self) -> Vec<bool> {
        self.statuses
            .iter()
            .map(|status| *status == DayStatus::Complete)
            .collect()
    }

    pub fn complete_count(&self) -> usize {
        self.statuses
            .iter()
            .filter(|status| **status == DayStatus::Complete)
            .count()
    }

    /// Mean score over scored days; `NaN` when every day is excluded.
    pub fn average(&self) -> f64 {
        let scored: Vec<f64> = self
            .scores
            .values()
            .iter()
            .zip(&self.statuses)
            .filter(|(_, status)| **status != DayStatus::Excluded)
            .map(|(&score, _)| score)
            .collect();
        if scored.is_empty() {
            return f64::NAN;
        }
        scored.iter().sum::<f64>() / scored.len() as f64
    }
}

/// Samples a full day holds at `freq`.
pub fn expected_samples_per_day(freq: TimeDelta) -> Result<usize, QcError> {
    validate_freq(freq)?;
    if freq < TimeDelta::milliseconds(1) {
        return Err(QcError::configuration(format!(
            "frequency must be at least 1ms; got {freq}"
        )));
    }
    let freq_seconds = freq.num_milliseconds() as f64 / 1_000.0;
    let expected = (SECONDS_PER_DAY / freq_seconds).round();
    if expected < 1.0 {
        return Err(QcError::configuration(format!(
            "frequency {freq} yields no expected samples per day"
        )));
    }
    Ok(expected as usize)
}

/// Scores each calendar day of the series.
///
/// A sample is present when its value is finite and `exclude` (if given)
/// does not flag it.
pub fn completeness_score(
    series: &TimeSeries,
    config: &CompletenessConfig,
    exclude: Option<&Mask>,
) -> Result<CompletenessReport, QcError> {
    config.validate()?;
    if let Some(mask) = exclude {
        mask.check_aligned(series.len(), "exclusion mask")?;
    }
    let expected_per_day = expected_samples_per_day(series.effective_freq()?)?;

    let (first, last) = series.day_range();
    let n_days = (last - first).num_days() as usize + 1;
    let mut indexed = vec![0usize; n_days];
    let mut present = vec![0usize; n_days];
    for (idx, (ts, value)) in series.timestamps().iter().zip(series.values()).enumerate() {
        let day = (ts.date_naive() - first).num_days() as usize;
        indexed[day] += 1;
        let excluded = exclude.is_some_and(|mask| mask.as_slice()[idx]);
        if value.is_finite() && !excluded {
            present[day] += 1;
        }
    }

    let mut scores = Vec::with_capacity(n_days);
    let mut statuses = Vec::with_capacity(n_days);
    for day in 0..n_days {
        if indexed[day] == 0 && config.exclude_unsampled_days {
            scores.push(f64::NAN);
            statuses.push(DayStatus::Excluded);
            continue;
        }
        let score = present[day] as f64 / expected_per_day as f64;
        scores.push(score);
        statuses.push(if score >= config.threshold {
            DayStatus::Complete
        } else {
            DayStatus::Incomplete
        });
    }

    let report = CompletenessReport {
        scores: DailyAggregate::new(first, scores)?,
        statuses,
        expected_per_day,
    };
    log::debug!(
        "completeness: days={} complete={} expected_per_day={}",
        n_days,
        report.complete_count(),
        expected_per_day
    );
    Ok(report)
}

/// Flags every sample whose calendar day is complete.
pub fn complete_mask(
    series: &TimeSeries,
    config: &CompletenessConfig,
    exclude: Option<&Mask>,
) -> Result<Mask, QcError> {
    let report = completeness_score(series, config, exclude)?;
    Ok(series
        .timestamps()
        .iter()
        .map(|ts| report.status(ts.date_naive()) == Some(DayStatus::Complete))
        .collect())
}
