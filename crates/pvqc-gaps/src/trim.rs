// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::completeness::{CompletenessConfig, completeness_score};
use chrono::NaiveDate;
use pvqc_core::{Mask, QcError, TimeSeries, require_finite};

/// Leading/trailing trimming parameters.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct TrimConfig {
    /// Length in days of the density window.
    pub window_days: usize,
    /// Fraction of complete days the window must reach.
    pub min_fraction: f64,
    pub completeness: CompletenessConfig,
}

impl Default for TrimConfig {
    fn default() -> Self {
        Self {
            window_days: 10,
            min_fraction: 1.0,
            completeness: CompletenessConfig::default(),
        }
    }
}

impl TrimConfig {
    pub fn validate(&self) -> Result<(), QcError> {
        if self.window_days == 0 {
            return Err(QcError::configuration(
                "trim.window_days must be >= 1; got 0",
            ));
        }
        require_finite(self.min_fraction, "trim.min_fraction")?;
        if self.min_fraction <= 0.0 || self.min_fraction > 1.0 {
            return Err(QcError::configuration(format!(
                "trim.min_fraction must be in (0.0, 1.0]; got {}",
                self.min_fraction
            )));
        }
        self.completeness.validate()
    }
}

/// First and last day kept by trimming, or `None` when no day qualifies.
pub fn start_stop_dates(
    series: &TimeSeries,
    config: &TrimConfig,
) -> Result<Option<(NaiveDate, NaiveDate)>, QcError> {
    config.validate()?;
    let report = completeness_score(series, &config.completeness, None)?;
    let complete = report.complete_days();
    let window = config.window_days;

    // prefix[i] = complete days in [0, i)
    let mut prefix = Vec::with_capacity(complete.len() + 1);
    prefix.push(0usize);
    for &flag in &complete {
        let last = prefix[prefix.len() - 1];
        prefix.push(last + usize::from(flag));
    }
    let n = complete.len();
    let dense = |count: usize| count as f64 / window as f64 >= config.min_fraction;

    let start = (0..n).find(|&day| {
        let stop = (day + window).min(n);
        complete[day] && dense(prefix[stop] - prefix[day])
    });
    let end = (0..n).rev().find(|&day| {
        let begin = (day + 1).saturating_sub(window);
        complete[day] && dense(prefix[day + 1] - prefix[begin])
    });

    let bounds = match (start, end) {
        (Some(start), Some(end)) if start <= end => {
            match (report.scores().date(start), report.scores().date(end)) {
                (Some(first), Some(last)) => Some((first, last)),
                _ => None,
            }
        }
        _ => None,
    };
    log::debug!("trim bounds: {bounds:?} over {n} days (window={window})");
    Ok(bounds)
}

/// Sample-aligned mask of the samples kept by trimming.
pub fn trim_mask(series: &TimeSeries, config: &TrimConfig) -> Result<Mask, QcError> {
    let bounds = start_stop_dates(series, config)?;
    Ok(series
        .timestamps()
        .iter()
        .map(|ts| {
            let date = ts.date_naive();
            bounds.is_some_and(|(first, last)| date >= first && date <= last)
        })
        .collect())
}

/// Drops whole days before the first and after the last qualifying day.
///
/// Kept samples retain their timestamps, offsets and values, and the
/// result carries the source's nominal frequency. Returns `None` when no
/// day qualifies.
pub fn trim(series: &TimeSeries, config: &TrimConfig) -> Result<Option<TimeSeries>, QcError> {
    match start_stop_dates(series, config)? {
        Some((first, last)) => series.select_dates(first, last),
        None => Ok(None),
    }
}
