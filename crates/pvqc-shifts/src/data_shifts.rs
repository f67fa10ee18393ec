// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::segmenter::{Segmentation, Segmenter, SegmenterConfig};
use chrono::{Datelike, NaiveDate};
use pvqc_core::{DailyAggregate, Mask, QcError, median, quantile};
use pvqc_gaps::{StaleConfig, detect_stale};
use std::collections::BTreeMap;

const STALE_DECIMALS: i32 = 3;
const STALE_RUN_LENGTH: usize = 6;
const LOWER_CUT: f64 = 0.01;
const UPPER_CUT: f64 = 0.99;

/// Data-shift pipeline parameters.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct DataShiftConfig {
    /// Remove stale, non-positive and extreme days before detection.
    pub filtering: bool,
    /// Seasonality is removed only when the series spans more days than this.
    pub seasonality_min_span_days: i64,
    pub segmenter: SegmenterConfig,
}

impl Default for DataShiftConfig {
    fn default() -> Self {
        Self {
            filtering: true,
            seasonality_min_span_days: 730,
            segmenter: SegmenterConfig::default(),
        }
    }
}

impl DataShiftConfig {
    pub fn validate(&self) -> Result<(), QcError> {
        if self.seasonality_min_span_days < 0 {
            return Err(QcError::configuration(format!(
                "data_shifts.seasonality_min_span_days must be >= 0; got {}",
                self.seasonality_min_span_days
            )));
        }
        self.segmenter.validate()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DataShiftResult {
    /// Segments of the prepared series; values are on the normalised scale.
    pub segmentation: Segmentation,
    /// Series handed to the segmenter after filtering and normalisation.
    pub prepared: DailyAggregate,
    pub seasonality_removed: bool,
}

impl DataShiftResult {
    pub fn change_dates(&self) -> &[NaiveDate] {
        &self.segmentation.change_dates
    }
}

/// Blanks days that are unusable for level detection.
///
/// Tails of rounded stale runs, non-positive values and values at or beyond
/// the 1st/99th percentiles of what remains become `NaN`.
pub fn erroneous_filter(daily: &DailyAggregate) -> Result<DailyAggregate, QcError> {
    let stale = if daily.len() < STALE_RUN_LENGTH {
        Mask::all_false(daily.len())
    } else {
        detect_stale(
            daily.values(),
            &StaleConfig::rounded(STALE_DECIMALS, STALE_RUN_LENGTH),
        )?
        .mask
    };

    let mut values: Vec<f64> = daily
        .values()
        .iter()
        .zip(stale.iter())
        .map(|(&value, is_stale)| {
            if is_stale || value <= 0.0 {
                f64::NAN
            } else {
                value
            }
        })
        .collect();

    let low = quantile(&values, LOWER_CUT);
    let high = quantile(&values, UPPER_CUT);
    for value in values.iter_mut() {
        if *value <= low || *value >= high {
            *value = f64::NAN;
        }
    }

    log::debug!(
        "erroneous filter kept {} of {} days (stale tails={})",
        values.iter().filter(|v| v.is_finite()).count(),
        daily.len(),
        stale.count()
    );
    daily.with_values(values)
}

/// Min-max normalisation over the finite values.
///
/// A constant series maps to zeros.
pub fn min_max_normalize(values: &[f64]) -> Vec<f64> {
    let (min, max) = values
        .iter()
        .filter(|value| value.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &value| {
            (lo.min(value), hi.max(value))
        });
    let range = max - min;
    values
        .iter()
        .map(|&value| {
            if !value.is_finite() {
                f64::NAN
            } else if range > 0.0 {
                (value - min) / range
            } else {
                0.0
            }
        })
        .collect()
}

/// Subtracts the median value of each calendar (month, day) across years.
pub fn remove_seasonality(daily: &DailyAggregate) -> Result<DailyAggregate, QcError> {
    let mut groups: BTreeMap<(u32, u32), Vec<f64>> = BTreeMap::new();
    for (date, &value) in daily.dates().zip(daily.values()) {
        if value.is_finite() {
            groups
                .entry((date.month(), date.day()))
                .or_default()
                .push(value);
        }
    }
    let seasonal: BTreeMap<(u32, u32), f64> = groups
        .into_iter()
        .map(|(key, values)| (key, median(&values)))
        .collect();

    let values = daily
        .dates()
        .zip(daily.values())
        .map(|(date, &value)| match seasonal.get(&(date.month(), date.day())) {
            Some(&level) if value.is_finite() => value - level,
            _ => f64::NAN,
        })
        .collect();
    daily.with_values(values)
}

fn finite_span_days(daily: &DailyAggregate) -> i64 {
    let values = daily.values();
    let first = values.iter().position(|value| value.is_finite());
    let last = values.iter().rposition(|value| value.is_finite());
    match (first, last) {
        (Some(first), Some(last)) => (last - first) as i64,
        _ => 0,
    }
}

/// Filters, normalises, deseasonalises and segments a daily series.
pub fn detect_data_shifts(
    daily: &DailyAggregate,
    config: &DataShiftConfig,
) -> Result<DataShiftResult, QcError> {
    config.validate()?;
    let filtered = if config.filtering {
        erroneous_filter(daily)?
    } else {
        daily.clone()
    };

    let normalized = filtered.with_values(min_max_normalize(filtered.values()))?;
    let span_days = finite_span_days(&filtered);
    let seasonality_removed = span_days > config.seasonality_min_span_days;
    let prepared = if seasonality_removed {
        remove_seasonality(&normalized)?
    } else {
        normalized
    };

    let mut segmentation = Segmenter::new(config.segmenter.clone())?.segment(&prepared)?;
    if !seasonality_removed {
        segmentation.diagnostics.push_warning(format!(
            "series spans {span_days} days; seasonality removal needs more than {}, detecting on the normalised series only",
            config.seasonality_min_span_days
        ));
    }
    segmentation.diagnostics.push_note(format!(
        "filtering={}, seasonality_removed={seasonality_removed}",
        config.filtering
    ));

    Ok(DataShiftResult {
        segmentation,
        prepared,
        seasonality_removed,
    })
}

/// Date bounds of the longest shift-free segment.
///
/// The full range is returned when no shift is found.
pub fn filter_data_shifts(
    daily: &DailyAggregate,
    config: &DataShiftConfig,
) -> Result<(NaiveDate, NaiveDate), QcError> {
    let result = detect_data_shifts(daily, config)?;
    if result.change_dates().is_empty() {
        return Ok((daily.start(), daily.end()));
    }
    Ok(result
        .segmentation
        .longest_bounds()
        .unwrap_or((daily.start(), daily.end())))
}

#[cfg(test)]
mod tests {
    use super::{
        DataShiftConfig, detect_data_shifts, erroneous_filter, filter_data_shifts,
        min_max_normalize, remove_seasonality,
    };
    use crate::segmenter::SegmenterConfig;
    use chrono::{Datelike, Days, NaiveDate};
    use pvqc_core::{DailyAggregate, Stopping};
    use pvqc_eval::synthetic::{DailyStepSpec, daily_step_series};

    fn day(offset: u64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2019, 1, 1)
            .and_then(|d| d.checked_add_days(Days::new(offset)))
            .expect("valid date")
    }

    fn unfiltered() -> DataShiftConfig {
        DataShiftConfig {
            filtering: false,
            ..DataShiftConfig::default()
        }
    }

    #[test]
    fn two_year_level_shift_splits_at_the_step() {
        let values: Vec<f64> = (0..730)
            .map(|i| if i < 200 { 100.0 } else { 200.0 })
            .collect();
        let daily = DailyAggregate::new(day(0), values).expect("aggregate");
        let result = detect_data_shifts(&daily, &unfiltered()).expect("detect");

        assert!(!result.seasonality_removed);
        assert_eq!(result.segmentation.segments.len(), 2);
        assert_eq!(result.change_dates(), &[day(200)]);
        assert!(
            result
                .segmentation
                .diagnostics
                .warnings
                .iter()
                .any(|w| w.contains("seasonality"))
        );
        let bounds = filter_data_shifts(&daily, &unfiltered()).expect("filter");
        assert_eq!(bounds, (day(200), day(729)));
    }

    #[test]
    fn no_shift_keeps_the_full_range() {
        let daily = DailyAggregate::new(day(0), vec![5.0; 120]).expect("aggregate");
        let bounds = filter_data_shifts(&daily, &unfiltered()).expect("filter");
        assert_eq!(bounds, (day(0), day(119)));
    }

    #[test]
    fn noisy_shift_is_found_after_filtering() {
        let spec = DailyStepSpec {
            start: day(0),
            n_days: 400,
            levels: vec![(0, 50.0), (260, 80.0)],
            noise_std: 1.5,
            seed: 11,
        };
        let daily = daily_step_series(&spec).expect("synthetic series");
        let config = DataShiftConfig {
            segmenter: SegmenterConfig {
                stopping: Stopping::KnownK(1),
                ..SegmenterConfig::default()
            },
            ..DataShiftConfig::default()
        };
        let result = detect_data_shifts(&daily, &config).expect("detect");
        let change = result.change_dates()[0];
        let offset = (change - day(260)).num_days().abs();
        assert!(offset <= 1, "change detected at {change}");
    }

    #[test]
    fn erroneous_filter_blanks_stale_tails_and_extremes() {
        let mut values: Vec<f64> = (0..200).map(|i| 10.0 + f64::from(i % 7)).collect();
        for value in &mut values[50..58] {
            *value = 12.3456;
        }
        values[100] = -4.0;
        values[101] = 0.0;
        let daily = DailyAggregate::new(day(0), values).expect("aggregate");
        let filtered = erroneous_filter(&daily).expect("filter");
        let kept = filtered.values();

        assert!(kept[50].is_finite());
        assert!(kept[51..58].iter().all(|v| v.is_nan()));
        assert!(kept[100].is_nan());
        assert!(kept[101].is_nan());
        // 10.0 and 16.0 are the extremes of the weekly cycle
        assert!(
            kept.iter()
                .filter(|v| v.is_finite())
                .all(|&v| v > 10.0 && v < 16.0)
        );
    }

    #[test]
    fn erroneous_filter_accepts_series_shorter_than_a_stale_run() {
        let daily = DailyAggregate::new(day(0), vec![1.0, 2.0, 2.0, 4.0]).expect("aggregate");
        let filtered = erroneous_filter(&daily).expect("filter");
        assert_eq!(filtered.len(), 4);
        assert_eq!(&filtered.values()[1..3], &[2.0, 2.0]);
    }

    #[test]
    fn normalisation_maps_to_unit_range() {
        let normalized = min_max_normalize(&[2.0, f64::NAN, 6.0, 4.0]);
        assert_eq!(normalized[0], 0.0);
        assert!(normalized[1].is_nan());
        assert_eq!(normalized[2], 1.0);
        assert_eq!(normalized[3], 0.5);
        assert_eq!(min_max_normalize(&[3.0, 3.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn seasonality_uses_same_calendar_day_across_years() {
        let values: Vec<f64> = (0..1096)
            .map(|i| {
                let date = day(i);
                if date.month() == 1 && date.day() == 1 { 9.0 } else { 1.0 }
            })
            .collect();
        let daily = DailyAggregate::new(day(0), values).expect("aggregate");
        let deseasoned = remove_seasonality(&daily).expect("seasonality");
        assert!(deseasoned.values().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn long_series_has_seasonality_removed() {
        let values: Vec<f64> = (0..1000).map(|i| if i < 500 { 1.0 } else { 3.0 }).collect();
        let daily = DailyAggregate::new(day(0), values).expect("aggregate");
        let result = detect_data_shifts(&daily, &unfiltered()).expect("detect");
        assert!(result.seasonality_removed);
        assert!(
            result
                .segmentation
                .diagnostics
                .warnings
                .iter()
                .all(|w| !w.contains("seasonality"))
        );
    }
}
