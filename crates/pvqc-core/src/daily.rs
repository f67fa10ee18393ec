// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::QcError;
use crate::time_series::TimeSeries;
use chrono::{Days, NaiveDate};

/// Reduction applied to the samples of one calendar day.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DailyAgg {
    Sum,
    #[default]
    Mean,
    Max,
    Min,
    /// Number of finite samples; `0.0` for empty days.
    Count,
}

impl DailyAgg {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Mean => "mean",
            Self::Max => "max",
            Self::Min => "min",
            Self::Count => "count",
        }
    }
}

/// One value per calendar day over a contiguous date range.
///
/// Days without valid samples hold `NaN`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct DailyAggregate {
    start: NaiveDate,
    end: NaiveDate,
    values: Vec<f64>,
}

impl DailyAggregate {
    /// Builds an aggregate whose first entry is `start`.
    pub fn new(start: NaiveDate, values: Vec<f64>) -> Result<Self, QcError> {
        if values.is_empty() {
            return Err(QcError::input(
                "daily aggregate must contain at least one day; got 0",
            ));
        }
        if let Some((idx, value)) = values
            .iter()
            .enumerate()
            .find(|(_, value)| value.is_infinite())
        {
            return Err(QcError::input(format!(
                "daily values must be finite or NaN; got values[{idx}]={value}"
            )));
        }
        let end = start
            .checked_add_days(Days::new((values.len() - 1) as u64))
            .ok_or_else(|| {
                QcError::input(format!(
                    "{} days starting {start} exceed the representable date range",
                    values.len()
                ))
            })?;
        Ok(Self { start, end, values })
    }

    /// Builds an aggregate from dated values, filling skipped days with `NaN`.
    pub fn from_pairs(pairs: &[(NaiveDate, f64)]) -> Result<Self, QcError> {
        let Some(&(start, _)) = pairs.first() else {
            return Err(QcError::input(
                "daily aggregate must contain at least one day; got 0",
            ));
        };

        let mut values = Vec::with_capacity(pairs.len());
        let mut prev: Option<NaiveDate> = None;
        for (idx, &(date, value)) in pairs.iter().enumerate() {
            if let Some(prev_date) = prev
                && date <= prev_date
            {
                return Err(QcError::input(format!(
                    "dates must be strictly increasing: index {idx} has {date}, previous {prev_date}"
                )));
            }
            let offset = (date - start).num_days() as usize;
            values.resize(offset, f64::NAN);
            values.push(value);
            prev = Some(date);
        }

        Self::new(start, values)
    }

    /// Resamples a series to calendar days using local dates.
    pub fn from_series(series: &TimeSeries, agg: DailyAgg) -> Result<Self, QcError> {
        let (first, last) = series.day_range();
        let n_days = (last - first).num_days() as usize + 1;

        let mut sums = vec![0.0; n_days];
        let mut counts = vec![0usize; n_days];
        let mut maxima = vec![f64::NEG_INFINITY; n_days];
        let mut minima = vec![f64::INFINITY; n_days];

        for (ts, &value) in series.timestamps().iter().zip(series.values()) {
            if !value.is_finite() {
                continue;
            }
            let day = (ts.date_naive() - first).num_days() as usize;
            sums[day] += value;
            counts[day] += 1;
            maxima[day] = maxima[day].max(value);
            minima[day] = minima[day].min(value);
        }

        let values = (0..n_days)
            .map(|day| {
                if agg == DailyAgg::Count {
                    return counts[day] as f64;
                }
                if counts[day] == 0 {
                    return f64::NAN;
                }
                match agg {
                    DailyAgg::Sum => sums[day],
                    DailyAgg::Mean => sums[day] / counts[day] as f64,
                    DailyAgg::Max => maxima[day],
                    DailyAgg::Min => minima[day],
                    DailyAgg::Count => counts[day] as f64,
                }
            })
            .collect();

        Self::new(first, values)
    }

    /// Same date range with replacement values.
    pub fn with_values(&self, values: Vec<f64>) -> Result<Self, QcError> {
        if values.len() != self.values.len() {
            return Err(QcError::input(format!(
                "replacement values must cover {} days; got {}",
                self.values.len(),
                values.len()
            )));
        }
        Self::new(self.start, values)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of days between the first and last entry.
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn date(&self, idx: usize) -> Option<NaiveDate> {
        if idx >= self.values.len() {
            return None;
        }
        self.start.checked_add_days(Days::new(idx as u64))
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take(self.values.len())
    }

    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        if date < self.start || date > self.end {
            return None;
        }
        Some((date - self.start).num_days() as usize)
    }

    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.index_of(date).map(|idx| self.values[idx])
    }

    pub fn valid_count(&self) -> usize {
        self.values.iter().filter(|value| value.is_finite()).count()
    }
}
