// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::QcError;
use crate::mask::Mask;
use crate::validation::{Timestamp, infer_freq, validate_freq, validate_series};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Offset, TimeDelta, Utc};

/// Whether timestamps carried a real UTC offset or were naive wall-clock times.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeZoneKind {
    Naive,
    Aware,
}

/// Validated, strictly increasing series of `(timestamp, value)` samples.
///
/// Missing values are `NaN`. A series always holds at least one sample.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeSeries {
    timestamps: Vec<Timestamp>,
    values: Vec<f64>,
    freq: Option<TimeDelta>,
    tz: TimeZoneKind,
}

impl TimeSeries {
    /// Builds a timezone-aware series.
    pub fn new(timestamps: Vec<Timestamp>, values: Vec<f64>) -> Result<Self, QcError> {
        validate_series(&timestamps, &values)?;
        Ok(Self {
            timestamps,
            values,
            freq: None,
            tz: TimeZoneKind::Aware,
        })
    }

    /// Builds a naive series; local dates are the naive dates.
    pub fn from_naive(timestamps: Vec<NaiveDateTime>, values: Vec<f64>) -> Result<Self, QcError> {
        let utc = Utc.fix();
        let timestamps = timestamps
            .into_iter()
            .map(|naive| DateTime::from_naive_utc_and_offset(naive, utc))
            .collect::<Vec<_>>();
        validate_series(&timestamps, &values)?;
        Ok(Self {
            timestamps,
            values,
            freq: None,
            tz: TimeZoneKind::Naive,
        })
    }

    /// Builds an aware series sampled every `freq` starting at `start`.
    pub fn regular(start: Timestamp, freq: TimeDelta, values: Vec<f64>) -> Result<Self, QcError> {
        validate_freq(freq)?;
        let timestamps = regular_index(start, freq, values.len())?;
        Self::new(timestamps, values)?.with_freq(freq)
    }

    /// Builds a naive series sampled every `freq` starting at `start`.
    pub fn regular_naive(
        start: NaiveDateTime,
        freq: TimeDelta,
        values: Vec<f64>,
    ) -> Result<Self, QcError> {
        validate_freq(freq)?;
        let utc_start = DateTime::from_naive_utc_and_offset(start, Utc.fix());
        let timestamps = regular_index(utc_start, freq, values.len())?;
        let naive = timestamps.iter().map(|ts| ts.naive_local()).collect();
        Self::from_naive(naive, values)?.with_freq(freq)
    }

    /// Attaches an explicit nominal sampling frequency.
    pub fn with_freq(mut self, freq: TimeDelta) -> Result<Self, QcError> {
        validate_freq(freq)?;
        self.freq = Some(freq);
        Ok(self)
    }

    /// Returns a series with the same index and metadata but new values.
    pub fn with_values(&self, values: Vec<f64>) -> Result<Self, QcError> {
        validate_series(&self.timestamps, &values)?;
        Ok(Self {
            timestamps: self.timestamps.clone(),
            values,
            freq: self.freq,
            tz: self.tz,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false for a constructed series; present for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn timestamps(&self) -> &[Timestamp] {
        &self.timestamps
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Explicit frequency, if one was attached.
    pub fn freq(&self) -> Option<TimeDelta> {
        self.freq
    }

    pub fn tz_kind(&self) -> TimeZoneKind {
        self.tz
    }

    pub fn is_tz_aware(&self) -> bool {
        self.tz == TimeZoneKind::Aware
    }

    /// Explicit frequency, else the inferred most common spacing.
    pub fn effective_freq(&self) -> Result<TimeDelta, QcError> {
        match self.freq {
            Some(freq) => Ok(freq),
            None => infer_freq(&self.timestamps),
        }
    }

    /// Calendar date of each sample in its own offset.
    pub fn local_dates(&self) -> Vec<NaiveDate> {
        self.timestamps.iter().map(|ts| ts.date_naive()).collect()
    }

    /// First and last local calendar dates covered by the index.
    pub fn day_range(&self) -> (NaiveDate, NaiveDate) {
        let mut first = self.timestamps[0].date_naive();
        let mut last = first;
        for ts in &self.timestamps[1..] {
            let date = ts.date_naive();
            first = first.min(date);
            last = last.max(date);
        }
        (first, last)
    }

    /// Number of finite samples.
    pub fn valid_count(&self) -> usize {
        self.values.iter().filter(|value| value.is_finite()).count()
    }

    /// Keeps the samples flagged in `keep`, preserving timestamps and offsets.
    ///
    /// The result carries an explicit frequency (the source's effective
    /// frequency, when it can be determined) so later calls see the same
    /// nominal sampling. Returns `None` when nothing is kept.
    pub fn select(&self, keep: &Mask) -> Result<Option<TimeSeries>, QcError> {
        keep.check_aligned(self.len(), "keep mask")?;
        let freq = self.effective_freq().ok();

        let mut timestamps = Vec::with_capacity(keep.count());
        let mut values = Vec::with_capacity(keep.count());
        for (idx, flag) in keep.iter().enumerate() {
            if flag {
                timestamps.push(self.timestamps[idx]);
                values.push(self.values[idx]);
            }
        }
        if timestamps.is_empty() {
            return Ok(None);
        }

        Ok(Some(TimeSeries {
            timestamps,
            values,
            freq,
            tz: self.tz,
        }))
    }

    /// Keeps whole local days in `[start, end]`.
    pub fn select_dates(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<TimeSeries>, QcError> {
        let keep = self
            .timestamps
            .iter()
            .map(|ts| {
                let date = ts.date_naive();
                date >= start && date <= end
            })
            .collect::<Mask>();
        self.select(&keep)
    }
}

fn regular_index(start: Timestamp, freq: TimeDelta, n: usize) -> Result<Vec<Timestamp>, QcError> {
    let mut timestamps = Vec::with_capacity(n);
    let mut current = start;
    for idx in 0..n {
        if idx > 0 {
            current = current.checked_add_signed(freq).ok_or_else(|| {
                QcError::input(format!(
                    "regular index overflows the representable date range at sample {idx}"
                ))
            })?;
        }
        timestamps.push(current);
    }
    Ok(timestamps)
}
