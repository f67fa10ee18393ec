// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::QcError;
use chrono::{DateTime, FixedOffset, TimeDelta};
use std::collections::BTreeMap;

/// Timestamp carried by every series: wall-clock time plus its UTC offset.
///
/// Naive series are stored with a zero offset so local dates equal naive dates.
pub type Timestamp = DateTime<FixedOffset>;

/// Checks that timestamps and values form a well-formed series.
///
/// `NaN` values are accepted as missing; infinities are rejected.
pub fn validate_series(timestamps: &[Timestamp], values: &[f64]) -> Result<(), QcError> {
    if timestamps.is_empty() {
        return Err(QcError::input(
            "series must contain at least one sample; got 0",
        ));
    }
    if timestamps.len() != values.len() {
        return Err(QcError::input(format!(
            "timestamps and values must have equal length; got timestamps={}, values={}",
            timestamps.len(),
            values.len()
        )));
    }

    for (idx, pair) in timestamps.windows(2).enumerate() {
        let (prev, next) = (pair[0], pair[1]);
        if next == prev {
            return Err(QcError::input(format!(
                "duplicate timestamp at index {}: {next}",
                idx + 1
            )));
        }
        if next < prev {
            return Err(QcError::input(format!(
                "timestamps must be strictly increasing: index {} has {next}, previous {prev}",
                idx + 1
            )));
        }
    }

    if let Some((idx, value)) = values
        .iter()
        .enumerate()
        .find(|(_, value)| value.is_infinite())
    {
        return Err(QcError::input(format!(
            "values must be finite or NaN; got values[{idx}]={value}"
        )));
    }

    Ok(())
}

/// Rejects zero and negative sampling frequencies.
pub fn validate_freq(freq: TimeDelta) -> Result<(), QcError> {
    if freq <= TimeDelta::zero() {
        return Err(QcError::configuration(format!(
            "freq must be > 0; got {freq}"
        )));
    }
    Ok(())
}

/// Infers the nominal sampling interval as the most common positive spacing.
///
/// Ties resolve to the smallest spacing.
pub fn infer_freq(timestamps: &[Timestamp]) -> Result<TimeDelta, QcError> {
    if timestamps.len() < 2 {
        return Err(QcError::insufficient_data(format!(
            "frequency inference requires at least 2 samples; got {}",
            timestamps.len()
        )));
    }

    let mut counts: BTreeMap<TimeDelta, usize> = BTreeMap::new();
    for pair in timestamps.windows(2) {
        let spacing = pair[1].signed_duration_since(pair[0]);
        if spacing > TimeDelta::zero() {
            *counts.entry(spacing).or_default() += 1;
        }
    }

    let mut best: Option<(TimeDelta, usize)> = None;
    for (spacing, count) in counts {
        match best {
            Some((_, best_count)) if count <= best_count => {}
            _ => best = Some((spacing, count)),
        }
    }

    best.map(|(spacing, _)| spacing).ok_or_else(|| {
        QcError::input("frequency inference found no positive spacing between timestamps")
    })
}

/// Returns an error when a scalar parameter is not finite.
pub fn require_finite(value: f64, label: &str) -> Result<(), QcError> {
    if !value.is_finite() {
        return Err(QcError::configuration(format!(
            "{label} must be finite; got {value}"
        )));
    }
    Ok(())
}

/// Returns an error when a scalar parameter is negative or not finite.
pub fn require_non_negative(value: f64, label: &str) -> Result<(), QcError> {
    require_finite(value, label)?;
    if value < 0.0 {
        return Err(QcError::configuration(format!(
            "{label} must be >= 0.0; got {value}"
        )));
    }
    Ok(())
}

/// Returns an error when a quantile level falls outside `[0, 1]`.
pub fn require_unit_interval(value: f64, label: &str) -> Result<(), QcError> {
    require_finite(value, label)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(QcError::configuration(format!(
            "{label} must be in [0.0, 1.0]; got {value}"
        )));
    }
    Ok(())
}
