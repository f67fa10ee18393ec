// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Shared fixtures for the pvqc benchmarks.

use chrono::{FixedOffset, NaiveDate, TimeDelta, TimeZone};
use pvqc_core::{DailyAggregate, QcError, TimeSeries};
use pvqc_eval::synthetic::{DailyStepSpec, PvProfileSpec, daily_step_series, pv_profile};

/// 15-minute clear-sky profile over `n_days` starting 2021-01-01 UTC-7.
pub fn intraday_fixture(n_days: usize) -> Result<TimeSeries, QcError> {
    let start = FixedOffset::west_opt(7 * 3_600)
        .and_then(|tz| tz.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).single())
        .ok_or_else(|| QcError::input("fixture start is not a valid local time"))?;
    pv_profile(&PvProfileSpec::new(start, TimeDelta::minutes(15), n_days))
}

/// Noisy daily levels with a change every `n_days / (changes + 1)` days.
pub fn daily_fixture(n_days: usize, changes: usize) -> Result<DailyAggregate, QcError> {
    let start = NaiveDate::from_ymd_opt(2015, 1, 1)
        .ok_or_else(|| QcError::input("fixture start is not a valid date"))?;
    let width = (n_days / (changes + 1)).max(1);
    let levels = (0..=changes)
        .map(|idx| (idx * width, if idx % 2 == 0 { 100.0 } else { 70.0 }))
        .collect();
    daily_step_series(&DailyStepSpec {
        start,
        n_days,
        levels,
        noise_std: 3.0,
        seed: 42,
    })
}
