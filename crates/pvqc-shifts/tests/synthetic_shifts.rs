// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use chrono::{Days, NaiveDate};
use pvqc_eval::f1_with_tolerance;
use pvqc_eval::synthetic::{DailyStepSpec, TimeShiftSpec, daily_step_series, time_shift_pair};
use pvqc_shifts::{DataShiftConfig, TimeShiftConfig, detect_data_shifts, estimate_time_shifts};

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 4, 1).expect("valid date")
}

fn day(offset: u64) -> NaiveDate {
    start()
        .checked_add_days(Days::new(offset))
        .expect("valid date")
}

#[test]
fn filtered_data_shift_recovers_a_level_drop() {
    let spec = DailyStepSpec {
        start: start(),
        n_days: 500,
        levels: vec![(0, 100.0), (300, 60.0)],
        noise_std: 2.0,
        seed: 3,
    };
    let daily = daily_step_series(&spec).expect("synthetic series");

    let result = detect_data_shifts(&daily, &DataShiftConfig::default()).expect("data shifts");
    assert!(!result.seasonality_removed);
    assert!(
        result
            .segmentation
            .diagnostics
            .warnings
            .iter()
            .any(|w| w.contains("seasonality"))
    );

    let metrics = f1_with_tolerance(result.change_dates(), &spec.change_dates(), 2).expect("f1");
    assert_eq!(metrics.recall, 1.0);
}

#[test]
fn dst_like_offset_is_recovered() {
    let spec = TimeShiftSpec {
        start: start(),
        n_days: 150,
        base_minutes: 735.0,
        shifts: vec![(30, 90, 60.0)],
        jitter_std: 1.0,
        seed: 19,
    };
    let (event, reference) = time_shift_pair(&spec).expect("timings");

    let result =
        estimate_time_shifts(&event, &reference, &TimeShiftConfig::default()).expect("shifts");
    assert_eq!(result.shifted_days(), 60);
    assert_eq!(result.shifts.get(day(45)), Some(60.0));
    assert_eq!(result.shifts.get(day(10)), Some(0.0));
    assert_eq!(result.segmentation.change_dates, vec![day(30), day(90)]);
}
