// SPDX-License-Identifier: MIT OR Apache-2.0

#![no_main]

#[path = "common.rs"]
mod common;

use chrono::{NaiveDate, TimeDelta};
use libfuzzer_sys::fuzz_target;
use pvqc_core::TimeSeries;
use pvqc_gaps::{
    CompletenessConfig, InterpolationConfig, MarkPolicy, StaleConfig, TrimConfig,
    completeness_score, detect_interpolation, detect_stale, trim,
};

fn choose_mark(seed: u8) -> MarkPolicy {
    match seed % 3 {
        0 => MarkPolicy::All,
        1 => MarkPolicy::Tail,
        _ => MarkPolicy::End,
    }
}

fuzz_target!(|data: &[u8]| {
    let mut input = common::FuzzInput::new(data);

    let n = input.pick(1, 255) * 4;
    let run_length = input.pick(1, 12);
    let mark = choose_mark(input.byte());
    let decimals_seed = input.byte();
    let freq_minutes = input.pick(1, 120);
    let window_days = input.pick(0, 12);
    let values = input.samples(n);

    let stale = StaleConfig {
        min_run_length: run_length,
        decimals: (decimals_seed & 1 == 1).then_some(i32::from(decimals_seed % 7) - 2),
        mark,
        ..StaleConfig::default()
    };
    let _ = detect_stale(&values, &stale);

    let interpolation = InterpolationConfig {
        min_run_length: run_length.max(2),
        mark,
        ..InterpolationConfig::default()
    };
    let _ = detect_interpolation(&values, &interpolation);

    let Some(start) = NaiveDate::from_ymd_opt(2022, 3, 27).and_then(|d| d.and_hms_opt(0, 0, 0))
    else {
        return;
    };
    let freq = TimeDelta::minutes(freq_minutes as i64);
    let Ok(series) = TimeSeries::regular_naive(start, freq, values) else {
        return;
    };
    let _ = completeness_score(&series, &CompletenessConfig::default(), None);
    let trim_config = TrimConfig {
        window_days,
        ..TrimConfig::default()
    };
    let _ = trim(&series, &trim_config);
});
