// SPDX-License-Identifier: MIT OR Apache-2.0

#![no_main]

#[path = "common.rs"]
mod common;

use chrono::NaiveDate;
use libfuzzer_sys::fuzz_target;
use pvqc_core::{Constraints, DailyAggregate};
use pvqc_costs::CostKind;
use pvqc_outliers::OutlierMethod;
use pvqc_shifts::{
    DataShiftConfig, SegmenterConfig, TimeShiftConfig, detect_data_shifts, estimate_time_shifts,
    segment_daily,
};

fn choose_outlier(seed: u8) -> OutlierMethod {
    match seed % 4 {
        0 => OutlierMethod::None,
        1 => OutlierMethod::ZScore {
            zmax: f64::from(seed) / 32.0,
        },
        2 => OutlierMethod::Hampel(Default::default()),
        _ => OutlierMethod::default(),
    }
}

fuzz_target!(|data: &[u8]| {
    let mut input = common::FuzzInput::new(data);

    let n = input.pick(1, 255);
    let stopping = input.stopping();
    let quantile = f64::from(input.byte()) / 255.0;
    let min_segment_len = input.pick(0, 8);
    let period_min = input.pick(0, 6);
    let options = input.byte();
    let mut values = input.samples(n * 2);
    let reference = values.split_off(n);

    let Some(start) = NaiveDate::from_ymd_opt(2019, 2, 27) else {
        return;
    };
    let Ok(daily) = DailyAggregate::new(start, values) else {
        return;
    };

    let segmenter = SegmenterConfig {
        stopping,
        cost: if options & 1 == 0 {
            CostKind::L2
        } else {
            CostKind::L1
        },
        constraints: Constraints {
            min_segment_len,
            ..Constraints::default()
        },
        outlier: choose_outlier(options >> 1),
        quantile,
        normalize: options & 0x20 == 0,
        ..SegmenterConfig::default()
    };
    let _ = segment_daily(&daily, &segmenter);

    let shifts = DataShiftConfig {
        filtering: options & 0x40 == 0,
        segmenter,
        ..DataShiftConfig::default()
    };
    let _ = detect_data_shifts(&daily, &shifts);

    if let Ok(reference) = DailyAggregate::new(start, reference) {
        let config = TimeShiftConfig {
            period_min,
            ..TimeShiftConfig::default()
        };
        let _ = estimate_time_shifts(&daily, &reference, &config);
    }
});
