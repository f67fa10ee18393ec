// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::segmenter::{Segmentation, Segmenter, SegmenterConfig};
use pvqc_core::{
    Constraints, DailyAggregate, Penalty, QcError, Stopping, require_finite,
    require_unit_interval,
};
use pvqc_costs::CostKind;
use pvqc_outliers::OutlierMethod;

/// Clock-shift estimation parameters.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct TimeShiftConfig {
    /// Shortest shifted period, in valid days.
    pub period_min: usize,
    /// Shift resolution in minutes.
    pub shift_min: f64,
    /// Remainder, in minutes, from which a difference rounds up.
    /// `None` uses half of `shift_min`.
    pub round_up_from: Option<f64>,
    /// Penalty per change, in units of `shift_min` squared.
    pub prediction_penalty: f64,
    pub outlier: OutlierMethod,
    pub quantile: f64,
}

impl Default for TimeShiftConfig {
    fn default() -> Self {
        Self {
            period_min: 2,
            shift_min: 15.0,
            round_up_from: None,
            prediction_penalty: 13.0,
            outlier: OutlierMethod::default(),
            quantile: 0.5,
        }
    }
}

impl TimeShiftConfig {
    pub fn validate(&self) -> Result<(), QcError> {
        if self.period_min == 0 {
            return Err(QcError::configuration(
                "time_shifts.period_min must be >= 1; got 0",
            ));
        }
        require_finite(self.shift_min, "time_shifts.shift_min")?;
        if self.shift_min <= 0.0 {
            return Err(QcError::configuration(format!(
                "time_shifts.shift_min must be > 0.0; got {}",
                self.shift_min
            )));
        }
        let cutoff = self.cutoff();
        require_finite(cutoff, "time_shifts.round_up_from")?;
        if !(0.0..=self.shift_min).contains(&cutoff) {
            return Err(QcError::configuration(format!(
                "time_shifts.round_up_from must be in [0.0, {}]; got {cutoff}",
                self.shift_min
            )));
        }
        Penalty::Manual(self.prediction_penalty).validate()?;
        self.outlier.validate()?;
        require_unit_interval(self.quantile, "time_shifts.quantile")
    }

    fn cutoff(&self) -> f64 {
        self.round_up_from.unwrap_or(self.shift_min / 2.0)
    }

    fn segmenter_config(&self) -> SegmenterConfig {
        SegmenterConfig {
            stopping: Stopping::Penalized(Penalty::Manual(self.prediction_penalty)),
            cost: CostKind::L2,
            constraints: Constraints {
                min_segment_len: self.period_min,
                ..Constraints::default()
            },
            outlier: self.outlier.clone(),
            quantile: self.quantile,
            normalize: false,
            ..SegmenterConfig::default()
        }
    }
}

/// Rounds to a multiple of `step`, going up once the remainder reaches `cutoff`.
///
/// Non-finite input is returned unchanged.
pub fn round_to_step(value: f64, step: f64, cutoff: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let multiple = (value / step).floor();
    let remainder = value - multiple * step;
    if remainder >= cutoff {
        (multiple + 1.0) * step
    } else {
        multiple * step
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimeShiftResult {
    /// Per-day shift in minutes; `NaN` where either input is missing.
    pub shifts: DailyAggregate,
    /// Per-day flag, `true` where the estimated shift is non-zero.
    pub is_shifted: Vec<bool>,
    /// Segmentation of the rounded differences, in units of `shift_min`.
    pub segmentation: Segmentation,
}

impl TimeShiftResult {
    pub fn shifted_days(&self) -> usize {
        self.is_shifted.iter().filter(|flag| **flag).count()
    }
}

/// Estimates a per-day clock shift from event times and reference times.
///
/// Both inputs hold minutes since midnight over the same dates.
pub fn estimate_time_shifts(
    event: &DailyAggregate,
    reference: &DailyAggregate,
    config: &TimeShiftConfig,
) -> Result<TimeShiftResult, QcError> {
    config.validate()?;
    if event.start() != reference.start() || event.len() != reference.len() {
        return Err(QcError::input(format!(
            "event times cover {}..={} but reference times cover {}..={}",
            event.start(),
            event.end(),
            reference.start(),
            reference.end()
        )));
    }

    let step = config.shift_min;
    let cutoff = config.cutoff();
    let steps: Vec<f64> = event
        .values()
        .iter()
        .zip(reference.values())
        .map(|(&e, &r)| round_to_step(e - r, step, cutoff) / step)
        .collect();
    let rounded = event.with_values(steps)?;

    let segmentation = Segmenter::new(config.segmenter_config())?.segment(&rounded)?;

    let mut shifts = Vec::with_capacity(rounded.len());
    for segment in &segmentation.segments {
        let shift = round_to_step(segment.value * step, step, cutoff);
        for &day_steps in &rounded.values()[segment.start_index..segment.end_index] {
            shifts.push(if day_steps.is_finite() { shift } else { f64::NAN });
        }
    }
    let is_shifted = shifts
        .iter()
        .map(|shift| shift.is_finite() && *shift != 0.0)
        .collect();

    let result = TimeShiftResult {
        shifts: event.with_values(shifts)?,
        is_shifted,
        segmentation,
    };
    log::debug!(
        "time shifts: {} of {} days shifted across {} segments",
        result.shifted_days(),
        event.len(),
        result.segmentation.segments.len()
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::{TimeShiftConfig, estimate_time_shifts, round_to_step};
    use chrono::{Days, NaiveDate};
    use pvqc_core::{DailyAggregate, QcError};

    fn day(offset: u64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 3, 1)
            .and_then(|d| d.checked_add_days(Days::new(offset)))
            .expect("valid date")
    }

    fn minutes(values: Vec<f64>) -> DailyAggregate {
        DailyAggregate::new(day(0), values).expect("aggregate")
    }

    #[test]
    fn rounding_uses_the_remainder_cutoff() {
        assert_eq!(round_to_step(7.4, 15.0, 7.5), 0.0);
        assert_eq!(round_to_step(7.5, 15.0, 7.5), 15.0);
        assert_eq!(round_to_step(-7.4, 15.0, 7.5), 0.0);
        assert_eq!(round_to_step(-8.0, 15.0, 7.5), -15.0);
        assert_eq!(round_to_step(61.0, 15.0, 7.5), 60.0);
        assert_eq!(round_to_step(3.0, 15.0, 2.0), 15.0);
        assert!(round_to_step(f64::NAN, 15.0, 7.5).is_nan());
    }

    #[test]
    fn daylight_saving_style_shift_is_recovered() {
        let reference = minutes(vec![720.0; 100]);
        let event = minutes(
            (0..100)
                .map(|i| {
                    let jitter = f64::from(i % 5) - 2.0;
                    if (40..70).contains(&i) { 780.0 + jitter } else { 720.0 + jitter }
                })
                .collect(),
        );
        let result = estimate_time_shifts(&event, &reference, &TimeShiftConfig::default())
            .expect("estimate");

        assert_eq!(result.segmentation.change_dates, vec![day(40), day(70)]);
        assert_eq!(result.shifted_days(), 30);
        assert!(result.is_shifted[40..70].iter().all(|flag| *flag));
        assert_eq!(result.shifts.values()[55], 60.0);
        assert_eq!(result.shifts.values()[10], 0.0);
    }

    #[test]
    fn brief_rounding_blips_are_not_shifts() {
        let reference = minutes(vec![700.0; 60]);
        let mut event = vec![700.0; 60];
        event[20] = 716.0;
        event[21] = 716.0;
        let result = estimate_time_shifts(&minutes(event), &reference, &TimeShiftConfig::default())
            .expect("estimate");
        assert_eq!(result.shifted_days(), 0);
        assert_eq!(result.segmentation.segments.len(), 1);
    }

    #[test]
    fn missing_inputs_give_nan_shift() {
        let reference = minutes(vec![720.0; 20]);
        let mut event = vec![720.0; 20];
        event[4] = f64::NAN;
        let result = estimate_time_shifts(&minutes(event), &reference, &TimeShiftConfig::default())
            .expect("estimate");
        assert!(result.shifts.values()[4].is_nan());
        assert!(!result.is_shifted[4]);
        assert_eq!(result.shifts.values()[5], 0.0);
    }

    #[test]
    fn misaligned_inputs_are_rejected() {
        let event = minutes(vec![720.0; 10]);
        let reference = DailyAggregate::new(day(1), vec![720.0; 10]).expect("aggregate");
        let err = estimate_time_shifts(&event, &reference, &TimeShiftConfig::default())
            .expect_err("different ranges");
        assert!(matches!(err, QcError::Input(_)));
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let reference = minutes(vec![720.0; 10]);
        for config in [
            TimeShiftConfig {
                period_min: 0,
                ..TimeShiftConfig::default()
            },
            TimeShiftConfig {
                shift_min: 0.0,
                ..TimeShiftConfig::default()
            },
            TimeShiftConfig {
                round_up_from: Some(20.0),
                ..TimeShiftConfig::default()
            },
            TimeShiftConfig {
                prediction_penalty: -1.0,
                ..TimeShiftConfig::default()
            },
        ] {
            let err = estimate_time_shifts(&reference, &reference, &config)
                .expect_err("invalid config");
            assert!(matches!(err, QcError::Configuration(_)), "{err}");
        }
    }
}
