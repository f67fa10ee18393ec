// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use chrono::{DateTime, Days, FixedOffset, NaiveDate, TimeDelta};
use pvqc_core::{
    DailyAggregate, Mask, QcError, TimeSeries, require_finite, require_non_negative, validate_freq,
};
use std::f64::consts::PI;

const MIN_POSITIVE_U01: f64 = f64::from_bits(1);

/// Seeded splitmix64 generator with Box-Muller normals.
#[derive(Clone, Debug)]
pub struct DeterministicRng {
    state: u64,
    cached_normal: Option<f64>,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            state: seed,
            cached_normal: None,
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.state;
        z ^= z >> 30;
        z = z.wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z ^= z >> 27;
        z = z.wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    /// Uniform draw in `[0, 1)`.
    pub fn unit_f64(&mut self) -> f64 {
        const SCALE: f64 = 1.0 / ((1u64 << 53) as f64);
        ((self.next_u64() >> 11) as f64) * SCALE
    }

    pub fn standard_normal(&mut self) -> f64 {
        if let Some(value) = self.cached_normal.take() {
            return value;
        }

        let u1 = self.unit_f64().max(MIN_POSITIVE_U01);
        let u2 = self.unit_f64();
        let radius = (-2.0 * u1.ln()).sqrt();
        let theta = 2.0 * PI * u2;
        self.cached_normal = Some(radius * theta.sin());
        radius * theta.cos()
    }
}

/// Piecewise-constant daily series.
#[derive(Clone, Debug)]
pub struct DailyStepSpec {
    pub start: NaiveDate,
    pub n_days: usize,
    /// `(first_day_offset, level)` pairs; the first offset must be 0.
    pub levels: Vec<(usize, f64)>,
    pub noise_std: f64,
    pub seed: u64,
}

impl DailyStepSpec {
    /// Day offsets where the level changes.
    pub fn change_offsets(&self) -> Vec<usize> {
        self.levels.iter().skip(1).map(|&(offset, _)| offset).collect()
    }

    pub fn change_dates(&self) -> Vec<NaiveDate> {
        self.change_offsets()
            .into_iter()
            .filter_map(|offset| self.start.checked_add_days(Days::new(offset as u64)))
            .collect()
    }

    fn validate(&self) -> Result<(), QcError> {
        if self.n_days == 0 {
            return Err(QcError::configuration("n_days must be >= 1; got 0"));
        }
        require_non_negative(self.noise_std, "noise_std")?;
        let Some(&(first, _)) = self.levels.first() else {
            return Err(QcError::configuration("levels must not be empty"));
        };
        if first != 0 {
            return Err(QcError::configuration(format!(
                "levels[0] must start at offset 0; got {first}"
            )));
        }
        let mut last = 0usize;
        for (idx, &(offset, level)) in self.levels.iter().enumerate() {
            require_finite(level, "level")?;
            if idx > 0 && (offset <= last || offset >= self.n_days) {
                return Err(QcError::configuration(format!(
                    "levels[{idx}] offset must be in ({last}, {}); got {offset}",
                    self.n_days
                )));
            }
            last = offset;
        }
        Ok(())
    }
}

/// Daily values following `spec.levels` plus Gaussian noise.
pub fn daily_step_series(spec: &DailyStepSpec) -> Result<DailyAggregate, QcError> {
    spec.validate()?;
    let mut rng = DeterministicRng::new(spec.seed);
    let mut values = Vec::with_capacity(spec.n_days);
    let mut level_idx = 0usize;
    for day in 0..spec.n_days {
        while level_idx + 1 < spec.levels.len() && day >= spec.levels[level_idx + 1].0 {
            level_idx += 1;
        }
        values.push(spec.levels[level_idx].1 + spec.noise_std * rng.standard_normal());
    }
    DailyAggregate::new(spec.start, values)
}

/// Clear-sky-like power profile sampled at a fixed frequency.
#[derive(Clone, Debug)]
pub struct PvProfileSpec {
    /// Local midnight of the first day.
    pub start: DateTime<FixedOffset>,
    pub freq: TimeDelta,
    pub n_days: usize,
    pub peak: f64,
    pub sunrise_hour: f64,
    pub sunset_hour: f64,
    /// Noise relative to the clear-sky value.
    pub noise_fraction: f64,
    pub seed: u64,
}

impl PvProfileSpec {
    pub fn new(start: DateTime<FixedOffset>, freq: TimeDelta, n_days: usize) -> Self {
        Self {
            start,
            freq,
            n_days,
            peak: 1_000.0,
            sunrise_hour: 6.0,
            sunset_hour: 18.0,
            noise_fraction: 0.05,
            seed: 7,
        }
    }

    fn validate(&self) -> Result<(), QcError> {
        if self.n_days == 0 {
            return Err(QcError::configuration("n_days must be >= 1; got 0"));
        }
        validate_freq(self.freq)?;
        require_non_negative(self.peak, "peak")?;
        require_non_negative(self.noise_fraction, "noise_fraction")?;
        require_finite(self.sunrise_hour, "sunrise_hour")?;
        require_finite(self.sunset_hour, "sunset_hour")?;
        if !(0.0..self.sunset_hour).contains(&self.sunrise_hour) || self.sunset_hour > 24.0 {
            return Err(QcError::configuration(format!(
                "daylight window must satisfy 0 <= sunrise < sunset <= 24; got {}..{}",
                self.sunrise_hour, self.sunset_hour
            )));
        }
        Ok(())
    }
}

/// Regular series of a half-sine daylight profile, zero at night.
pub fn pv_profile(spec: &PvProfileSpec) -> Result<TimeSeries, QcError> {
    spec.validate()?;
    let day_ms = TimeDelta::days(1).num_milliseconds();
    let freq_ms = spec.freq.num_milliseconds().max(1);
    let per_day = (day_ms / freq_ms).max(1) as usize;
    let n = per_day.checked_mul(spec.n_days).ok_or_else(|| {
        QcError::configuration(format!(
            "{} days at {} overflow the sample count",
            spec.n_days, spec.freq
        ))
    })?;

    let mut rng = DeterministicRng::new(spec.seed);
    let daylight = spec.sunset_hour - spec.sunrise_hour;
    let values = (0..n)
        .map(|idx| {
            let hour = (idx % per_day) as f64 * freq_ms as f64 / 3_600_000.0;
            let phase = (hour - spec.sunrise_hour) / daylight;
            if !(0.0..=1.0).contains(&phase) {
                return 0.0;
            }
            let clear = spec.peak * (PI * phase).sin();
            (clear * (1.0 + spec.noise_fraction * rng.standard_normal())).max(0.0)
        })
        .collect();
    TimeSeries::regular(spec.start, spec.freq, values)
}

fn check_span(len: usize, start: usize, span: usize, label: &str) -> Result<(), QcError> {
    if span == 0 || start.checked_add(span).is_none_or(|end| end > len) {
        return Err(QcError::input(format!(
            "{label} [{start}, {start}+{span}) must be non-empty and lie within {len} samples"
        )));
    }
    Ok(())
}

/// Repeats `values[start]` over the next `span - 1` samples.
pub fn inject_stale(values: &mut [f64], start: usize, span: usize) -> Result<(), QcError> {
    check_span(values.len(), start, span, "stale run")?;
    let held = values[start];
    values[start..start + span].fill(held);
    Ok(())
}

/// Replaces `span` samples with a straight line between their neighbours.
pub fn inject_linear_fill(values: &mut [f64], start: usize, span: usize) -> Result<(), QcError> {
    check_span(values.len(), start, span, "linear fill")?;
    if start == 0 || start + span >= values.len() {
        return Err(QcError::input(format!(
            "linear fill [{start}, {}) needs a sample on each side",
            start + span
        )));
    }
    let left = values[start - 1];
    let right = values[start + span];
    let steps = (span + 1) as f64;
    for offset in 0..span {
        let weight = (offset + 1) as f64 / steps;
        values[start + offset] = left + weight * (right - left);
    }
    Ok(())
}

/// Sets `span` samples to `NaN`.
pub fn inject_gap(values: &mut [f64], start: usize, span: usize) -> Result<(), QcError> {
    check_span(values.len(), start, span, "gap")?;
    values[start..start + span].fill(f64::NAN);
    Ok(())
}

/// Drops every sample on the given local dates.
pub fn remove_days(series: &TimeSeries, dates: &[NaiveDate]) -> Result<Option<TimeSeries>, QcError> {
    let keep = series
        .timestamps()
        .iter()
        .map(|ts| !dates.contains(&ts.date_naive()))
        .collect::<Mask>();
    series.select(&keep)
}

/// Daily event and reference timings with shifted periods.
#[derive(Clone, Debug)]
pub struct TimeShiftSpec {
    pub start: NaiveDate,
    pub n_days: usize,
    /// Reference event time in minutes since midnight.
    pub base_minutes: f64,
    /// `(first_day, end_day_exclusive, minutes)` shifted periods.
    pub shifts: Vec<(usize, usize, f64)>,
    pub jitter_std: f64,
    pub seed: u64,
}

/// Returns `(event, reference)` daily timings.
pub fn time_shift_pair(spec: &TimeShiftSpec) -> Result<(DailyAggregate, DailyAggregate), QcError> {
    if spec.n_days == 0 {
        return Err(QcError::configuration("n_days must be >= 1; got 0"));
    }
    require_finite(spec.base_minutes, "base_minutes")?;
    require_non_negative(spec.jitter_std, "jitter_std")?;
    for (idx, &(first, end, minutes)) in spec.shifts.iter().enumerate() {
        require_finite(minutes, "shift minutes")?;
        if first >= end || end > spec.n_days {
            return Err(QcError::configuration(format!(
                "shifts[{idx}] must satisfy first < end <= {}; got [{first}, {end})",
                spec.n_days
            )));
        }
    }

    let mut rng = DeterministicRng::new(spec.seed);
    let event = (0..spec.n_days)
        .map(|day| {
            let shift: f64 = spec
                .shifts
                .iter()
                .filter(|(first, end, _)| (*first..*end).contains(&day))
                .map(|(_, _, minutes)| minutes)
                .sum();
            spec.base_minutes + shift + spec.jitter_std * rng.standard_normal()
        })
        .collect();
    Ok((
        DailyAggregate::new(spec.start, event)?,
        DailyAggregate::new(spec.start, vec![spec.base_minutes; spec.n_days])?,
    ))
}
