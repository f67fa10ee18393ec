// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::binseg::{BinSeg, BinSegConfig};
use chrono::NaiveDate;
use pvqc_core::{
    ChangePointDetector, ChangePointResult, Constraints, DailyAggregate, Diagnostics,
    ExecutionContext, Mask, ProgressSink, QcError, ReproMode, Stopping, TelemetrySink,
    compute_missing_run_stats, diff_noise_scale, finite_points, quantile, require_unit_interval,
};
use pvqc_costs::{CostKind, CostL1Median, CostL2Mean};
use pvqc_outliers::{OutlierMethod, retained_values};

/// Daily changepoint segmentation parameters.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct SegmenterConfig {
    pub stopping: Stopping,
    pub cost: CostKind,
    pub constraints: Constraints,
    /// Rule applied to each segment before taking its representative value.
    pub outlier: OutlierMethod,
    /// Quantile of the retained values used as the segment value.
    pub quantile: f64,
    /// Divide by the robust noise level before searching.
    pub normalize: bool,
    pub repro_mode: ReproMode,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            stopping: Stopping::default(),
            cost: CostKind::default(),
            constraints: Constraints::default(),
            outlier: OutlierMethod::default(),
            quantile: 0.5,
            normalize: true,
            repro_mode: ReproMode::default(),
        }
    }
}

impl SegmenterConfig {
    pub fn validate(&self) -> Result<(), QcError> {
        self.stopping.validate()?;
        self.constraints.validate()?;
        self.outlier.validate()?;
        require_unit_interval(self.quantile, "segmenter.quantile")
    }
}

/// Contiguous run of days sharing one level.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    /// First day, inclusive.
    pub start: NaiveDate,
    /// Last day, inclusive.
    pub end: NaiveDate,
    /// Day index of `start` in the source aggregate.
    pub start_index: usize,
    /// Day index one past `end`.
    pub end_index: usize,
    /// Quantile of the values left after outlier removal.
    pub value: f64,
    /// Days with a finite value.
    pub n_points: usize,
    pub n_outliers: usize,
}

impl Segment {
    pub fn n_days(&self) -> usize {
        self.end_index - self.start_index
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Ordered segments covering every day of the input.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Segmentation {
    pub segments: Vec<Segment>,
    /// First day of every segment after the first.
    pub change_dates: Vec<NaiveDate>,
    pub diagnostics: Diagnostics,
}

impl Segmentation {
    /// Segment with the most valid points; the earliest wins ties.
    pub fn longest_segment(&self) -> Option<&Segment> {
        let mut best: Option<&Segment> = None;
        for segment in &self.segments {
            if best.is_none_or(|current| segment.n_points > current.n_points) {
                best = Some(segment);
            }
        }
        best
    }

    pub fn longest_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.longest_segment()
            .map(|segment| (segment.start, segment.end))
    }

    pub fn segment_at(&self, date: NaiveDate) -> Option<&Segment> {
        self.segments.iter().find(|segment| segment.contains(date))
    }

    /// Each day's segment value over the full date range.
    pub fn values_by_day(&self) -> Result<DailyAggregate, QcError> {
        let Some(first) = self.segments.first() else {
            return Err(QcError::input("segmentation holds no segments"));
        };
        let values = self
            .segments
            .iter()
            .flat_map(|segment| std::iter::repeat_n(segment.value, segment.n_days()))
            .collect();
        DailyAggregate::new(first.start, values)
    }
}

/// Splits a daily aggregate into constant-level segments.
#[derive(Clone, Debug)]
pub struct Segmenter {
    config: SegmenterConfig,
}

impl Segmenter {
    pub fn new(config: SegmenterConfig) -> Result<Self, QcError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    pub fn segment(&self, daily: &DailyAggregate) -> Result<Segmentation, QcError> {
        self.segment_with_sinks(daily, None, None)
    }

    /// Days with `NaN` are skipped by the search and attached to the
    /// segment on their left (or the first segment when leading).
    pub fn segment_with_sinks(
        &self,
        daily: &DailyAggregate,
        progress: Option<&dyn ProgressSink>,
        telemetry: Option<&dyn TelemetrySink>,
    ) -> Result<Segmentation, QcError> {
        let config = &self.config;
        let (positions, values) = finite_points(daily.values());
        let min_points = config.constraints.min_segment_len.saturating_mul(2);
        if values.len() < min_points {
            return Err(QcError::insufficient_data(format!(
                "segmentation requires at least {min_points} valid days; got {}",
                values.len()
            )));
        }

        let mut notes = vec![];
        let scale = if config.normalize {
            diff_noise_scale(&values)
        } else {
            0.0
        };
        let searched: Vec<f64> = if scale > 0.0 && scale.is_finite() {
            notes.push(format!("normalized by noise scale {scale}"));
            values.iter().map(|value| value / scale).collect()
        } else {
            values.clone()
        };

        let mut ctx =
            ExecutionContext::new(&config.constraints).with_repro_mode(config.repro_mode);
        if let Some(progress) = progress {
            ctx = ctx.with_progress_sink(progress);
        }
        if let Some(telemetry) = telemetry {
            ctx = ctx.with_telemetry_sink(telemetry);
        }
        let binseg_config = BinSegConfig {
            stopping: config.stopping.clone(),
            ..BinSegConfig::default()
        };
        let result: ChangePointResult = match config.cost {
            CostKind::L2 => BinSeg::new(CostL2Mean::new(config.repro_mode), binseg_config)?
                .detect(&searched, &ctx)?,
            CostKind::L1 => BinSeg::new(CostL1Median::new(config.repro_mode), binseg_config)?
                .detect(&searched, &ctx)?,
        };

        let n_days = daily.len();
        let mut bounds = Vec::with_capacity(result.breakpoints.len() + 1);
        bounds.push(0usize);
        bounds.extend(result.change_points.iter().map(|&cp| positions[cp]));
        bounds.push(n_days);

        let mut segments = Vec::with_capacity(bounds.len() - 1);
        for pair in bounds.windows(2) {
            segments.push(self.summarize(daily, pair[0], pair[1])?);
        }
        let change_dates = segments
            .iter()
            .skip(1)
            .map(|segment| segment.start)
            .collect();

        let missing = compute_missing_run_stats(n_days, n_days - values.len());
        let mut diagnostics = result.diagnostics;
        diagnostics.n = n_days;
        diagnostics.missing_fraction = Some(missing.missing_fraction);
        diagnostics.effective_sample_count = Some(missing.effective_sample_count);
        diagnostics.notes.extend(notes);
        log::debug!(
            "segmented {n_days} days into {} segments ({} valid)",
            segments.len(),
            values.len()
        );

        Ok(Segmentation {
            segments,
            change_dates,
            diagnostics,
        })
    }

    fn summarize(
        &self,
        daily: &DailyAggregate,
        start_index: usize,
        end_index: usize,
    ) -> Result<Segment, QcError> {
        let slice = &daily.values()[start_index..end_index];
        let outliers = if slice.len() < self.config.outlier.min_len() {
            Mask::all_false(slice.len())
        } else {
            self.config.outlier.detect(slice)?
        };
        let retained = retained_values(slice, &outliers)?;
        let n_points = slice.iter().filter(|value| value.is_finite()).count();
        let value = if retained.is_empty() {
            quantile(slice, self.config.quantile)
        } else {
            quantile(&retained, self.config.quantile)
        };

        let (Some(start), Some(end)) = (daily.date(start_index), daily.date(end_index - 1)) else {
            return Err(QcError::numerical_issue(format!(
                "segment [{start_index}, {end_index}) falls outside the {} day range",
                daily.len()
            )));
        };
        Ok(Segment {
            start,
            end,
            start_index,
            end_index,
            value,
            n_points,
            n_outliers: outliers.count(),
        })
    }
}

/// [`Segmenter`] in one call.
pub fn segment_daily(
    daily: &DailyAggregate,
    config: &SegmenterConfig,
) -> Result<Segmentation, QcError> {
    Segmenter::new(config.clone())?.segment(daily)
}
