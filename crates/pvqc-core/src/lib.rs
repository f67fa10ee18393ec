// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Shared series types, validation, numerics and segmentation plumbing for pvqc.

pub mod constraints;
pub mod daily;
pub mod detector;
pub mod diagnostics;
pub mod error;
pub mod execution_context;
pub mod mask;
pub mod missing;
pub mod numerics;
pub mod observability;
pub mod repro;
pub mod results;
pub mod stopping;
pub mod time_series;
pub mod validation;

pub use constraints::{Constraints, ValidatedConstraints};
pub use daily::{DailyAgg, DailyAggregate};
pub use detector::ChangePointDetector;
pub use diagnostics::Diagnostics;
pub use error::QcError;
pub use execution_context::ExecutionContext;
pub use mask::{Mask, Run};
pub use missing::{MissingRunStats, compute_missing_run_stats, finite_points};
pub use numerics::{
    MAD_NORMAL_SCALE, diff_noise_scale, kahan_sum, median, median_abs_deviation,
    prefix_sum_squares, prefix_sum_squares_kahan, prefix_sums, prefix_sums_kahan, quantile,
    quantile_sorted, sorted_finite, stable_mean, stable_variance,
};
pub use observability::{
    LogTelemetrySink, NoopProgressSink, NoopTelemetrySink, ProgressSink, TelemetrySink,
};
pub use repro::ReproMode;
pub use results::{ChangePointResult, segment_bounds, validate_breakpoints};
pub use stopping::{Penalty, Stopping};
pub use time_series::{TimeSeries, TimeZoneKind};
pub use validation::{
    Timestamp, infer_freq, require_finite, require_non_negative, require_unit_interval,
    validate_freq, validate_series,
};
