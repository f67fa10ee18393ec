// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Sample-level quality checks: stale and interpolated runs, daily
//! completeness and trimming of sparse leading/trailing days.

pub mod completeness;
pub mod interpolation;
pub mod runs;
pub mod stale;
pub mod trim;

pub use completeness::{
    CompletenessConfig, CompletenessReport, DayStatus, complete_mask, completeness_score,
    expected_samples_per_day,
};
pub use interpolation::{InterpolationConfig, detect_interpolation, detect_interpolation_series};
pub use runs::{MarkPolicy, RunDetection};
pub use stale::{StaleConfig, detect_stale, detect_stale_series};
pub use trim::{TrimConfig, start_stop_dates, trim, trim_mask};
