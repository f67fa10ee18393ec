// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Level-shift segmentation of daily PV series.
//!
//! [`BinSeg`] searches change points over a sequence of valid days,
//! [`Segmenter`] maps them back to calendar segments with robust levels, and
//! the data-shift and time-shift pipelines build on both.

pub mod binseg;
pub mod data_shifts;
pub mod segmenter;
pub mod time_shifts;

pub use binseg::{BinSeg, BinSegConfig};
pub use data_shifts::{
    DataShiftConfig, DataShiftResult, detect_data_shifts, erroneous_filter, filter_data_shifts,
    min_max_normalize, remove_seasonality,
};
pub use segmenter::{Segment, Segmentation, Segmenter, SegmenterConfig, segment_daily};
pub use time_shifts::{TimeShiftConfig, TimeShiftResult, estimate_time_shifts, round_to_step};
