// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Outlier masks over numeric sequences.
//!
//! Every filter returns a [`Mask`](pvqc_core::Mask) with `true` at outliers.
//! `NaN` entries are never flagged and never influence the statistics.

pub mod hampel;
pub mod method;
pub mod tukey;
pub mod zscore;

pub use hampel::{HampelConfig, hampel};
pub use method::{OutlierMethod, retained_values};
pub use tukey::{DEFAULT_TUKEY_K, tukey, tukey_fences};
pub use zscore::{DEFAULT_ZMAX, zscore};
