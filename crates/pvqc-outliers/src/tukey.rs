// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use pvqc_core::{Mask, QcError, quantile_sorted, require_non_negative, sorted_finite};

pub const DEFAULT_TUKEY_K: f64 = 1.5;

/// Lower and upper IQR fences `(Q1 - k*IQR, Q3 + k*IQR)`.
///
/// `None` when there are no finite values.
pub fn tukey_fences(values: &[f64], k: f64) -> Result<Option<(f64, f64)>, QcError> {
    require_non_negative(k, "tukey.k")?;
    let sorted = sorted_finite(values);
    if sorted.is_empty() {
        return Ok(None);
    }
    let q1 = quantile_sorted(&sorted, 0.25);
    let q3 = quantile_sorted(&sorted, 0.75);
    let iqr = q3 - q1;
    Ok(Some((q1 - k * iqr, q3 + k * iqr)))
}

/// Flags values strictly outside the Tukey fences.
pub fn tukey(values: &[f64], k: f64) -> Result<Mask, QcError> {
    let Some((lower, upper)) = tukey_fences(values, k)? else {
        return Ok(Mask::all_false(values.len()));
    };
    Ok(values
        .iter()
        .map(|&value| value < lower || value > upper)
        .collect())
}
