// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use pvqc_core::{Mask, QcError, require_non_negative, stable_mean, stable_variance};

pub const DEFAULT_ZMAX: f64 = 1.5;

/// Flags values whose absolute z-score exceeds `zmax`.
///
/// Uses the population standard deviation of the finite entries. A zero
/// deviation flags nothing.
pub fn zscore(values: &[f64], zmax: f64) -> Result<Mask, QcError> {
    require_non_negative(zmax, "zscore.zmax")?;
    let finite = values
        .iter()
        .copied()
        .filter(|value| value.is_finite())
        .collect::<Vec<_>>();
    if finite.is_empty() {
        return Ok(Mask::all_false(values.len()));
    }

    let mean = stable_mean(&finite);
    let std = stable_variance(&finite, mean).sqrt();
    if std == 0.0 || !std.is_finite() {
        return Ok(Mask::all_false(values.len()));
    }

    Ok(values
        .iter()
        .map(|&value| value.is_finite() && ((value - mean) / std).abs() > zmax)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::zscore;

    #[test]
    fn flags_large_deviations() {
        let values = [10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 40.0];
        // mean 13, std 9 -> z(40) = 3, z(10) = 1/3
        let mask = zscore(&values, 1.5).expect("valid zmax");
        assert_eq!(mask.flagged_indices(), vec![9]);
        let strict = zscore(&values, 3.1).expect("valid zmax");
        assert!(!strict.any(), "z below zmax is not an outlier");
    }

    #[test]
    fn constant_input_flags_nothing() {
        let mask = zscore(&[2.0; 6], 0.0).expect("valid zmax");
        assert!(!mask.any());
    }

    #[test]
    fn nan_is_skipped() {
        let mask = zscore(&[f64::NAN, 0.0, 0.0, 0.0, 9.0], 1.5).expect("valid zmax");
        assert_eq!(mask.as_slice(), &[false, false, false, false, true]);
    }

    #[test]
    fn rejects_invalid_zmax() {
        assert!(zscore(&[1.0], f64::NAN).is_err());
        assert!(zscore(&[1.0], -0.5).is_err());
    }
}
