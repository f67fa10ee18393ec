// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::hampel::{HampelConfig, hampel};
use crate::tukey::{DEFAULT_TUKEY_K, tukey};
use crate::zscore::zscore;
use pvqc_core::{Mask, QcError, require_non_negative};

/// Outlier rule applied to the values of one segment.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub enum OutlierMethod {
    Tukey { k: f64 },
    ZScore { zmax: f64 },
    Hampel(HampelConfig),
    None,
}

impl Default for OutlierMethod {
    fn default() -> Self {
        Self::Tukey { k: DEFAULT_TUKEY_K }
    }
}

impl OutlierMethod {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tukey { .. } => "tukey",
            Self::ZScore { .. } => "zscore",
            Self::Hampel(_) => "hampel",
            Self::None => "none",
        }
    }

    pub fn validate(&self) -> Result<(), QcError> {
        match self {
            Self::Tukey { k } => require_non_negative(*k, "tukey.k"),
            Self::ZScore { zmax } => require_non_negative(*zmax, "zscore.zmax"),
            Self::Hampel(config) => config.validate(),
            Self::None => Ok(()),
        }
    }

    /// Fewest samples [`Self::detect`] accepts.
    pub fn min_len(&self) -> usize {
        match self {
            Self::Hampel(config) => config.window,
            Self::Tukey { .. } | Self::ZScore { .. } | Self::None => 0,
        }
    }

    pub fn detect(&self, values: &[f64]) -> Result<Mask, QcError> {
        match self {
            Self::Tukey { k } => tukey(values, *k),
            Self::ZScore { zmax } => zscore(values, *zmax),
            Self::Hampel(config) => hampel(values, config),
            Self::None => Ok(Mask::all_false(values.len())),
        }
    }
}

/// Finite values not flagged by `outliers`, in input order.
pub fn retained_values(values: &[f64], outliers: &Mask) -> Result<Vec<f64>, QcError> {
    outliers.check_aligned(values.len(), "outlier mask")?;
    Ok(values
        .iter()
        .zip(outliers.iter())
        .filter(|(value, flagged)| value.is_finite() && !flagged)
        .map(|(&value, _)| value)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::{OutlierMethod, retained_values};
    use crate::hampel::HampelConfig;
    use pvqc_core::{Mask, QcError};

    #[test]
    fn default_is_tukey_with_standard_k() {
        assert_eq!(OutlierMethod::default(), OutlierMethod::Tukey { k: 1.5 });
        assert_eq!(OutlierMethod::default().name(), "tukey");
    }

    #[test]
    fn dispatch_matches_direct_calls() {
        let values = [1.0, 1.2, 0.9, 1.1, 1.0, 25.0, 1.05];
        for method in [
            OutlierMethod::Tukey { k: 1.5 },
            OutlierMethod::ZScore { zmax: 2.0 },
            OutlierMethod::Hampel(HampelConfig::default()),
        ] {
            let mask = method.detect(&values).expect("valid method");
            assert_eq!(mask.get(5), Some(true), "{} should flag the spike", method.name());
        }
        let none = OutlierMethod::None.detect(&values).expect("none is valid");
        assert!(!none.any());
    }

    #[test]
    fn only_hampel_needs_a_full_window() {
        let hampel = OutlierMethod::Hampel(HampelConfig {
            window: 7,
            ..HampelConfig::default()
        });
        assert_eq!(hampel.min_len(), 7);
        assert!(hampel.detect(&[1.0; 6]).is_err());
        assert_eq!(OutlierMethod::default().min_len(), 0);
        assert_eq!(OutlierMethod::None.min_len(), 0);
    }

    #[test]
    fn validate_reports_parameter_names() {
        let err = OutlierMethod::ZScore { zmax: -1.0 }
            .validate()
            .expect_err("negative zmax");
        assert!(matches!(err, QcError::Configuration(_)));
        assert!(err.to_string().contains("zscore.zmax"));
    }

    #[test]
    fn retained_values_skip_nan_and_outliers() {
        let values = [1.0, f64::NAN, 3.0, 99.0];
        let mask = Mask::new(vec![false, false, false, true]);
        assert_eq!(retained_values(&values, &mask).expect("aligned"), vec![1.0, 3.0]);
        assert!(retained_values(&values, &Mask::all_false(2)).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn method_serde_roundtrip() {
        for method in [
            OutlierMethod::Tukey { k: 3.0 },
            OutlierMethod::ZScore { zmax: 1.5 },
            OutlierMethod::Hampel(HampelConfig::default()),
            OutlierMethod::None,
        ] {
            let encoded = serde_json::to_string(&method).expect("should serialize");
            let decoded: OutlierMethod = serde_json::from_str(&encoded).expect("should deserialize");
            assert_eq!(decoded, method);
        }
    }
}
