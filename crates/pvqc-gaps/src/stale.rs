// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::runs::{MarkPolicy, RunDetection, mark_linked_runs, require_run_input};
use pvqc_core::{QcError, TimeSeries, require_non_negative};

/// Repeated-value detection parameters.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct StaleConfig {
    /// Shortest run, in samples, that counts as stale.
    pub min_run_length: usize,
    /// Absolute tolerance between a sample and its predecessor.
    pub tolerance: f64,
    /// Tolerance relative to the predecessor's magnitude.
    pub relative_tolerance: f64,
    /// Round to this many decimals before comparing.
    pub decimals: Option<i32>,
    pub mark: MarkPolicy,
}

impl Default for StaleConfig {
    fn default() -> Self {
        Self {
            min_run_length: 3,
            tolerance: 1e-8,
            relative_tolerance: 0.0,
            decimals: None,
            mark: MarkPolicy::All,
        }
    }
}

impl StaleConfig {
    /// Exact-equality comparison.
    pub fn exact(min_run_length: usize) -> Self {
        Self {
            min_run_length,
            tolerance: 0.0,
            relative_tolerance: 0.0,
            ..Self::default()
        }
    }

    /// Rounded comparison with tail marking, as used before shift detection.
    pub fn rounded(decimals: i32, min_run_length: usize) -> Self {
        Self {
            min_run_length,
            decimals: Some(decimals),
            mark: MarkPolicy::Tail,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), QcError> {
        if self.min_run_length < 2 {
            return Err(QcError::configuration(format!(
                "stale.min_run_length must be >= 2; got {}",
                self.min_run_length
            )));
        }
        require_non_negative(self.tolerance, "stale.tolerance")?;
        require_non_negative(self.relative_tolerance, "stale.relative_tolerance")?;
        Ok(())
    }
}

pub(crate) fn within_tolerance(current: f64, previous: f64, atol: f64, rtol: f64) -> bool {
    current.is_finite()
        && previous.is_finite()
        && (current - previous).abs() <= atol + rtol * previous.abs()
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    let rounded = (value * factor).round() / factor;
    if rounded.is_finite() { rounded } else { value }
}

/// Flags runs of values that repeat their predecessor.
///
/// `NaN` never links to a neighbour, so it always ends a run. Input shorter
/// than `min_run_length` is rejected.
pub fn detect_stale(values: &[f64], config: &StaleConfig) -> Result<RunDetection, QcError> {
    config.validate()?;
    require_run_input(values, config.min_run_length, "stale detection")?;

    let compared: Vec<f64> = match config.decimals {
        Some(decimals) => values.iter().map(|&v| round_to(v, decimals)).collect(),
        None => values.to_vec(),
    };

    let mut links = vec![false; compared.len()];
    for idx in 1..compared.len() {
        links[idx] = within_tolerance(
            compared[idx],
            compared[idx - 1],
            config.tolerance,
            config.relative_tolerance,
        );
    }

    let detection = mark_linked_runs(&links, 1, config.min_run_length, config.mark);
    log::debug!(
        "stale detection: n={} runs={} flagged={}",
        values.len(),
        detection.runs.len(),
        detection.flagged_count()
    );
    Ok(detection)
}

/// [`detect_stale`] over the values of a series.
pub fn detect_stale_series(
    series: &TimeSeries,
    config: &StaleConfig,
) -> Result<RunDetection, QcError> {
    detect_stale(series.values(), config)
}

#[cfg(test)]
mod tests {
    use super::{StaleConfig, detect_stale};
    use crate::runs::MarkPolicy;
    use pvqc_core::{QcError, Run};

    #[test]
    fn identical_values_are_all_flagged() {
        let values = [4.2; 10];
        let detection = detect_stale(&values, &StaleConfig::exact(5)).expect("detect");
        assert!(detection.mask.all());
        assert_eq!(detection.runs, vec![Run { start: 0, end: 10 }]);
    }

    #[test]
    fn run_includes_first_sample_and_touches_edges() {
        let values = [1.0, 1.0, 1.0, 2.0, 3.0, 5.0, 5.0, 5.0];
        let detection = detect_stale(&values, &StaleConfig::exact(3)).expect("detect");
        assert_eq!(
            detection.mask.as_slice(),
            &[true, true, true, false, false, true, true, true]
        );
        assert_eq!(
            detection.runs,
            vec![Run { start: 0, end: 3 }, Run { start: 5, end: 8 }]
        );
    }

    #[test]
    fn strictly_changing_values_are_clean() {
        let values = [1.0, 2.0, 1.0, 2.0, 3.0, 4.0];
        let detection = detect_stale(&values, &StaleConfig::exact(2)).expect("detect");
        assert!(!detection.mask.any());
        assert!(detection.runs.is_empty());
    }

    #[test]
    fn nan_breaks_a_run() {
        let values = [2.0, 2.0, f64::NAN, 2.0, 2.0];
        let detection = detect_stale(&values, &StaleConfig::exact(3)).expect("detect");
        assert!(!detection.mask.any());
    }

    #[test]
    fn tolerance_links_near_equal_values() {
        let values = [10.0, 10.05, 10.02, 11.0];
        let mut config = StaleConfig::exact(3);
        assert!(!detect_stale(&values, &config).expect("detect").mask.any());
        config.tolerance = 0.1;
        let detection = detect_stale(&values, &config).expect("detect");
        assert_eq!(detection.mask.as_slice(), &[true, true, true, false]);
    }

    #[test]
    fn relative_tolerance_scales_with_magnitude() {
        let values = [1000.0, 1000.5, 1000.9, 5.0];
        let config = StaleConfig {
            relative_tolerance: 1e-3,
            ..StaleConfig::exact(3)
        };
        let detection = detect_stale(&values, &config).expect("detect");
        assert_eq!(detection.mask.count(), 3);
    }

    #[test]
    fn rounding_merges_values_that_differ_below_resolution() {
        let values = [0.5001, 0.5002, 0.4999, 0.5003, 0.8];
        let config = StaleConfig {
            decimals: Some(3),
            ..StaleConfig::exact(4)
        };
        let detection = detect_stale(&values, &config).expect("detect");
        assert_eq!(detection.mask.as_slice(), &[true, true, true, true, false]);
    }

    #[test]
    fn mark_policies_apply_to_each_run() {
        let values = [3.0, 3.0, 3.0, 3.0, 1.0];
        let tail = StaleConfig {
            mark: MarkPolicy::Tail,
            ..StaleConfig::exact(3)
        };
        let detection = detect_stale(&values, &tail).expect("detect");
        assert_eq!(detection.mask.as_slice(), &[false, true, true, true, false]);

        let end = StaleConfig {
            mark: MarkPolicy::End,
            ..StaleConfig::exact(3)
        };
        let detection = detect_stale(&values, &end).expect("detect");
        assert_eq!(detection.mask.as_slice(), &[false, false, false, true, false]);
    }

    #[test]
    fn invalid_parameters_are_configuration_errors() {
        let err = detect_stale(&[1.0], &StaleConfig::exact(1)).expect_err("run length");
        assert!(matches!(err, QcError::Configuration(_)));
        assert!(err.to_string().contains("stale.min_run_length"));

        let config = StaleConfig {
            tolerance: -1.0,
            ..StaleConfig::default()
        };
        let err = detect_stale(&[1.0], &config).expect_err("tolerance");
        assert!(err.to_string().contains("stale.tolerance"));

        let config = StaleConfig {
            relative_tolerance: f64::NAN,
            ..StaleConfig::default()
        };
        let err = detect_stale(&[1.0], &config).expect_err("relative tolerance");
        assert!(err.to_string().contains("stale.relative_tolerance"));
    }

    #[test]
    fn zero_tolerance_over_defaults_is_exact_equality() {
        let values = [1000.0, 1000.005, 1000.001, 1000.009, 1000.002];
        let config = StaleConfig {
            tolerance: 0.0,
            min_run_length: 3,
            ..StaleConfig::default()
        };
        assert!(!detect_stale(&values, &config).expect("detect").mask.any());
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = detect_stale(&[], &StaleConfig::default()).expect_err("empty");
        assert!(matches!(err, QcError::Input(_)));
    }

    #[test]
    fn input_shorter_than_minimum_run_is_insufficient() {
        let err = detect_stale(&[1.0, 1.0], &StaleConfig::exact(5)).expect_err("short");
        assert!(matches!(err, QcError::InsufficientData(_)));
        assert!(err.to_string().contains("min_run_length=5"));

        let detection = detect_stale(&[1.0; 5], &StaleConfig::exact(5)).expect("detect");
        assert!(detection.mask.all());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn config_roundtrips_through_json() {
        let config = StaleConfig::rounded(3, 6);
        let encoded = serde_json::to_string(&config).expect("serialize");
        let decoded: StaleConfig = serde_json::from_str(&encoded).expect("deserialize");
        assert_eq!(decoded, config);
    }
}
