// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::runs::{MarkPolicy, RunDetection, mark_linked_runs, require_run_input};
use crate::stale::within_tolerance;
use pvqc_core::{QcError, TimeSeries, require_non_negative};

/// Straight-line fill detection parameters.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct InterpolationConfig {
    /// Shortest collinear run, in samples.
    pub min_run_length: usize,
    /// Absolute tolerance between consecutive first differences.
    pub tolerance: f64,
    /// Tolerance relative to the earlier first difference.
    pub relative_tolerance: f64,
    pub mark: MarkPolicy,
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self {
            min_run_length: 3,
            tolerance: 1e-8,
            relative_tolerance: 0.0,
            mark: MarkPolicy::All,
        }
    }
}

impl InterpolationConfig {
    pub fn exact(min_run_length: usize) -> Self {
        Self {
            min_run_length,
            tolerance: 0.0,
            relative_tolerance: 0.0,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), QcError> {
        if self.min_run_length < 3 {
            return Err(QcError::configuration(format!(
                "interpolation.min_run_length must be >= 3; got {}",
                self.min_run_length
            )));
        }
        require_non_negative(self.tolerance, "interpolation.tolerance")?;
        require_non_negative(self.relative_tolerance, "interpolation.relative_tolerance")?;
        Ok(())
    }
}

/// Flags runs of samples lying on one straight line.
///
/// Sample `i` extends a run when `x[i] - x[i-1]` matches `x[i-1] - x[i-2]`
/// within tolerance, so every run spans at least three samples. Constant
/// runs are collinear and are flagged as well. Two runs with different
/// slopes may share their joining sample.
pub fn detect_interpolation(
    values: &[f64],
    config: &InterpolationConfig,
) -> Result<RunDetection, QcError> {
    config.validate()?;
    require_run_input(values, config.min_run_length, "interpolation detection")?;

    let diffs: Vec<f64> = std::iter::once(f64::NAN)
        .chain(values.windows(2).map(|pair| pair[1] - pair[0]))
        .collect();

    let mut links = vec![false; values.len()];
    for idx in 2..values.len() {
        links[idx] = within_tolerance(
            diffs[idx],
            diffs[idx - 1],
            config.tolerance,
            config.relative_tolerance,
        );
    }

    let detection = mark_linked_runs(&links, 2, config.min_run_length, config.mark);
    log::debug!(
        "interpolation detection: n={} runs={} flagged={}",
        values.len(),
        detection.runs.len(),
        detection.flagged_count()
    );
    Ok(detection)
}

/// [`detect_interpolation`] over the values of a series.
pub fn detect_interpolation_series(
    series: &TimeSeries,
    config: &InterpolationConfig,
) -> Result<RunDetection, QcError> {
    detect_interpolation(series.values(), config)
}

#[cfg(test)]
mod tests {
    use super::{InterpolationConfig, detect_interpolation};
    use crate::runs::MarkPolicy;
    use pvqc_core::{QcError, Run};

    #[test]
    fn linear_fill_is_flagged_with_its_anchors() {
        let values = [5.0, 1.0, 2.0, 3.0, 4.0, 9.0, 2.0];
        let detection =
            detect_interpolation(&values, &InterpolationConfig::exact(3)).expect("detect");
        assert_eq!(detection.runs, vec![Run { start: 1, end: 5 }]);
        assert_eq!(
            detection.mask.as_slice(),
            &[false, true, true, true, true, false, false]
        );
    }

    #[test]
    fn constant_values_are_collinear() {
        let values = [7.0; 6];
        let detection =
            detect_interpolation(&values, &InterpolationConfig::exact(6)).expect("detect");
        assert!(detection.mask.all());
    }

    #[test]
    fn curved_values_are_clean() {
        let values: Vec<f64> = (0..12).map(|i| f64::from(i * i)).collect();
        let detection =
            detect_interpolation(&values, &InterpolationConfig::exact(3)).expect("detect");
        assert!(!detection.mask.any());
    }

    #[test]
    fn short_run_below_minimum_is_ignored() {
        let values = [0.0, 9.0, 1.0, 2.0, 3.0, 8.0];
        let config = InterpolationConfig::exact(4);
        let detection = detect_interpolation(&values, &config).expect("detect");
        assert!(!detection.mask.any());
        let detection =
            detect_interpolation(&values, &InterpolationConfig::exact(3)).expect("detect");
        assert_eq!(detection.runs, vec![Run { start: 2, end: 5 }]);
    }

    #[test]
    fn adjacent_slopes_share_their_vertex() {
        let values = [0.0, 1.0, 2.0, 3.0, 1.0, -1.0, -3.0];
        let detection =
            detect_interpolation(&values, &InterpolationConfig::exact(3)).expect("detect");
        assert_eq!(
            detection.runs,
            vec![Run { start: 0, end: 4 }, Run { start: 3, end: 7 }]
        );
        assert!(detection.mask.all());
    }

    #[test]
    fn nan_interrupts_a_line() {
        let values = [1.0, 2.0, f64::NAN, 4.0, 5.0];
        let detection =
            detect_interpolation(&values, &InterpolationConfig::exact(3)).expect("detect");
        assert!(!detection.mask.any());
    }

    #[test]
    fn end_marking_flags_the_last_sample_only() {
        let values = [0.0, 0.5, 1.0, 1.5, 7.0];
        let config = InterpolationConfig {
            mark: MarkPolicy::End,
            ..InterpolationConfig::exact(3)
        };
        let detection = detect_interpolation(&values, &config).expect("detect");
        assert_eq!(detection.mask.flagged_indices(), vec![3]);
    }

    #[test]
    fn minimum_run_below_three_is_rejected() {
        let err = detect_interpolation(&[1.0, 2.0], &InterpolationConfig::exact(2))
            .expect_err("run length");
        assert!(matches!(err, QcError::Configuration(_)));
        assert!(err.to_string().contains("interpolation.min_run_length"));
    }

    #[test]
    fn zero_tolerance_over_defaults_compares_slopes_exactly() {
        let values = [0.0, 1000.0, 2000.005, 3000.004];
        let config = InterpolationConfig {
            tolerance: 0.0,
            ..InterpolationConfig::default()
        };
        assert!(!detect_interpolation(&values, &config).expect("detect").mask.any());
    }

    #[test]
    fn short_input_is_rejected() {
        let err = detect_interpolation(&[], &InterpolationConfig::default()).expect_err("empty");
        assert!(matches!(err, QcError::Input(_)));

        let err = detect_interpolation(&[1.0, 2.0, 3.0], &InterpolationConfig::exact(4))
            .expect_err("short");
        assert!(matches!(err, QcError::InsufficientData(_)));
    }
}
