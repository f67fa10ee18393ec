// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

/// Missing-data summary attached to diagnostics.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct MissingRunStats {
    pub missing_fraction: f64,
    pub effective_sample_count: usize,
}

/// Positions and values of the finite entries, in order.
pub fn finite_points(values: &[f64]) -> (Vec<usize>, Vec<f64>) {
    values
        .iter()
        .enumerate()
        .filter(|(_, value)| value.is_finite())
        .map(|(idx, &value)| (idx, value))
        .unzip()
}

pub fn compute_missing_run_stats(total_values: usize, missing_count: usize) -> MissingRunStats {
    let bounded_missing = missing_count.min(total_values);
    let missing_fraction = if total_values == 0 {
        0.0
    } else {
        bounded_missing as f64 / total_values as f64
    };

    MissingRunStats {
        missing_fraction,
        effective_sample_count: total_values - bounded_missing,
    }
}

#[cfg(test)]
mod tests {
    use super::{compute_missing_run_stats, finite_points};

    #[test]
    fn finite_points_keeps_order() {
        let (idx, values) = finite_points(&[f64::NAN, 2.0, f64::NAN, 4.0]);
        assert_eq!(idx, vec![1, 3]);
        assert_eq!(values, vec![2.0, 4.0]);
    }

    #[test]
    fn run_stats_bound_and_handle_empty() {
        let stats = compute_missing_run_stats(10, 3);
        assert!((stats.missing_fraction - 0.3).abs() < 1e-12);
        assert_eq!(stats.effective_sample_count, 7);

        let empty = compute_missing_run_stats(0, 0);
        assert_eq!(empty.missing_fraction, 0.0);
        assert_eq!(empty.effective_sample_count, 0);

        let clamped = compute_missing_run_stats(4, 9);
        assert_eq!(clamped.missing_fraction, 1.0);
        assert_eq!(clamped.effective_sample_count, 0);
    }
}
