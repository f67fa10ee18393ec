// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

/// Normal-consistency factor for the median absolute deviation.
pub const MAD_NORMAL_SCALE: f64 = 1.4826;

/// Computes the mean using Welford's online update.
///
/// Empty input returns `NaN`.
pub fn stable_mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }

    let mut mean = 0.0;
    for (idx, &value) in values.iter().enumerate() {
        mean += (value - mean) / (idx + 1) as f64;
    }
    mean
}

/// Population variance (`/ n`) around `mean`, clamped at `0.0`.
///
/// Empty input returns `NaN`.
pub fn stable_variance(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }

    let mut acc = Neumaier::default();
    for &value in values {
        let diff = value - mean;
        acc.add(diff * diff);
    }

    (acc.total() / values.len() as f64).max(0.0)
}

/// Compensated sum. Empty input returns `0.0`.
pub fn kahan_sum(values: &[f64]) -> f64 {
    let mut acc = Neumaier::default();
    for &value in values {
        acc.add(value);
    }
    acc.total()
}

/// Prefix sums with length `n + 1` and `prefix[0] = 0.0`.
pub fn prefix_sums(values: &[f64]) -> Vec<f64> {
    prefix_with(values, |value| value, false)
}

/// Prefix sums of squares with length `n + 1` and `prefix[0] = 0.0`.
pub fn prefix_sum_squares(values: &[f64]) -> Vec<f64> {
    prefix_with(values, |value| value * value, false)
}

/// Compensated variant of [`prefix_sums`].
pub fn prefix_sums_kahan(values: &[f64]) -> Vec<f64> {
    prefix_with(values, |value| value, true)
}

/// Compensated variant of [`prefix_sum_squares`].
pub fn prefix_sum_squares_kahan(values: &[f64]) -> Vec<f64> {
    prefix_with(values, |value| value * value, true)
}

fn prefix_with(values: &[f64], term: impl Fn(f64) -> f64, compensated: bool) -> Vec<f64> {
    let mut prefix = Vec::with_capacity(values.len() + 1);
    prefix.push(0.0);

    let mut acc = Neumaier::default();
    let mut plain = 0.0;
    for &value in values {
        let t = term(value);
        if compensated {
            acc.add(t);
            prefix.push(acc.total());
        } else {
            plain += t;
            prefix.push(plain);
        }
    }
    prefix
}

#[derive(Default)]
struct Neumaier {
    sum: f64,
    c: f64,
}

impl Neumaier {
    fn add(&mut self, value: f64) {
        let t = self.sum + value;
        if self.sum.abs() >= value.abs() {
            self.c += (self.sum - t) + value;
        } else {
            self.c += (value - t) + self.sum;
        }
        self.sum = t;
    }

    fn total(&self) -> f64 {
        self.sum + self.c
    }
}

/// Finite values of `values` in ascending order.
pub fn sorted_finite(values: &[f64]) -> Vec<f64> {
    let mut sorted = values
        .iter()
        .copied()
        .filter(|value| value.is_finite())
        .collect::<Vec<_>>();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Quantile of pre-sorted data using linear interpolation between order statistics.
///
/// `q` is clamped to `[0, 1]`; empty input returns `NaN`.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let Some(&last) = sorted.last() else {
        return f64::NAN;
    };
    if sorted.len() == 1 {
        return last;
    }

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + frac * (sorted[hi] - sorted[lo])
}

/// Linear-interpolation quantile over the finite entries of `values`.
pub fn quantile(values: &[f64], q: f64) -> f64 {
    quantile_sorted(&sorted_finite(values), q)
}

/// Median of the finite entries; `NaN` when there are none.
pub fn median(values: &[f64]) -> f64 {
    quantile(values, 0.5)
}

/// Unscaled median absolute deviation of finite entries around their median.
pub fn median_abs_deviation(values: &[f64]) -> f64 {
    let center = median(values);
    if center.is_nan() {
        return f64::NAN;
    }
    let deviations = values
        .iter()
        .filter(|value| value.is_finite())
        .map(|value| (value - center).abs())
        .collect::<Vec<_>>();
    median(&deviations)
}

/// Robust noise level of a sequence from the MAD of its first differences.
///
/// Differences are taken between consecutive finite entries. The `1/sqrt(2)`
/// factor maps the spread of differences back to per-sample noise. Returns
/// `0.0` when fewer than two finite entries exist.
pub fn diff_noise_scale(values: &[f64]) -> f64 {
    let finite = values
        .iter()
        .copied()
        .filter(|value| value.is_finite())
        .collect::<Vec<_>>();
    if finite.len() < 2 {
        return 0.0;
    }
    let diffs = finite
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .collect::<Vec<_>>();
    MAD_NORMAL_SCALE * median_abs_deviation(&diffs) / std::f64::consts::SQRT_2
}
