// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::model::CostModel;
use pvqc_core::{QcError, ReproMode, kahan_sum};

/// Absolute-deviation segment cost around the segment median.
///
/// Robust to isolated spikes; each query is `O(m)` in the segment length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CostL1Median {
    pub repro_mode: ReproMode,
}

impl CostL1Median {
    pub const fn new(repro_mode: ReproMode) -> Self {
        Self { repro_mode }
    }
}

impl Default for CostL1Median {
    fn default() -> Self {
        Self::new(ReproMode::Balanced)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct L1MedianCache {
    values: Vec<f64>,
}

fn median_in_place(values: &mut [f64]) -> f64 {
    let len = values.len();
    let mid = len / 2;
    let (lower, upper_mid, _) = values.select_nth_unstable_by(mid, f64::total_cmp);
    let upper = *upper_mid;
    if len % 2 == 1 {
        return upper;
    }
    let lower_max = lower
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    0.5 * (lower_max + upper)
}

impl CostModel for CostL1Median {
    type Cache = L1MedianCache;

    fn name(&self) -> &'static str {
        "l1_median"
    }

    fn precompute(&self, values: &[f64]) -> Result<L1MedianCache, QcError> {
        self.validate(values)?;
        Ok(L1MedianCache {
            values: values.to_vec(),
        })
    }

    fn segment_cost(&self, cache: &L1MedianCache, start: usize, end: usize) -> f64 {
        assert!(
            start < end,
            "segment_cost requires start < end; got start={start}, end={end}"
        );
        assert!(
            end <= cache.values.len(),
            "segment_cost end out of bounds: end={end}, n={}",
            cache.values.len()
        );

        let mut scratch = cache.values[start..end].to_vec();
        let median = median_in_place(&mut scratch);
        let deviations = scratch
            .iter()
            .map(|value| (value - median).abs())
            .collect::<Vec<_>>();
        let total = match self.repro_mode {
            ReproMode::Strict => kahan_sum(&deviations),
            ReproMode::Balanced => deviations.iter().sum(),
        };
        total.max(0.0)
    }
}
