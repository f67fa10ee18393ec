// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::model::CostModel;
use pvqc_core::{
    QcError, ReproMode, prefix_sum_squares, prefix_sum_squares_kahan, prefix_sums,
    prefix_sums_kahan,
};

/// Least-squares segment cost around the segment mean.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CostL2Mean {
    pub repro_mode: ReproMode,
}

impl CostL2Mean {
    pub const fn new(repro_mode: ReproMode) -> Self {
        Self { repro_mode }
    }
}

impl Default for CostL2Mean {
    fn default() -> Self {
        Self::new(ReproMode::Balanced)
    }
}

/// Prefix sums for O(1) segment queries.
#[derive(Clone, Debug, PartialEq)]
pub struct L2Cache {
    prefix_sum: Vec<f64>,
    prefix_sum_sq: Vec<f64>,
    n: usize,
}

impl L2Cache {
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }
}

impl CostModel for CostL2Mean {
    type Cache = L2Cache;

    fn name(&self) -> &'static str {
        "l2_mean"
    }

    fn precompute(&self, values: &[f64]) -> Result<L2Cache, QcError> {
        self.validate(values)?;
        let (prefix_sum, prefix_sum_sq) = match self.repro_mode {
            ReproMode::Strict => (prefix_sums_kahan(values), prefix_sum_squares_kahan(values)),
            ReproMode::Balanced => (prefix_sums(values), prefix_sum_squares(values)),
        };
        if let Some(total) = prefix_sum_sq.last()
            && !total.is_finite()
        {
            return Err(QcError::numerical_issue(format!(
                "l2_mean sum of squares overflowed: {total}"
            )));
        }
        Ok(L2Cache {
            prefix_sum,
            prefix_sum_sq,
            n: values.len(),
        })
    }

    fn segment_cost(&self, cache: &L2Cache, start: usize, end: usize) -> f64 {
        assert!(
            start < end,
            "segment_cost requires start < end; got start={start}, end={end}"
        );
        assert!(
            end <= cache.n,
            "segment_cost end out of bounds: end={end}, n={}",
            cache.n
        );

        let m = (end - start) as f64;
        let sum = cache.prefix_sum[end] - cache.prefix_sum[start];
        let sum_sq = cache.prefix_sum_sq[end] - cache.prefix_sum_sq[start];
        (sum_sq - sum * sum / m).max(0.0)
    }
}
