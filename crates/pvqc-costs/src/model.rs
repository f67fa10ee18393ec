// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use pvqc_core::QcError;

/// Segment cost contract used by change point search.
///
/// Segments are half-open intervals `[start, end)` over a finite sequence.
pub trait CostModel {
    type Cache: Send + Sync;

    fn name(&self) -> &'static str;

    /// Rejects sequences the model cannot score.
    fn validate(&self, values: &[f64]) -> Result<(), QcError> {
        if values.is_empty() {
            return Err(QcError::insufficient_data(format!(
                "{} requires n >= 1; got n=0",
                self.name()
            )));
        }
        if let Some((idx, value)) = values
            .iter()
            .enumerate()
            .find(|(_, value)| !value.is_finite())
        {
            return Err(QcError::input(format!(
                "{} requires finite values; got values[{idx}]={value}",
                self.name()
            )));
        }
        Ok(())
    }

    fn precompute(&self, values: &[f64]) -> Result<Self::Cache, QcError>;

    /// Parameters per segment counted by BIC/AIC penalties.
    fn penalty_params_per_segment(&self) -> usize {
        2
    }

    fn segment_cost(&self, cache: &Self::Cache, start: usize, end: usize) -> f64;
}

/// Selectable built-in cost model.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CostKind {
    /// Piecewise-constant mean, squared error.
    #[default]
    L2,
    /// Piecewise-constant median, absolute error.
    L1,
}

impl CostKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::L2 => "l2_mean",
            Self::L1 => "l1_median",
        }
    }
}
