// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::QcError;

/// Penalty added per accepted change point.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub enum Penalty {
    BIC,
    AIC,
    Manual(f64),
}

/// How many change points a segmentation run accepts.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub enum Stopping {
    /// Exactly `k` change points.
    KnownK(usize),
    /// Accept splits while their cost reduction exceeds the penalty.
    Penalized(Penalty),
}

impl Default for Stopping {
    fn default() -> Self {
        Self::Penalized(Penalty::BIC)
    }
}

impl Penalty {
    pub fn validate(&self) -> Result<(), QcError> {
        match self {
            Penalty::BIC | Penalty::AIC => Ok(()),
            Penalty::Manual(p) => {
                if !p.is_finite() || *p <= 0.0 {
                    return Err(QcError::configuration(format!(
                        "Penalty::Manual requires a finite value > 0.0; got {p}"
                    )));
                }
                Ok(())
            }
        }
    }

    /// Penalty value for a sequence of `n` points.
    ///
    /// - BIC = params_per_segment * ln(n)
    /// - AIC = 2 * params_per_segment
    /// - Manual(p) = p
    pub fn value(&self, n: usize, params_per_segment: usize) -> Result<f64, QcError> {
        self.validate()?;
        if n == 0 {
            return Err(QcError::insufficient_data(
                "penalty value requires n >= 1; got n=0",
            ));
        }
        if params_per_segment == 0 {
            return Err(QcError::configuration(
                "penalty value requires params_per_segment >= 1; got 0",
            ));
        }

        let params = params_per_segment as f64;
        Ok(match self {
            Penalty::BIC => params * (n as f64).ln(),
            Penalty::AIC => 2.0 * params,
            Penalty::Manual(p) => *p,
        })
    }
}

impl Stopping {
    pub fn validate(&self) -> Result<(), QcError> {
        match self {
            Stopping::KnownK(0) => Err(QcError::configuration(
                "Stopping::KnownK requires k >= 1; got 0",
            )),
            Stopping::KnownK(_) => Ok(()),
            Stopping::Penalized(penalty) => penalty.validate(),
        }
    }
}
