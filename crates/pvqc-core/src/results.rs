// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::{Diagnostics, QcError};

/// Index-space output of a change point detector.
///
/// `breakpoints` are segment end positions and always finish with `n`;
/// `change_points` are the same positions without the terminal `n`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ChangePointResult {
    pub breakpoints: Vec<usize>,
    pub change_points: Vec<usize>,
    /// Cost reduction achieved by each change point, aligned with `change_points`.
    pub gains: Option<Vec<f64>>,
    pub diagnostics: Diagnostics,
}

/// Checks the breakpoint convention: strictly increasing, in `(0, n]`, ending at `n`.
pub fn validate_breakpoints(n: usize, breakpoints: &[usize]) -> Result<(), QcError> {
    if n == 0 {
        return Err(QcError::insufficient_data(
            "breakpoints require a non-empty sequence; got n=0",
        ));
    }

    let Some(&last) = breakpoints.last() else {
        return Err(QcError::numerical_issue(format!(
            "breakpoints must be non-empty and end with n={n}"
        )));
    };

    let mut prev = 0usize;
    for (idx, &bp) in breakpoints.iter().enumerate() {
        if bp <= prev || bp > n {
            return Err(QcError::numerical_issue(format!(
                "breakpoints[{idx}]={bp} must lie in ({prev}, {n}]"
            )));
        }
        prev = bp;
    }

    if last != n {
        return Err(QcError::numerical_issue(format!(
            "breakpoints must end with n: last={last}, n={n}"
        )));
    }
    Ok(())
}

/// Contiguous `[start, end)` bounds for validated breakpoints.
pub fn segment_bounds(breakpoints: &[usize]) -> Vec<(usize, usize)> {
    let mut bounds = Vec::with_capacity(breakpoints.len());
    let mut start = 0usize;
    for &end in breakpoints {
        bounds.push((start, end));
        start = end;
    }
    bounds
}

impl ChangePointResult {
    pub fn new(
        n: usize,
        breakpoints: Vec<usize>,
        diagnostics: Diagnostics,
    ) -> Result<Self, QcError> {
        validate_breakpoints(n, &breakpoints)?;
        let change_points = breakpoints[..breakpoints.len() - 1].to_vec();
        Ok(Self {
            breakpoints,
            change_points,
            gains: None,
            diagnostics,
        })
    }

    pub fn with_gains(mut self, gains: Vec<f64>) -> Result<Self, QcError> {
        if gains.len() != self.change_points.len() {
            return Err(QcError::numerical_issue(format!(
                "gains length must equal change_points length; got gains={}, change_points={}",
                gains.len(),
                self.change_points.len()
            )));
        }
        self.gains = Some(gains);
        Ok(self)
    }

    /// Length of the analysed sequence.
    pub fn n(&self) -> usize {
        self.breakpoints.last().copied().unwrap_or(0)
    }

    pub fn segment_bounds(&self) -> Vec<(usize, usize)> {
        segment_bounds(&self.breakpoints)
    }
}

#[cfg(test)]
mod tests {
    use super::{ChangePointResult, segment_bounds, validate_breakpoints};
    use crate::Diagnostics;

    #[test]
    fn new_derives_change_points() {
        let result =
            ChangePointResult::new(10, vec![3, 7, 10], Diagnostics::default()).expect("valid");
        assert_eq!(result.change_points, vec![3, 7]);
        assert_eq!(result.n(), 10);
        assert_eq!(result.segment_bounds(), vec![(0, 3), (3, 7), (7, 10)]);
    }

    #[test]
    fn single_segment_has_no_change_points() {
        let result = ChangePointResult::new(5, vec![5], Diagnostics::default()).expect("valid");
        assert!(result.change_points.is_empty());
        assert_eq!(segment_bounds(&result.breakpoints), vec![(0, 5)]);
    }

    #[test]
    fn rejects_malformed_breakpoints() {
        assert!(validate_breakpoints(0, &[]).is_err());
        assert!(validate_breakpoints(5, &[]).is_err());
        assert!(validate_breakpoints(5, &[0, 5]).is_err());
        assert!(validate_breakpoints(5, &[3, 3, 5]).is_err());
        assert!(validate_breakpoints(5, &[3, 6]).is_err());
        let err = validate_breakpoints(5, &[2, 4]).expect_err("missing terminal n");
        assert!(err.to_string().contains("must end with n"));
    }

    #[test]
    fn gains_must_align_with_change_points() {
        let result =
            ChangePointResult::new(8, vec![4, 8], Diagnostics::default()).expect("valid");
        let err = result
            .clone()
            .with_gains(vec![1.0, 2.0])
            .expect_err("misaligned gains");
        assert!(err.to_string().contains("gains length"));
        let with = result.with_gains(vec![12.5]).expect("aligned gains");
        assert_eq!(with.gains, Some(vec![12.5]));
    }
}
