// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::QcError;

/// Search-space constraints shared by segmentation routines.
///
/// Indices are positions in the sequence handed to the detector; for the
/// segmenter that is the sequence of valid (non-`NaN`) days.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Constraints {
    pub min_segment_len: usize,
    pub max_change_points: Option<usize>,
    pub max_depth: Option<usize>,
    pub candidate_splits: Option<Vec<usize>>,
    pub jump: usize,
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            min_segment_len: 2,
            max_change_points: None,
            max_depth: None,
            candidate_splits: None,
            jump: 1,
        }
    }
}

/// Constraints checked against a concrete sequence length.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidatedConstraints {
    pub n: usize,
    pub min_segment_len: usize,
    pub max_change_points: Option<usize>,
    pub max_depth: Option<usize>,
    pub jump: usize,
    /// Admissible split positions, sorted and unique.
    pub effective_candidates: Vec<usize>,
}

fn split_leaves_room(split: usize, n: usize, min_segment_len: usize) -> bool {
    split >= min_segment_len && n.saturating_sub(split) >= min_segment_len
}

fn check_candidate_order(candidate_splits: &[usize], n: Option<usize>) -> Result<(), QcError> {
    let mut prev: Option<usize> = None;
    for (idx, &split) in candidate_splits.iter().enumerate() {
        if split == 0 {
            return Err(QcError::configuration(format!(
                "constraints.candidate_splits[{idx}] must be > 0; got 0"
            )));
        }
        if let Some(n) = n
            && split >= n
        {
            return Err(QcError::configuration(format!(
                "constraints.candidate_splits[{idx}] must satisfy 0 < split < n; got split={split}, n={n}"
            )));
        }
        if let Some(prev_split) = prev
            && split <= prev_split
        {
            return Err(QcError::configuration(format!(
                "constraints.candidate_splits must be strictly increasing and unique: index {idx} has {split}, previous {prev_split}"
            )));
        }
        prev = Some(split);
    }
    Ok(())
}

impl Constraints {
    /// Validates fields that do not depend on the sequence length.
    pub fn validate(&self) -> Result<(), QcError> {
        if self.min_segment_len == 0 {
            return Err(QcError::configuration(
                "constraints.min_segment_len must be >= 1; got 0",
            ));
        }
        if self.jump == 0 {
            return Err(QcError::configuration(
                "constraints.jump must be >= 1; got 0",
            ));
        }
        if let Some(candidate_splits) = self.candidate_splits.as_deref() {
            check_candidate_order(candidate_splits, None)?;
        }
        Ok(())
    }

    /// Admissible split positions for a sequence of length `n`.
    ///
    /// Sorted ascending and unique for valid constraints.
    pub fn candidates(&self, n: usize) -> Vec<usize> {
        if n == 0 {
            return vec![];
        }

        let jump = self.jump.max(1);
        let min_len = self.min_segment_len;
        match self.candidate_splits.as_deref() {
            Some(explicit) => explicit
                .iter()
                .copied()
                .filter(|&split| split.is_multiple_of(jump))
                .filter(|&split| split_leaves_room(split, n, min_len))
                .collect(),
            None => (jump..n)
                .step_by(jump)
                .filter(|&split| split_leaves_room(split, n, min_len))
                .collect(),
        }
    }

    /// Validates against a concrete length and resolves the candidate set.
    pub fn resolve(&self, n: usize) -> Result<ValidatedConstraints, QcError> {
        if n == 0 {
            return Err(QcError::insufficient_data(
                "constraints resolution requires n >= 1; got n=0",
            ));
        }
        self.validate()?;
        if let Some(candidate_splits) = self.candidate_splits.as_deref() {
            check_candidate_order(candidate_splits, Some(n))?;
        }

        Ok(ValidatedConstraints {
            n,
            min_segment_len: self.min_segment_len,
            max_change_points: self.max_change_points,
            max_depth: self.max_depth,
            jump: self.jump,
            effective_candidates: self.candidates(n),
        })
    }
}
