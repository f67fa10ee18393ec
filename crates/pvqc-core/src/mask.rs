// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::QcError;
use std::ops::Not;

/// Half-open index range `[start, end)` of consecutive flagged samples.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Run {
    pub start: usize,
    pub end: usize,
}

impl Run {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn contains(&self, idx: usize) -> bool {
        (self.start..self.end).contains(&idx)
    }
}

/// Boolean flags aligned one-to-one with the samples of a series.
///
/// `true` marks a flagged sample.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Mask {
    flags: Vec<bool>,
}

impl Mask {
    pub fn new(flags: Vec<bool>) -> Self {
        Self { flags }
    }

    pub fn all_false(len: usize) -> Self {
        Self {
            flags: vec![false; len],
        }
    }

    pub fn all_true(len: usize) -> Self {
        Self {
            flags: vec![true; len],
        }
    }

    /// Builds a mask of `len` samples with every index of `runs` flagged.
    pub fn from_runs(len: usize, runs: &[Run]) -> Result<Self, QcError> {
        let mut flags = vec![false; len];
        for run in runs {
            if run.start > run.end || run.end > len {
                return Err(QcError::input(format!(
                    "run [{}, {}) is out of bounds for mask length {len}",
                    run.start, run.end
                )));
            }
            flags[run.start..run.end].fill(true);
        }
        Ok(Self { flags })
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<bool> {
        self.flags.get(idx).copied()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.flags
    }

    pub fn into_vec(self) -> Vec<bool> {
        self.flags
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.flags.iter().copied()
    }

    pub fn count(&self) -> usize {
        self.flags.iter().filter(|&&flag| flag).count()
    }

    pub fn any(&self) -> bool {
        self.flags.iter().any(|&flag| flag)
    }

    pub fn all(&self) -> bool {
        self.flags.iter().all(|&flag| flag)
    }

    /// Indices of flagged samples in ascending order.
    pub fn flagged_indices(&self) -> Vec<usize> {
        self.flags
            .iter()
            .enumerate()
            .filter_map(|(idx, &flag)| flag.then_some(idx))
            .collect()
    }

    /// Maximal runs of flagged samples, ordered by start.
    pub fn runs(&self) -> Vec<Run> {
        let mut runs = Vec::new();
        let mut open: Option<usize> = None;
        for (idx, &flag) in self.flags.iter().enumerate() {
            match (flag, open) {
                (true, None) => open = Some(idx),
                (false, Some(start)) => {
                    runs.push(Run { start, end: idx });
                    open = None;
                }
                _ => {}
            }
        }
        if let Some(start) = open {
            runs.push(Run {
                start,
                end: self.flags.len(),
            });
        }
        runs
    }

    /// Fails unless the mask has exactly `len` entries.
    pub fn check_aligned(&self, len: usize, label: &str) -> Result<(), QcError> {
        if self.flags.len() != len {
            return Err(QcError::input(format!(
                "{label} must align with the series; got mask length {}, series length {len}",
                self.flags.len()
            )));
        }
        Ok(())
    }

    pub fn or(&self, other: &Mask) -> Result<Mask, QcError> {
        other.check_aligned(self.len(), "mask")?;
        Ok(Mask::new(
            self.iter().zip(other.iter()).map(|(a, b)| a || b).collect(),
        ))
    }

    pub fn and(&self, other: &Mask) -> Result<Mask, QcError> {
        other.check_aligned(self.len(), "mask")?;
        Ok(Mask::new(
            self.iter().zip(other.iter()).map(|(a, b)| a && b).collect(),
        ))
    }
}

impl Not for Mask {
    type Output = Mask;

    fn not(self) -> Mask {
        Mask::new(self.flags.into_iter().map(|flag| !flag).collect())
    }
}

impl Not for &Mask {
    type Output = Mask;

    fn not(self) -> Mask {
        Mask::new(self.iter().map(|flag| !flag).collect())
    }
}

impl From<Vec<bool>> for Mask {
    fn from(flags: Vec<bool>) -> Self {
        Self::new(flags)
    }
}

impl FromIterator<bool> for Mask {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
