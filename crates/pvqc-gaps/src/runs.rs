// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use pvqc_core::{Mask, QcError, Run};

/// Which samples of a detected run are flagged.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MarkPolicy {
    /// Every sample of the run, including the first.
    #[default]
    All,
    /// All samples except the first.
    Tail,
    /// Only the last sample.
    End,
}

/// Flagged samples plus the full extent of every detected run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunDetection {
    pub mask: Mask,
    /// Detected runs as sample ranges, independent of the mark policy.
    ///
    /// Consecutive interpolation runs may share their boundary sample.
    pub runs: Vec<Run>,
}

impl RunDetection {
    pub fn flagged_count(&self) -> usize {
        self.mask.count()
    }
}

/// Rejects input too short to hold a single run of `min_run_length` samples.
pub(crate) fn require_run_input(
    values: &[f64],
    min_run_length: usize,
    label: &str,
) -> Result<(), QcError> {
    if values.is_empty() {
        return Err(QcError::input(format!("{label} requires non-empty values")));
    }
    if values.len() < min_run_length {
        return Err(QcError::insufficient_data(format!(
            "{label} requires at least min_run_length={min_run_length} samples; got {}",
            values.len()
        )));
    }
    Ok(())
}

/// Turns per-sample links into runs and a mask.
///
/// `links[i]` states that sample `i` extends a pattern over the `span`
/// samples before it. A maximal block of links `a..=b` therefore covers
/// samples `[a - span, b + 1)`.
pub(crate) fn mark_linked_runs(
    links: &[bool],
    span: usize,
    min_run_length: usize,
    mark: MarkPolicy,
) -> RunDetection {
    let n = links.len();
    let mut flags = vec![false; n];
    let mut runs = Vec::new();

    let mut idx = 0usize;
    while idx < n {
        if !links[idx] {
            idx += 1;
            continue;
        }
        let first_link = idx;
        while idx < n && links[idx] {
            idx += 1;
        }
        let run = Run {
            start: first_link.saturating_sub(span),
            end: idx,
        };
        if run.len() >= min_run_length {
            let flagged = match mark {
                MarkPolicy::All => run.start..run.end,
                MarkPolicy::Tail => run.start + 1..run.end,
                MarkPolicy::End => run.end - 1..run.end,
            };
            flags[flagged].fill(true);
            runs.push(run);
        }
    }

    RunDetection {
        mask: Mask::new(flags),
        runs,
    }
}

#[cfg(test)]
mod tests {
    use super::{MarkPolicy, mark_linked_runs};
    use pvqc_core::Run;

    #[test]
    fn single_span_runs_include_their_anchor_sample() {
        // samples 1..4 repeat sample 1
        let links = [false, false, true, true, false, false];
        let detection = mark_linked_runs(&links, 1, 3, MarkPolicy::All);
        assert_eq!(detection.runs, vec![Run { start: 1, end: 4 }]);
        assert_eq!(
            detection.mask.as_slice(),
            &[false, true, true, true, false, false]
        );
    }

    #[test]
    fn short_runs_are_ignored() {
        let links = [false, true, false, true, true];
        let detection = mark_linked_runs(&links, 1, 3, MarkPolicy::All);
        assert_eq!(detection.runs, vec![Run { start: 2, end: 5 }]);
        assert_eq!(detection.flagged_count(), 3);
    }

    #[test]
    fn mark_policies_select_part_of_the_run() {
        let links = [false, true, true, true];
        let tail = mark_linked_runs(&links, 1, 2, MarkPolicy::Tail);
        assert_eq!(tail.mask.as_slice(), &[false, true, true, true]);
        let end = mark_linked_runs(&links, 1, 2, MarkPolicy::End);
        assert_eq!(end.mask.as_slice(), &[false, false, false, true]);
        assert_eq!(end.runs, tail.runs);
    }

    #[test]
    fn double_span_runs_cover_two_anchor_samples() {
        let links = [false, false, true, true, false];
        let detection = mark_linked_runs(&links, 2, 3, MarkPolicy::All);
        assert_eq!(detection.runs, vec![Run { start: 0, end: 4 }]);
    }
}
