// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use pvqc_core::{
    ChangePointDetector, ChangePointResult, Diagnostics, ExecutionContext, Penalty, QcError,
    Stopping, ValidatedConstraints,
};
use pvqc_costs::CostModel;
use std::borrow::Cow;
use std::time::Instant;

const DEFAULT_PARAMS_PER_SEGMENT: usize = 2;

/// Configuration for [`BinSeg`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct BinSegConfig {
    pub stopping: Stopping,
    pub params_per_segment: usize,
}

impl Default for BinSegConfig {
    fn default() -> Self {
        Self {
            stopping: Stopping::Penalized(Penalty::BIC),
            params_per_segment: DEFAULT_PARAMS_PER_SEGMENT,
        }
    }
}

impl BinSegConfig {
    fn validate(&self) -> Result<(), QcError> {
        self.stopping.validate()?;
        if self.params_per_segment == 0 {
            return Err(QcError::configuration(
                "BinSegConfig.params_per_segment must be >= 1; got 0",
            ));
        }
        Ok(())
    }
}

/// Greedy binary segmentation over a univariate sequence.
///
/// Each round splits the segment whose best split reduces cost the most.
/// Ties prefer the leftmost split.
#[derive(Debug)]
pub struct BinSeg<C: CostModel> {
    cost_model: C,
    config: BinSegConfig,
}

impl<C: CostModel> BinSeg<C> {
    pub fn new(cost_model: C, config: BinSegConfig) -> Result<Self, QcError> {
        config.validate()?;
        Ok(Self { cost_model, config })
    }

    pub fn cost_model(&self) -> &C {
        &self.cost_model
    }

    pub fn config(&self) -> &BinSegConfig {
        &self.config
    }
}

#[derive(Default, Clone, Copy, Debug)]
struct SearchStats {
    cost_evals: usize,
    candidates_considered: usize,
}

#[derive(Clone, Copy, Debug)]
struct Segment {
    start: usize,
    end: usize,
    depth: usize,
}

impl Segment {
    fn children(self, split: usize) -> (Segment, Segment) {
        let depth = self.depth + 1;
        (
            Segment {
                start: self.start,
                end: split,
                depth,
            },
            Segment {
                start: split,
                end: self.end,
                depth,
            },
        )
    }
}

#[derive(Clone, Copy, Debug)]
struct SegmentCandidate {
    segment: Segment,
    split: usize,
    gain: f64,
}

/// Shared state of one search.
struct Search<'a, C: CostModel> {
    model: &'a C,
    cache: &'a C::Cache,
    validated: &'a ValidatedConstraints,
    stats: SearchStats,
}

impl<C: CostModel> Search<'_, C> {
    fn cost(&mut self, start: usize, end: usize) -> Result<f64, QcError> {
        self.stats.cost_evals += 1;
        let cost = self.model.segment_cost(self.cache, start, end);
        if !cost.is_finite() {
            return Err(QcError::numerical_issue(format!(
                "non-finite segment cost at [{start}, {end}): {cost}"
            )));
        }
        Ok(cost)
    }

    fn best_split(&mut self, segment: Segment) -> Result<Option<SegmentCandidate>, QcError> {
        if !segment_can_split(segment, self.validated) {
            return Ok(None);
        }

        let validated = self.validated;
        let lower = segment.start + validated.min_segment_len;
        let upper = segment.end.saturating_sub(validated.min_segment_len);
        let candidates = &validated.effective_candidates;
        let Some((start_idx, end_idx)) = candidate_window(candidates, lower, upper) else {
            return Ok(None);
        };

        let full_cost = self.cost(segment.start, segment.end)?;
        let mut best: Option<(usize, f64)> = None;
        for &split in &candidates[start_idx..end_idx] {
            self.stats.candidates_considered += 1;

            let left_cost = self.cost(segment.start, split)?;
            let right_cost = self.cost(split, segment.end)?;
            let gain = full_cost - left_cost - right_cost;
            if !gain.is_finite() {
                return Err(QcError::numerical_issue(format!(
                    "non-finite gain at segment=[{}, {}), split={split}: full_cost={full_cost}, left_cost={left_cost}, right_cost={right_cost}",
                    segment.start, segment.end
                )));
            }

            // candidates ascend, so strict comparison keeps the leftmost tie
            if best.is_none_or(|(_, best_gain)| gain > best_gain) {
                best = Some((split, gain));
            }
        }

        Ok(best.map(|(split, gain)| SegmentCandidate {
            segment,
            split,
            gain,
        }))
    }

    fn push_segment(
        &mut self,
        frontier: &mut Vec<SegmentCandidate>,
        segment: Segment,
    ) -> Result<(), QcError> {
        if let Some(candidate) = self.best_split(segment)? {
            frontier.push(candidate);
        }
        Ok(())
    }
}

fn candidate_window(candidates: &[usize], lower: usize, upper: usize) -> Option<(usize, usize)> {
    if lower > upper {
        return None;
    }

    let start_idx = candidates.partition_point(|&split| split < lower);
    let end_idx = candidates.partition_point(|&split| split <= upper);
    (start_idx < end_idx).then_some((start_idx, end_idx))
}

fn segment_can_split(segment: Segment, validated: &ValidatedConstraints) -> bool {
    if segment.end <= segment.start {
        return false;
    }

    if let Some(max_depth) = validated.max_depth
        && segment.depth >= max_depth
    {
        return false;
    }

    segment.end - segment.start >= validated.min_segment_len.saturating_mul(2)
}

fn pick_best_frontier_index(frontier: &[SegmentCandidate]) -> Option<usize> {
    let mut best_idx: Option<usize> = None;

    for (idx, candidate) in frontier.iter().enumerate() {
        let Some(current_idx) = best_idx else {
            best_idx = Some(idx);
            continue;
        };
        let current = frontier[current_idx];
        let better_gain = candidate.gain > current.gain;
        let tie_on_gain = candidate.gain == current.gain;
        let better_split = candidate.split < current.split;
        let tie_on_split = candidate.split == current.split;
        let better_start = candidate.segment.start < current.segment.start;
        if better_gain || (tie_on_gain && (better_split || (tie_on_split && better_start))) {
            best_idx = Some(idx);
        }
    }

    best_idx
}

fn insert_sorted_unique(
    accepted: &mut Vec<(usize, f64)>,
    split: usize,
    gain: f64,
) -> Result<(), QcError> {
    match accepted.binary_search_by_key(&split, |&(position, _)| position) {
        Ok(_) => Err(QcError::numerical_issue(format!(
            "duplicate split selected at {split}; segmentation state is inconsistent"
        ))),
        Err(idx) => {
            accepted.insert(idx, (split, gain));
            Ok(())
        }
    }
}

fn resolve_penalty<C: CostModel>(
    model: &C,
    penalty: &Penalty,
    n: usize,
    configured_params_per_segment: usize,
) -> Result<(f64, usize), QcError> {
    let params_per_segment = match penalty {
        Penalty::BIC | Penalty::AIC
            if configured_params_per_segment == DEFAULT_PARAMS_PER_SEGMENT =>
        {
            model.penalty_params_per_segment()
        }
        _ => configured_params_per_segment,
    };
    let beta = penalty.value(n, params_per_segment)?;
    if !beta.is_finite() || beta <= 0.0 {
        return Err(QcError::configuration(format!(
            "resolved penalty must be finite and > 0.0; got beta={beta}"
        )));
    }
    Ok((beta, params_per_segment))
}

impl<C: CostModel> ChangePointDetector for BinSeg<C> {
    fn detect(
        &self,
        values: &[f64],
        ctx: &ExecutionContext<'_>,
    ) -> Result<ChangePointResult, QcError> {
        self.config.validate()?;
        let n = values.len();
        let validated = ctx.constraints.resolve(n)?;
        self.cost_model.validate(values)?;
        let cache = self.cost_model.precompute(values)?;

        let started_at = Instant::now();
        let mut notes = vec![];
        let warnings =
            vec!["binary segmentation may mask closely spaced weaker changes".to_string()];

        let mut search = Search {
            model: &self.cost_model,
            cache: &cache,
            validated: &validated,
            stats: SearchStats::default(),
        };
        let mut frontier = Vec::new();
        search.push_segment(
            &mut frontier,
            Segment {
                start: 0,
                end: n,
                depth: 0,
            },
        )?;

        let mut accepted: Vec<(usize, f64)> = vec![];

        match &self.config.stopping {
            Stopping::KnownK(k) => {
                if let Some(max_change_points) = validated.max_change_points
                    && max_change_points < *k
                {
                    return Err(QcError::configuration(format!(
                        "KnownK={k} exceeds constraints.max_change_points={max_change_points}"
                    )));
                }

                while accepted.len() < *k {
                    let Some(best_idx) = pick_best_frontier_index(&frontier) else {
                        return Err(QcError::insufficient_data(format!(
                            "KnownK exact solution unreachable: requested k={k}, accepted={} before frontier exhaustion",
                            accepted.len()
                        )));
                    };

                    let best = frontier.swap_remove(best_idx);
                    insert_sorted_unique(&mut accepted, best.split, best.gain)?;
                    let (left, right) = best.segment.children(best.split);
                    search.push_segment(&mut frontier, left)?;
                    search.push_segment(&mut frontier, right)?;

                    ctx.report_progress(accepted.len() as f32 / *k as f32);
                }

                notes.push(format!("stopping=KnownK({k})"));
            }
            Stopping::Penalized(penalty) => {
                let (beta, params_per_segment) = resolve_penalty(
                    &self.cost_model,
                    penalty,
                    n,
                    self.config.params_per_segment,
                )?;
                notes.push(format!(
                    "stopping=Penalized({penalty:?}), beta={beta}, params_per_segment={params_per_segment}"
                ));

                loop {
                    if let Some(max_change_points) = validated.max_change_points
                        && accepted.len() >= max_change_points
                    {
                        break;
                    }

                    let Some(best_idx) = pick_best_frontier_index(&frontier) else {
                        break;
                    };
                    if frontier[best_idx].gain <= beta {
                        break;
                    }

                    let best = frontier.swap_remove(best_idx);
                    insert_sorted_unique(&mut accepted, best.split, best.gain)?;
                    let (left, right) = best.segment.children(best.split);
                    search.push_segment(&mut frontier, left)?;
                    search.push_segment(&mut frontier, right)?;

                    let denom = (accepted.len() + frontier.len() + 1) as f32;
                    ctx.report_progress(accepted.len() as f32 / denom);
                }
            }
        }

        let stats = search.stats;
        let runtime_ms = u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX);
        ctx.record_scalar("binseg.cost_evals", stats.cost_evals as f64);
        ctx.record_scalar(
            "binseg.candidates_considered",
            stats.candidates_considered as f64,
        );
        ctx.record_scalar("binseg.runtime_ms", runtime_ms as f64);
        ctx.report_progress(1.0);

        notes.push(format!(
            "final_change_count={}, cost_evals={}, candidates_considered={}",
            accepted.len(),
            stats.cost_evals,
            stats.candidates_considered
        ));
        log::debug!(
            "binseg: n={n} changes={} cost_evals={}",
            accepted.len(),
            stats.cost_evals
        );

        let diagnostics = Diagnostics {
            n,
            runtime_ms: Some(runtime_ms),
            notes,
            warnings,
            algorithm: Cow::Borrowed("binseg"),
            cost_model: Cow::Borrowed(self.cost_model.name()),
            repro_mode: ctx.repro_mode,
            ..Diagnostics::default()
        };

        let (mut breakpoints, gains): (Vec<usize>, Vec<f64>) = accepted.into_iter().unzip();
        breakpoints.push(n);
        ChangePointResult::new(n, breakpoints, diagnostics)?.with_gains(gains)
    }
}
