// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::{ChangePointResult, ExecutionContext, QcError};

/// Batch change point detection over a finite, gap-free sequence.
///
/// Implementations must reject non-finite input rather than skip it; callers
/// compact away missing entries first.
pub trait ChangePointDetector {
    fn detect(
        &self,
        values: &[f64],
        ctx: &ExecutionContext<'_>,
    ) -> Result<ChangePointResult, QcError>;
}
