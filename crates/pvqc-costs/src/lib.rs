// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod l1;
pub mod l2;
pub mod model;

pub use l1::{CostL1Median, L1MedianCache};
pub use l2::{CostL2Mean, L2Cache};
pub use model::{CostKind, CostModel};
