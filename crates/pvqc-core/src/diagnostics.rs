// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::repro::ReproMode;
use std::borrow::Cow;

/// Metadata captured from one segmentation run.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostics {
    pub n: usize,
    pub engine_version: Option<String>,
    pub runtime_ms: Option<u64>,
    pub notes: Vec<String>,
    pub warnings: Vec<String>,
    pub algorithm: Cow<'static, str>,
    pub cost_model: Cow<'static, str>,
    pub repro_mode: ReproMode,
    pub missing_fraction: Option<f64>,
    pub effective_sample_count: Option<usize>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self {
            n: 0,
            engine_version: Some(env!("CARGO_PKG_VERSION").to_string()),
            runtime_ms: None,
            notes: vec![],
            warnings: vec![],
            algorithm: Cow::Borrowed(""),
            cost_model: Cow::Borrowed(""),
            repro_mode: ReproMode::Balanced,
            missing_fraction: None,
            effective_sample_count: None,
        }
    }
}

impl Diagnostics {
    pub fn push_note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    /// Records a warning and forwards it to the `log` facade.
    pub fn push_warning(&mut self, warning: impl Into<String>) {
        let warning = warning.into();
        log::warn!("{}: {warning}", self.algorithm);
        self.warnings.push(warning);
    }
}
