// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

/// Structured error type for pvqc APIs.
///
/// Every expected failure surfaces as a `QcError` immediately; no operation
/// returns partial results alongside an error.
#[derive(thiserror::Error, Debug)]
pub enum QcError {
    /// Malformed series: empty, misaligned, unordered or non-finite.
    #[error("invalid input: {0}")]
    Input(String),
    /// Structurally valid input with too few usable samples.
    #[error("insufficient data: {0}")]
    InsufficientData(String),
    /// A parameter outside its documented domain.
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("numerical issue: {0}")]
    NumericalIssue(String),
}

impl QcError {
    /// Creates a `QcError::Input`.
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    /// Creates a `QcError::InsufficientData`.
    pub fn insufficient_data(msg: impl Into<String>) -> Self {
        Self::InsufficientData(msg.into())
    }

    /// Creates a `QcError::Configuration`.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates a `QcError::NumericalIssue`.
    pub fn numerical_issue(msg: impl Into<String>) -> Self {
        Self::NumericalIssue(msg.into())
    }

    /// Short machine-friendly name of the error class.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Input(_) => "InputError",
            Self::InsufficientData(_) => "InsufficientDataError",
            Self::Configuration(_) => "ConfigurationError",
            Self::NumericalIssue(_) => "NumericalIssue",
        }
    }
}
