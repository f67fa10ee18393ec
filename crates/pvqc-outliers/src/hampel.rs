// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use pvqc_core::{MAD_NORMAL_SCALE, Mask, QcError, median, require_non_negative};

/// Rolling median filter parameters.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct HampelConfig {
    /// Centred window length in samples.
    pub window: usize,
    /// Threshold in units of the scaled MAD.
    pub max_deviation: f64,
    /// MAD scale; `None` uses the normal-consistency factor.
    pub scale: Option<f64>,
}

impl Default for HampelConfig {
    fn default() -> Self {
        Self {
            window: 5,
            max_deviation: 3.0,
            scale: None,
        }
    }
}

impl HampelConfig {
    pub fn validate(&self) -> Result<(), QcError> {
        if self.window < 3 {
            return Err(QcError::configuration(format!(
                "hampel.window must be >= 3; got {}",
                self.window
            )));
        }
        require_non_negative(self.max_deviation, "hampel.max_deviation")?;
        if let Some(scale) = self.scale {
            require_non_negative(scale, "hampel.scale")?;
        }
        Ok(())
    }
}

/// Flags values far from the median of their centred window.
///
/// Windows are truncated at the edges; only finite neighbours count. Input
/// shorter than one full window is rejected.
pub fn hampel(values: &[f64], config: &HampelConfig) -> Result<Mask, QcError> {
    config.validate()?;
    if values.is_empty() {
        return Err(QcError::input("hampel requires non-empty values"));
    }
    if values.len() < config.window {
        return Err(QcError::insufficient_data(format!(
            "hampel requires at least window={} samples; got {}",
            config.window,
            values.len()
        )));
    }
    let half = config.window / 2;
    let scale = config.scale.unwrap_or(MAD_NORMAL_SCALE);

    let mut window = Vec::with_capacity(config.window);
    let mut deviations = Vec::with_capacity(config.window);
    let mut flags = Vec::with_capacity(values.len());
    for (idx, &value) in values.iter().enumerate() {
        if !value.is_finite() {
            flags.push(false);
            continue;
        }
        let lo = idx.saturating_sub(half);
        let hi = (idx + half + 1).min(values.len());
        window.clear();
        window.extend(values[lo..hi].iter().copied().filter(|v| v.is_finite()));

        let center = median(&window);
        deviations.clear();
        deviations.extend(window.iter().map(|v| (v - center).abs()));
        let mad = scale * median(&deviations);

        flags.push((value - center).abs() > config.max_deviation * mad);
    }
    Ok(Mask::new(flags))
}
