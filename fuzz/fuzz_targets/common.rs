// SPDX-License-Identifier: MIT OR Apache-2.0

use pvqc_core::{Penalty, Stopping};

const MAX_SAMPLES: usize = 2048;
const VALUE_LIMIT: f64 = 1.0e9;

/// Consumes fuzzer bytes front to back; reads past the end yield zeros.
pub struct FuzzInput<'a> {
    rest: &'a [u8],
}

impl<'a> FuzzInput<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { rest: data }
    }

    pub fn byte(&mut self) -> u8 {
        match self.rest.split_first() {
            Some((&first, rest)) => {
                self.rest = rest;
                first
            }
            None => 0,
        }
    }

    /// Value in `min..=max` picked by the next byte.
    pub fn pick(&mut self, min: usize, max: usize) -> usize {
        let seed = usize::from(self.byte());
        if max <= min { min } else { min + seed % (max - min + 1) }
    }

    /// Exactly `n` samples: decoded little-endian `f64`s while bytes last,
    /// then a sawtooth. `NaN` stays missing, infinities become zero.
    pub fn samples(&mut self, n: usize) -> Vec<f64> {
        let n = n.min(MAX_SAMPLES);
        let mut out = Vec::with_capacity(n);
        while out.len() < n {
            let Some((chunk, rest)) = self.rest.split_first_chunk::<8>() else {
                break;
            };
            self.rest = rest;
            let value = f64::from_le_bytes(*chunk);
            out.push(match value {
                v if v.is_nan() => f64::NAN,
                v if v.is_finite() => v.clamp(-VALUE_LIMIT, VALUE_LIMIT),
                _ => 0.0,
            });
        }
        let decoded = out.len();
        out.extend((decoded..n).map(|idx| ((idx * 37) % 101) as f64 - 50.0));
        out
    }

    pub fn stopping(&mut self) -> Stopping {
        let kind = self.byte();
        let seed = self.byte();
        match kind % 4 {
            0 => Stopping::KnownK(usize::from(seed % 8)),
            1 => Stopping::Penalized(Penalty::BIC),
            2 => Stopping::Penalized(Penalty::AIC),
            _ => Stopping::Penalized(Penalty::Manual(f64::from(seed) / 12.0 - 2.0)),
        }
    }
}
