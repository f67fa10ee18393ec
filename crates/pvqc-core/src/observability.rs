// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

/// Optional callback for reporting algorithm progress in `[0.0, 1.0]`.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, fraction: f32);
}

/// Optional sink for low-overhead scalar telemetry.
pub trait TelemetrySink: Send + Sync {
    fn record_scalar(&self, key: &'static str, value: f64);
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoopProgressSink;

impl ProgressSink for NoopProgressSink {
    fn on_progress(&self, _fraction: f32) {}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoopTelemetrySink;

impl TelemetrySink for NoopTelemetrySink {
    fn record_scalar(&self, _key: &'static str, _value: f64) {}
}

/// Forwards telemetry scalars to the `log` facade under the `pvqc::telemetry` target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogTelemetrySink {
    pub level: log::Level,
}

impl Default for LogTelemetrySink {
    fn default() -> Self {
        Self {
            level: log::Level::Debug,
        }
    }
}

impl TelemetrySink for LogTelemetrySink {
    fn record_scalar(&self, key: &'static str, value: f64) {
        log::log!(target: "pvqc::telemetry", self.level, "{key}={value}");
    }
}
