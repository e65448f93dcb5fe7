//! Threshold evaluation for kiosk resource metrics.
//!
//! Pure logic: no database access and no state. The caller fetches nothing;
//! it passes the reading it just stored and the configured thresholds, and
//! opens an alert for every candidate returned.
//!
//! No debounce or cooldown: every sample above a threshold yields a
//! candidate. Duplicate suppression belongs to the alert store (one
//! unresolved alert per kiosk and type).

use serde::Serialize;

use crate::alert::{AlertType, Severity};
use crate::error::CoreError;

/// Default CPU utilization threshold, percent.
pub const DEFAULT_CPU_THRESHOLD: f64 = 80.0;
/// Default memory utilization threshold, percent.
pub const DEFAULT_MEMORY_THRESHOLD: f64 = 85.0;
/// Default disk utilization threshold, percent.
pub const DEFAULT_DISK_THRESHOLD: f64 = 90.0;

/// Canonical metric names carried in alert detail payloads.
pub const METRIC_CPU_USAGE: &str = "cpu_usage";
pub const METRIC_MEMORY_USAGE: &str = "memory_usage";
pub const METRIC_DISK_USAGE: &str = "disk_usage";

/// Per-deployment alert thresholds, all in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AlertThresholds {
    pub cpu: f64,
    pub memory: f64,
    pub disk: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            cpu: DEFAULT_CPU_THRESHOLD,
            memory: DEFAULT_MEMORY_THRESHOLD,
            disk: DEFAULT_DISK_THRESHOLD,
        }
    }
}

impl AlertThresholds {
    /// Every threshold must be a percentage in `(0, 100]`.
    pub fn validate(&self) -> Result<(), CoreError> {
        for (name, value) in [
            (METRIC_CPU_USAGE, self.cpu),
            (METRIC_MEMORY_USAGE, self.memory),
            (METRIC_DISK_USAGE, self.disk),
        ] {
            if !(value > 0.0 && value <= 100.0) {
                return Err(CoreError::Validation(format!(
                    "{name} threshold must be in (0, 100], got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// The resource readings the evaluator looks at. Absent readings never alert.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricReading {
    pub cpu_usage: Option<f64>,
    pub memory_usage: Option<f64>,
    pub disk_usage: Option<f64>,
}

/// A condition that should be raised as an alert.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertCandidate {
    pub alert_type: AlertType,
    pub severity: Severity,
    pub message: String,
    /// Canonical metric name (see the `METRIC_*` constants).
    pub metric_name: &'static str,
    /// The observed value that crossed the threshold.
    pub value: f64,
    /// The threshold that was crossed.
    pub threshold: f64,
}

impl AlertCandidate {
    /// Structured detail payload stored alongside the alert.
    pub fn details(&self) -> serde_json::Value {
        serde_json::json!({
            "metric": self.metric_name,
            "value": self.value,
            "threshold": self.threshold,
        })
    }
}

/// Evaluate a reading against thresholds.
///
/// Rules are independent; a single reading can produce zero to three
/// candidates. Comparison is strictly greater-than: a reading exactly at the
/// threshold does not alert.
pub fn evaluate(reading: &MetricReading, thresholds: &AlertThresholds) -> Vec<AlertCandidate> {
    let rules = [
        (
            reading.cpu_usage,
            thresholds.cpu,
            AlertType::HighCpu,
            Severity::High,
            METRIC_CPU_USAGE,
            "CPU",
        ),
        (
            reading.memory_usage,
            thresholds.memory,
            AlertType::HighMemory,
            Severity::High,
            METRIC_MEMORY_USAGE,
            "Memory",
        ),
        (
            reading.disk_usage,
            thresholds.disk,
            AlertType::HighDisk,
            Severity::Critical,
            METRIC_DISK_USAGE,
            "Disk",
        ),
    ];

    rules
        .into_iter()
        .filter_map(|(value, threshold, alert_type, severity, metric_name, label)| {
            let value = value?;
            (value > threshold).then(|| AlertCandidate {
                alert_type,
                severity,
                message: format!("{label} usage is {value}% (threshold: {threshold}%)"),
                metric_name,
                value,
                threshold,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
