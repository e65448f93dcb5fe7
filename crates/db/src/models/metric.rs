//! Kiosk metric samples (append-only).

use kioskwatch_core::thresholds::MetricReading;
use kioskwatch_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A single resource sample recorded for a kiosk.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct KioskMetric {
    pub id: DbId,
    pub kiosk_id: DbId,
    pub cpu_usage: Option<f64>,
    pub memory_usage: Option<f64>,
    pub disk_usage: Option<f64>,
    pub network_latency_ms: Option<i32>,
    pub active_users: Option<i32>,
    pub temperature_celsius: Option<f64>,
    pub uptime_seconds: Option<i64>,
    pub recorded_at: Timestamp,
}

impl KioskMetric {
    /// The readings the threshold evaluator inspects.
    pub fn reading(&self) -> MetricReading {
        MetricReading {
            cpu_usage: self.cpu_usage,
            memory_usage: self.memory_usage,
            disk_usage: self.disk_usage,
        }
    }
}

/// DTO for appending a metric sample. The capture time is assigned by the
/// database.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateKioskMetric {
    pub cpu_usage: Option<f64>,
    pub memory_usage: Option<f64>,
    pub disk_usage: Option<f64>,
    pub network_latency_ms: Option<i32>,
    pub active_users: Option<i32>,
    pub temperature_celsius: Option<f64>,
    pub uptime_seconds: Option<i64>,
}
