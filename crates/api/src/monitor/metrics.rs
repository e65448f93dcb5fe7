//! Metric ingestion: append the sample, evaluate it, open alerts.

use kioskwatch_core::error::CoreError;
use kioskwatch_core::thresholds::{evaluate, AlertThresholds};
use kioskwatch_db::models::alert::{CreateAlert, KioskAlert};
use kioskwatch_db::models::metric::{CreateKioskMetric, KioskMetric};
use kioskwatch_db::repositories::{AlertRepo, MetricRepo};
use sqlx::PgPool;

use crate::error::AppResult;

/// Outcome of ingesting one sample.
#[derive(Debug)]
pub struct MetricIngest {
    pub sample: KioskMetric,
    /// Alerts newly created by this sample. Conditions that already had an
    /// unresolved alert are not repeated here.
    pub alerts_opened: Vec<KioskAlert>,
}

/// Store a sample for `device_id` and raise alerts for any threshold it
/// crosses.
///
/// The kiosk must have registered through a heartbeat first; otherwise
/// nothing is stored and `CoreError::UnknownDevice` is returned.
pub async fn ingest_metrics(
    pool: &PgPool,
    thresholds: &AlertThresholds,
    device_id: &str,
    sample: &CreateKioskMetric,
) -> AppResult<MetricIngest> {
    let stored = MetricRepo::append(pool, device_id, sample)
        .await?
        .ok_or_else(|| CoreError::UnknownDevice(device_id.to_string()))?;

    let candidates = evaluate(&stored.reading(), thresholds);
    let mut alerts_opened = Vec::new();

    if !candidates.is_empty() {
        let mut conn = pool.acquire().await?;
        for candidate in candidates {
            let mut details = candidate.details();
            details["sample_id"] = stored.id.into();

            let opened = AlertRepo::open(
                &mut conn,
                &CreateAlert {
                    kiosk_id: stored.kiosk_id,
                    alert_type: candidate.alert_type,
                    severity: candidate.severity,
                    message: candidate.message,
                    details,
                },
            )
            .await?;

            if opened.created {
                tracing::warn!(
                    device_id,
                    alert_id = opened.alert.id,
                    alert_type = %opened.alert.alert_type,
                    severity = %opened.alert.severity,
                    value = candidate.value,
                    threshold = candidate.threshold,
                    "Alert opened",
                );
                alerts_opened.push(opened.alert);
            } else {
                tracing::debug!(
                    device_id,
                    alert_id = opened.alert.id,
                    alert_type = %opened.alert.alert_type,
                    "Alert already open",
                );
            }
        }
    }

    Ok(MetricIngest {
        sample: stored,
        alerts_opened,
    })
}
