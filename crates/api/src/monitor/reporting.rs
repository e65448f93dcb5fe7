//! Read-only views over the fleet.

use kioskwatch_core::error::CoreError;
use kioskwatch_core::kiosk::RECENT_METRICS_LIMIT;
use kioskwatch_db::models::alert::KioskAlert;
use kioskwatch_db::models::kiosk::{FleetStats, Kiosk};
use kioskwatch_db::models::metric::KioskMetric;
use kioskwatch_db::repositories::{AlertRepo, KioskRepo, MetricRepo};
use serde::Serialize;
use sqlx::PgPool;

use crate::error::AppResult;

/// A kiosk with its recent samples and open alerts.
#[derive(Debug, Serialize)]
pub struct KioskDetail {
    pub kiosk: Kiosk,
    /// Most recent samples, newest first.
    pub metrics: Vec<KioskMetric>,
    /// Unresolved alerts, newest first.
    pub alerts: Vec<KioskAlert>,
}

/// Fleet-wide counters from a single snapshot.
pub async fn fleet_stats(pool: &PgPool) -> AppResult<FleetStats> {
    Ok(KioskRepo::fleet_stats(pool).await?)
}

/// Detail view for one kiosk.
///
/// The three reads are independent, so a sample or alert written between
/// them may or may not appear.
pub async fn kiosk_detail(pool: &PgPool, device_id: &str) -> AppResult<KioskDetail> {
    let kiosk = KioskRepo::find_by_device_id(pool, device_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Kiosk", device_id))?;

    let metrics = MetricRepo::recent_for_kiosk(pool, kiosk.id, RECENT_METRICS_LIMIT).await?;
    let alerts = AlertRepo::list_open_for_kiosk(pool, kiosk.id).await?;

    Ok(KioskDetail {
        kiosk,
        metrics,
        alerts,
    })
}
