//! Kiosk registry models.

use kioskwatch_core::kiosk::KioskStatus;
use kioskwatch_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `kiosks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Kiosk {
    pub id: DbId,
    pub device_id: String,
    pub location: Option<String>,
    pub ip_address: Option<String>,
    pub version: Option<String>,
    pub metadata: serde_json::Value,
    #[sqlx(try_from = "String")]
    pub status: KioskStatus,
    pub last_heartbeat: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Self-reported attributes carried by a heartbeat.
///
/// The text attributes use `Option<Option<String>>`: `None` keeps the
/// stored value, `Some(None)` clears it. `metadata` is always an object, so
/// it is replaced when present and kept otherwise; send `{}` to empty it.
#[derive(Debug, Clone, Default)]
pub struct HeartbeatUpdate {
    pub location: Option<Option<String>>,
    pub ip_address: Option<Option<String>>,
    pub version: Option<Option<String>>,
    pub metadata: Option<serde_json::Value>,
}

/// Result of a heartbeat upsert.
#[derive(Debug, Clone)]
pub struct HeartbeatUpsert {
    pub kiosk: Kiosk,
    /// Status before this heartbeat; `None` on first contact.
    pub previous_status: Option<KioskStatus>,
}

/// Minimal projection used by the offline sweep.
#[derive(Debug, Clone, FromRow)]
pub struct StaleKiosk {
    pub id: DbId,
    pub device_id: String,
    /// The heartbeat value observed at selection time; the CAS compares
    /// against it.
    pub last_heartbeat: Timestamp,
}

/// Fleet-wide counters, read in a single statement.
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize)]
pub struct FleetStats {
    pub total: i64,
    pub online: i64,
    pub offline: i64,
    pub active_alerts: i64,
    pub critical_alerts: i64,
}
