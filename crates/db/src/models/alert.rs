//! Kiosk alert models.

use kioskwatch_core::alert::{AlertType, Severity};
use kioskwatch_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `kiosk_alerts` table.
///
/// `alert_type` is read as stored text so rows of types this service does
/// not raise still load; use [`KioskAlert::known_type`] to match on it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct KioskAlert {
    pub id: DbId,
    pub kiosk_id: DbId,
    pub alert_type: String,
    #[sqlx(try_from = "String")]
    pub severity: Severity,
    pub message: String,
    pub details: serde_json::Value,
    pub resolved: bool,
    pub resolved_at: Option<Timestamp>,
    pub resolved_by: Option<String>,
    pub created_at: Timestamp,
}

impl KioskAlert {
    /// The alert type, if it is one this service raises.
    pub fn known_type(&self) -> Option<AlertType> {
        self.alert_type.parse().ok()
    }
}

/// An alert joined with the identity of its kiosk, for list views.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AlertWithKiosk {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub alert: KioskAlert,
    pub device_id: String,
    pub location: Option<String>,
}

/// DTO for opening an alert.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAlert {
    pub kiosk_id: DbId,
    pub alert_type: AlertType,
    pub severity: Severity,
    pub message: String,
    pub details: serde_json::Value,
}

/// Outcome of an idempotent open.
#[derive(Debug, Clone)]
pub struct OpenedAlert {
    pub alert: KioskAlert,
    /// `false` when an unresolved alert of the same type already existed and
    /// was returned instead.
    pub created: bool,
}

/// Filters for the alert list.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlertFilter {
    pub resolved: Option<bool>,
    pub severity: Option<Severity>,
}
