//! Handlers for the kiosk monitoring endpoints.
//!
//! Includes:
//! - Kiosk-facing ingestion (heartbeat, metrics), authenticated by
//!   [`KioskIdentity`].
//! - Admin read and alert-resolution endpoints, guarded by [`RequireAdmin`].

use axum::extract::{Path, Query, State};
use axum::Json;
use kioskwatch_core::alert::{Severity, ALERT_LIST_LIMIT};
use kioskwatch_core::error::CoreError;
use kioskwatch_core::kiosk::KioskStatus;
use kioskwatch_core::types::{DbId, Timestamp};
use kioskwatch_db::models::alert::{AlertFilter, AlertWithKiosk, KioskAlert};
use kioskwatch_db::models::kiosk::{FleetStats, HeartbeatUpdate, Kiosk};
use kioskwatch_db::models::metric::CreateKioskMetric;
use kioskwatch_db::repositories::{AlertRepo, KioskRepo};
use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationError};

use crate::error::{AppError, AppResult};
use crate::middleware::kiosk::KioskIdentity;
use crate::middleware::rbac::RequireAdmin;
use crate::monitor::heartbeat::process_heartbeat;
use crate::monitor::metrics::ingest_metrics;
use crate::monitor::reporting::{self, KioskDetail};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /heartbeat`. Every field is optional.
///
/// An omitted text field keeps the stored value; an explicit `null`
/// clears it.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct HeartbeatRequest {
    #[serde(default, deserialize_with = "present")]
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[validate(length(max = 45, message = "must be at most 45 characters"))]
    pub ip_address: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[validate(length(max = 50, message = "must be at most 50 characters"))]
    pub version: Option<Option<String>>,
    #[validate(custom(function = "validate_metadata"))]
    pub metadata: Option<serde_json::Value>,
}

impl From<HeartbeatRequest> for HeartbeatUpdate {
    fn from(req: HeartbeatRequest) -> Self {
        Self {
            location: req.location,
            ip_address: req.ip_address,
            version: req.version,
            metadata: req.metadata,
        }
    }
}

/// Mark a key as present, so `null` becomes `Some(None)` rather than `None`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Request body for `POST /metrics`. Every field is optional.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct MetricsRequest {
    #[validate(range(min = 0.0, max = 100.0, message = "must be between 0 and 100"))]
    pub cpu_usage: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0, message = "must be between 0 and 100"))]
    pub memory_usage: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0, message = "must be between 0 and 100"))]
    pub disk_usage: Option<f64>,
    /// Round-trip latency in milliseconds.
    #[validate(range(min = 0, message = "must not be negative"))]
    pub network_latency: Option<i32>,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub active_users: Option<i32>,
    /// Degrees Celsius.
    #[validate(range(min = -50.0, max = 150.0, message = "must be between -50 and 150"))]
    pub temperature: Option<f64>,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub uptime_seconds: Option<i64>,
}

impl From<MetricsRequest> for CreateKioskMetric {
    fn from(req: MetricsRequest) -> Self {
        Self {
            cpu_usage: req.cpu_usage,
            memory_usage: req.memory_usage,
            disk_usage: req.disk_usage,
            network_latency_ms: req.network_latency,
            active_users: req.active_users,
            temperature_celsius: req.temperature,
            uptime_seconds: req.uptime_seconds,
        }
    }
}

/// Acknowledgement returned for an accepted metric sample.
#[derive(Debug, Serialize)]
pub struct MetricAck {
    pub sample_id: DbId,
    pub recorded_at: Timestamp,
    /// Number of alerts newly opened by this sample.
    pub alerts_opened: usize,
}

/// Query parameters for `GET /kiosks`.
#[derive(Debug, Deserialize)]
pub struct KioskListQuery {
    pub status: Option<String>,
}

/// Query parameters for `GET /alerts`.
#[derive(Debug, Deserialize)]
pub struct AlertListQuery {
    pub resolved: Option<String>,
    pub severity: Option<String>,
}

impl AlertListQuery {
    fn into_filter(self) -> Result<AlertFilter, CoreError> {
        let resolved = match non_empty(self.resolved).as_deref() {
            None => None,
            Some("true") => Some(true),
            Some("false") => Some(false),
            Some(other) => {
                return Err(CoreError::Validation(format!(
                    "resolved must be 'true' or 'false', got '{other}'"
                )))
            }
        };
        let severity = non_empty(self.severity)
            .map(|s| s.parse::<Severity>())
            .transpose()?;
        Ok(AlertFilter { resolved, severity })
    }
}

/// Treat `?param=` the same as an absent parameter.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn validate_metadata(value: &serde_json::Value) -> Result<(), ValidationError> {
    if value.is_object() {
        Ok(())
    } else {
        Err(ValidationError::new("metadata_object").with_message("must be a JSON object".into()))
    }
}

// ---------------------------------------------------------------------------
// Kiosk-facing handlers
// ---------------------------------------------------------------------------

/// POST /heartbeat
///
/// Register or refresh the calling kiosk and mark it ONLINE.
pub async fn heartbeat(
    State(state): State<AppState>,
    kiosk: KioskIdentity,
    Json(input): Json<HeartbeatRequest>,
) -> AppResult<Json<DataResponse<Kiosk>>> {
    input.validate()?;
    let updated = process_heartbeat(
        &state.pool,
        &state.config.monitor,
        &kiosk.device_id,
        &input.into(),
    )
    .await?;
    Ok(Json(DataResponse { data: updated }))
}

/// POST /metrics
///
/// Record a resource sample and open alerts for crossed thresholds.
pub async fn record_metrics(
    State(state): State<AppState>,
    kiosk: KioskIdentity,
    Json(input): Json<MetricsRequest>,
) -> AppResult<Json<DataResponse<MetricAck>>> {
    input.validate()?;
    let ingest = ingest_metrics(
        &state.pool,
        &state.config.monitor.thresholds,
        &kiosk.device_id,
        &input.into(),
    )
    .await?;
    Ok(Json(DataResponse {
        data: MetricAck {
            sample_id: ingest.sample.id,
            recorded_at: ingest.sample.recorded_at,
            alerts_opened: ingest.alerts_opened.len(),
        },
    }))
}

// ---------------------------------------------------------------------------
// Admin handlers
// ---------------------------------------------------------------------------

/// GET /kiosks?status=
pub async fn list_kiosks(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<KioskListQuery>,
) -> AppResult<Json<DataResponse<Vec<Kiosk>>>> {
    let status = non_empty(query.status)
        .map(|s| s.parse::<KioskStatus>())
        .transpose()?;
    let kiosks = KioskRepo::list(&state.pool, status).await?;
    Ok(Json(DataResponse { data: kiosks }))
}

/// GET /kiosks/{device_id}
pub async fn get_kiosk(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(device_id): Path<String>,
) -> AppResult<Json<DataResponse<KioskDetail>>> {
    let detail = reporting::kiosk_detail(&state.pool, &device_id).await?;
    Ok(Json(DataResponse { data: detail }))
}

/// GET /alerts?resolved=&severity=
///
/// Newest first, capped at [`ALERT_LIST_LIMIT`] rows.
pub async fn list_alerts(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<AlertListQuery>,
) -> AppResult<Json<DataResponse<Vec<AlertWithKiosk>>>> {
    let filter = query.into_filter()?;
    let alerts = AlertRepo::list(&state.pool, &filter, ALERT_LIST_LIMIT).await?;
    Ok(Json(DataResponse { data: alerts }))
}

/// PUT /alerts/{id}/resolve
pub async fn resolve_alert(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(alert_id): Path<DbId>,
) -> AppResult<Json<DataResponse<KioskAlert>>> {
    let alert = AlertRepo::resolve(&state.pool, alert_id, &admin.subject)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Alert", alert_id)))?;

    tracing::info!(
        alert_id,
        kiosk_id = alert.kiosk_id,
        resolved_by = %admin.subject,
        "Alert resolved",
    );

    Ok(Json(DataResponse { data: alert }))
}

/// GET /stats
pub async fn get_stats(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<DataResponse<FleetStats>>> {
    let stats = reporting::fleet_stats(&state.pool).await?;
    Ok(Json(DataResponse { data: stats }))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn metrics_ranges() {
        let ok = MetricsRequest {
            cpu_usage: Some(100.0),
            temperature: Some(-50.0),
            uptime_seconds: Some(0),
            ..MetricsRequest::default()
        };
        assert!(ok.validate().is_ok());

        let bad = MetricsRequest {
            disk_usage: Some(100.5),
            ..MetricsRequest::default()
        };
        assert!(bad.validate().is_err());

        let bad = MetricsRequest {
            active_users: Some(-1),
            ..MetricsRequest::default()
        };
        assert!(bad.validate().is_err());

        let bad = MetricsRequest {
            temperature: Some(151.0),
            ..MetricsRequest::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn metadata_must_be_an_object() {
        let ok = HeartbeatRequest {
            metadata: Some(json!({"screen": "ok"})),
            ..HeartbeatRequest::default()
        };
        assert!(ok.validate().is_ok());

        let bad = HeartbeatRequest {
            metadata: Some(json!(["not", "an", "object"])),
            ..HeartbeatRequest::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn heartbeat_null_clears_and_omitted_keeps() {
        let req: HeartbeatRequest = serde_json::from_value(json!({
            "location": null,
            "version": "2.4.1"
        }))
        .unwrap();
        let update: HeartbeatUpdate = req.into();
        assert_eq!(update.location, Some(None));
        assert_eq!(update.version, Some(Some("2.4.1".to_string())));
        assert_eq!(update.ip_address, None);

        let empty: HeartbeatRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty.location, None);
    }

    #[test]
    fn heartbeat_lengths_checked_only_when_set() {
        let long = HeartbeatRequest {
            ip_address: Some(Some("1".repeat(46))),
            ..HeartbeatRequest::default()
        };
        assert!(long.validate().is_err());

        let cleared = HeartbeatRequest {
            ip_address: Some(None),
            ..HeartbeatRequest::default()
        };
        assert!(cleared.validate().is_ok());
    }

    #[test]
    fn metrics_request_maps_wire_names() {
        let req: MetricsRequest = serde_json::from_value(json!({
            "network_latency": 35,
            "temperature": 41.5
        }))
        .unwrap();
        let sample: CreateKioskMetric = req.into();
        assert_eq!(sample.network_latency_ms, Some(35));
        assert_eq!(sample.temperature_celsius, Some(41.5));
        assert_eq!(sample.cpu_usage, None);
    }

    #[test]
    fn alert_query_parsing() {
        let filter = AlertListQuery {
            resolved: Some("false".into()),
            severity: Some("critical".into()),
        }
        .into_filter()
        .unwrap();
        assert_eq!(filter.resolved, Some(false));
        assert_eq!(filter.severity, Some(Severity::Critical));

        let empty = AlertListQuery {
            resolved: Some(String::new()),
            severity: None,
        }
        .into_filter()
        .unwrap();
        assert_eq!(empty.resolved, None);

        assert!(AlertListQuery {
            resolved: Some("maybe".into()),
            severity: None,
        }
        .into_filter()
        .is_err());
        assert!(AlertListQuery {
            resolved: None,
            severity: Some("SEVERE".into()),
        }
        .into_filter()
        .is_err());
    }
}
