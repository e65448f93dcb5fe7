//! Route definitions for kiosk monitoring endpoints.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::monitor;
use crate::state::AppState;

/// Kiosk-facing ingestion routes.
///
/// Authenticated by the `X-Api-Key` / `X-Kiosk-Id` header pair (enforced by
/// the `KioskIdentity` extractor).
///
/// ```text
/// POST /heartbeat  -> heartbeat
/// POST /metrics    -> record_metrics
/// ```
pub fn kiosk_router() -> Router<AppState> {
    Router::new()
        .route("/heartbeat", post(monitor::heartbeat))
        .route("/metrics", post(monitor::record_metrics))
}

/// Operator routes. All require the `admin` role (enforced by handler
/// extractors).
///
/// ```text
/// GET /kiosks                -> list_kiosks
/// GET /kiosks/{device_id}    -> get_kiosk
/// GET /alerts                -> list_alerts
/// PUT /alerts/{id}/resolve   -> resolve_alert
/// GET /stats                 -> get_stats
/// ```
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/kiosks", get(monitor::list_kiosks))
        .route("/kiosks/{device_id}", get(monitor::get_kiosk))
        .route("/alerts", get(monitor::list_alerts))
        .route("/alerts/{id}/resolve", put(monitor::resolve_alert))
        .route("/stats", get(monitor::get_stats))
}
