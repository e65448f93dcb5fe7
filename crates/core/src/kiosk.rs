//! Kiosk identity, lifecycle status, and heartbeat deadline rules.

use chrono::Duration;

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// A kiosk that has not sent a heartbeat for this many minutes is swept
/// offline.
pub const DEFAULT_HEARTBEAT_TIMEOUT_MINUTES: i64 = 5;

/// How often the offline sweeper runs.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 120;

/// Upper bound for a single sweep run.
pub const DEFAULT_SWEEP_TIMEOUT_SECS: u64 = 60;

/// How many recent metric samples the kiosk detail view returns.
pub const RECENT_METRICS_LIMIT: i64 = 100;

/// Maximum length of an external device identifier (`kiosks.device_id`).
pub const MAX_DEVICE_ID_LEN: usize = 50;

define_label_enum! {
    /// Lifecycle status of a kiosk, as last written by the registry.
    KioskStatus ("kiosk status") {
        Online = "ONLINE",
        Offline = "OFFLINE",
    }
}

// ---------------------------------------------------------------------------
// Heartbeat deadline
// ---------------------------------------------------------------------------

/// The instant before which a last heartbeat counts as stale.
///
/// A heartbeat exactly at the cutoff is still fresh; the sweep compares
/// with a strict `<`.
pub fn heartbeat_cutoff(now: Timestamp, timeout: Duration) -> Timestamp {
    now - timeout
}

/// A heartbeat that brings a previously OFFLINE kiosk back ONLINE.
///
/// First contact (`previous == None`) is a registration, not a recovery.
pub fn is_recovery(previous: Option<KioskStatus>, current: KioskStatus) -> bool {
    previous == Some(KioskStatus::Offline) && current == KioskStatus::Online
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate an external device identifier presented by a kiosk.
///
/// Rules:
/// - Must not be empty.
/// - Must not exceed [`MAX_DEVICE_ID_LEN`] characters.
/// - Must contain only alphanumeric, hyphen, underscore, or dot characters.
pub fn validate_device_id(device_id: &str) -> Result<(), CoreError> {
    if device_id.is_empty() {
        return Err(CoreError::Validation(
            "Device id must not be empty".to_string(),
        ));
    }
    if device_id.len() > MAX_DEVICE_ID_LEN {
        return Err(CoreError::Validation(format!(
            "Device id must not exceed {MAX_DEVICE_ID_LEN} characters"
        )));
    }
    if !device_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(CoreError::Validation(
            "Device id may only contain alphanumeric, hyphen, underscore, or dot characters"
                .to_string(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
