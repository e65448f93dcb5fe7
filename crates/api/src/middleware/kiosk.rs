//! Kiosk device authentication.
//!
//! Kiosks authenticate with two headers: the fleet-wide pre-shared key in
//! `X-Api-Key` and their own device identifier in `X-Kiosk-Id`.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderName;
use kioskwatch_core::error::CoreError;
use kioskwatch_core::kiosk::validate_device_id;

use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the fleet API key.
pub const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");

/// Header carrying the kiosk's device identifier.
pub const KIOSK_ID_HEADER: HeaderName = HeaderName::from_static("x-kiosk-id");

/// An authenticated kiosk.
#[derive(Debug, Clone)]
pub struct KioskIdentity {
    pub device_id: String,
}

impl FromRequestParts<AppState> for KioskIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let (Some(api_key), Some(device_id)) = (
            header_value(parts, &API_KEY_HEADER),
            header_value(parts, &KIOSK_ID_HEADER),
        ) else {
            return Err(AppError::Core(CoreError::Unauthorized(
                "Missing authentication headers".into(),
            )));
        };

        if !keys_match(api_key, &state.config.kiosk_api_key) {
            tracing::warn!(device_id, "Kiosk presented an invalid API key");
            return Err(AppError::Core(CoreError::Unauthorized(
                "Invalid API key".into(),
            )));
        }

        validate_device_id(device_id)?;

        Ok(KioskIdentity {
            device_id: device_id.to_string(),
        })
    }
}

/// A trimmed, non-empty header value.
fn header_value<'a>(parts: &'a Parts, name: &HeaderName) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Compare keys without short-circuiting on the first differing byte.
fn keys_match(presented: &str, expected: &str) -> bool {
    let (a, b) = (presented.as_bytes(), expected.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
