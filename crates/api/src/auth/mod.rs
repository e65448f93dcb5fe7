//! Admin token verification.
//!
//! Token issuance belongs to the platform auth service; this service only
//! verifies bearer tokens through a [`TokenVerifier`]:
//!
//! - [`remote::RemoteTokenVerifier`] -- asks the auth service
//!   (`GET {AUTH_SERVICE_URL}/api/auth/verify`).
//! - [`jwt::JwtTokenVerifier`] -- verifies HS256 tokens locally with
//!   `JWT_SECRET`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::AuthConfig;
use crate::error::AppError;

pub mod jwt;
pub mod remote;

/// The verified identity behind a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Stable identifier recorded as `resolved_by` on alerts.
    pub subject: String,
    /// Role name (e.g. `"admin"`).
    pub role: String,
}

/// Verifies a bearer token and returns the principal it identifies.
///
/// Implementations return `CoreError::Unauthorized` for bad tokens and
/// [`AppError::Upstream`] when a collaborator cannot be reached.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Principal, AppError>;
}

/// Build the verifier selected by configuration.
///
/// # Panics
///
/// Panics if the remote verifier's HTTP client cannot be constructed.
pub fn build_verifier(config: &AuthConfig) -> Arc<dyn TokenVerifier> {
    match config {
        AuthConfig::Remote { base_url } => Arc::new(
            remote::RemoteTokenVerifier::new(base_url)
                .expect("Failed to build auth service HTTP client"),
        ),
        AuthConfig::Jwt(jwt_config) => Arc::new(jwt::JwtTokenVerifier::new(jwt_config.clone())),
    }
}
