//! Token verification delegated to the platform auth service.

use std::time::Duration;

use async_trait::async_trait;
use kioskwatch_core::error::CoreError;
use reqwest::StatusCode;
use serde::Deserialize;

use super::{Principal, TokenVerifier};
use crate::error::AppError;

/// Path of the verification endpoint on the auth service.
const VERIFY_PATH: &str = "/api/auth/verify";

/// Per-request timeout for calls to the auth service.
const VERIFY_TIMEOUT: Duration = Duration::from_secs(5);

/// Subject recorded when the auth service returns no usable identifier.
const FALLBACK_SUBJECT: &str = "admin";

/// Envelope returned by `GET /api/auth/verify`.
#[derive(Debug, Deserialize)]
struct VerifyResponse {
    success: bool,
    data: Option<VerifyData>,
}

#[derive(Debug, Deserialize)]
struct VerifyData {
    user: VerifiedUser,
}

#[derive(Debug, Deserialize)]
struct VerifiedUser {
    role: String,
    consumer_id: Option<serde_json::Value>,
    email: Option<String>,
}

impl VerifiedUser {
    /// Prefer the consumer id, then the email address.
    fn subject(&self) -> String {
        let consumer_id = self.consumer_id.as_ref().and_then(|v| match v {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        });
        consumer_id
            .or_else(|| self.email.clone().filter(|e| !e.is_empty()))
            .unwrap_or_else(|| FALLBACK_SUBJECT.to_string())
    }
}

/// [`TokenVerifier`] that forwards the bearer token to the auth service.
pub struct RemoteTokenVerifier {
    client: reqwest::Client,
    verify_url: String,
}

impl RemoteTokenVerifier {
    /// Build a verifier for the auth service rooted at `base_url`.
    pub fn new(base_url: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(VERIFY_TIMEOUT).build()?;
        Ok(Self {
            client,
            verify_url: format!("{}{VERIFY_PATH}", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl TokenVerifier for RemoteTokenVerifier {
    async fn verify(&self, token: &str) -> Result<Principal, AppError> {
        let response = self
            .client
            .get(&self.verify_url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("auth service request failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AppError::Core(CoreError::Unauthorized(
                "Invalid or expired token".into(),
            )));
        }
        if !status.is_success() {
            return Err(AppError::Upstream(format!(
                "auth service returned {status}"
            )));
        }

        let body: VerifyResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("malformed auth service response: {e}")))?;

        if !body.success {
            return Err(AppError::Core(CoreError::Unauthorized(
                "Invalid token".into(),
            )));
        }

        let user = body
            .data
            .map(|d| d.user)
            .ok_or_else(|| AppError::Upstream("auth service response has no user".into()))?;

        Ok(Principal {
            subject: user.subject(),
            role: user.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use axum::http::HeaderMap;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    use super::*;

    /// Serve a stand-in auth service on an ephemeral port and return its base URL.
    async fn spawn_auth_service() -> String {
        async fn verify(headers: HeaderMap) -> (axum::http::StatusCode, Json<serde_json::Value>) {
            let token = headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "));
            match token {
                Some("admin-token") => (
                    axum::http::StatusCode::OK,
                    Json(json!({
                        "success": true,
                        "data": {"user": {"role": "admin", "consumer_id": 17, "email": "ops@city.gov"}}
                    })),
                ),
                Some("citizen-token") => (
                    axum::http::StatusCode::OK,
                    Json(json!({
                        "success": true,
                        "data": {"user": {"role": "citizen", "email": "someone@example.org"}}
                    })),
                ),
                Some("broken-token") => (
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"success": false})),
                ),
                _ => (
                    axum::http::StatusCode::UNAUTHORIZED,
                    Json(json!({"success": false, "error": "Invalid token"})),
                ),
            }
        }

        let app = Router::new().route(VERIFY_PATH, get(verify));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn admin_token_yields_principal() {
        let verifier = RemoteTokenVerifier::new(&spawn_auth_service().await).unwrap();
        let principal = verifier.verify("admin-token").await.unwrap();
        assert_eq!(principal.role, "admin");
        assert_eq!(principal.subject, "17");
    }

    #[tokio::test]
    async fn subject_falls_back_to_email() {
        let verifier = RemoteTokenVerifier::new(&spawn_auth_service().await).unwrap();
        let principal = verifier.verify("citizen-token").await.unwrap();
        assert_eq!(principal.role, "citizen");
        assert_eq!(principal.subject, "someone@example.org");
    }

    #[tokio::test]
    async fn rejected_token_is_unauthorized() {
        let verifier = RemoteTokenVerifier::new(&spawn_auth_service().await).unwrap();
        let err = verifier.verify("forged").await.unwrap_err();
        assert_matches!(err, AppError::Core(CoreError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn server_error_is_upstream() {
        let verifier = RemoteTokenVerifier::new(&spawn_auth_service().await).unwrap();
        let err = verifier.verify("broken-token").await.unwrap_err();
        assert_matches!(err, AppError::Upstream(_));
    }

    #[tokio::test]
    async fn unreachable_service_is_upstream() {
        // Bind then drop to get a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let verifier = RemoteTokenVerifier::new(&format!("http://{addr}")).unwrap();
        let err = verifier.verify("admin-token").await.unwrap_err();
        assert_matches!(err, AppError::Upstream(_));
    }

    #[test]
    fn subject_without_identifiers_uses_fallback() {
        let user = VerifiedUser {
            role: "admin".into(),
            consumer_id: None,
            email: None,
        };
        assert_eq!(user.subject(), FALLBACK_SUBJECT);
    }
}
