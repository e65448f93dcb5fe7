#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use kioskwatch_api::auth::build_verifier;
use kioskwatch_api::auth::jwt::{generate_access_token, JwtConfig};
use kioskwatch_api::config::{AuthConfig, MonitorConfig, ServerConfig};
use kioskwatch_api::middleware::kiosk::{API_KEY_HEADER, KIOSK_ID_HEADER};
use kioskwatch_api::routes;
use kioskwatch_api::state::AppState;

/// Fleet key accepted by the test app.
pub const TEST_KIOSK_KEY: &str = "test-fleet-key";

const TEST_JWT_SECRET: &str = "test-secret-not-for-production";

fn jwt_config() -> JwtConfig {
    JwtConfig {
        secret: TEST_JWT_SECRET.to_string(),
        access_token_expiry_mins: 15,
    }
}

/// Build a test `ServerConfig` with safe defaults.
///
/// Admin tokens are verified locally with a fixed secret so tests can mint
/// their own.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        kiosk_api_key: TEST_KIOSK_KEY.to_string(),
        auth: AuthConfig::Jwt(jwt_config()),
        monitor: MonitorConfig::default(),
    }
}

/// Build the full application router with the default monitoring policy.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, MonitorConfig::default())
}

/// Build the full application router with all middleware layers.
///
/// This mirrors the router construction in `main.rs` so integration tests
/// exercise the same middleware stack production uses.
pub fn build_test_app_with(pool: PgPool, monitor: MonitorConfig) -> Router {
    let config = ServerConfig {
        monitor,
        ..test_config()
    };
    let verifier = build_verifier(&config.auth);

    let state = AppState {
        pool,
        config: Arc::new(config),
        verifier,
    };

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION, API_KEY_HEADER, KIOSK_ID_HEADER])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .merge(routes::health::router())
        .nest("/api/monitor", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

pub fn admin_token() -> String {
    generate_access_token("ops-17", "admin", &jwt_config()).unwrap()
}

pub fn operator_token() -> String {
    generate_access_token("viewer-3", "viewer", &jwt_config()).unwrap()
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Unauthenticated GET.
pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

/// GET with a bearer token.
pub async fn get_as(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::builder()
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// PUT with a bearer token and no body.
pub async fn put_as(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::builder()
        .method(Method::PUT)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// POST a JSON body as a kiosk, using the test fleet key.
pub async fn kiosk_post(
    app: Router,
    uri: &str,
    device_id: &str,
    body: serde_json::Value,
) -> Response {
    kiosk_post_with_key(app, uri, device_id, TEST_KIOSK_KEY, body).await
}

/// POST a JSON body as a kiosk with an explicit API key.
pub async fn kiosk_post_with_key(
    app: Router,
    uri: &str,
    device_id: &str,
    api_key: &str,
    body: serde_json::Value,
) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .header(API_KEY_HEADER, api_key)
        .header(KIOSK_ID_HEADER, device_id)
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Push a kiosk's heartbeat into the past so the sweep treats it as stale.
pub async fn age_heartbeat(pool: &PgPool, device_id: &str, minutes: i32) {
    sqlx::query(
        "UPDATE kiosks SET last_heartbeat = NOW() - make_interval(mins => $2) \
         WHERE device_id = $1",
    )
    .bind(device_id)
    .bind(minutes)
    .execute(pool)
    .await
    .unwrap();
}
