use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use kioskwatch_core::kiosk::{
    DEFAULT_HEARTBEAT_TIMEOUT_MINUTES, DEFAULT_SWEEP_INTERVAL_SECS, DEFAULT_SWEEP_TIMEOUT_SECS,
};
use kioskwatch_core::thresholds::{
    AlertThresholds, DEFAULT_CPU_THRESHOLD, DEFAULT_DISK_THRESHOLD, DEFAULT_MEMORY_THRESHOLD,
};

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the kiosk fleet key have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8005`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for background tasks, in seconds (default: `10`).
    pub shutdown_timeout_secs: u64,
    /// Pre-shared key every kiosk presents in `X-Api-Key`.
    pub kiosk_api_key: String,
    /// How admin bearer tokens are verified.
    pub auth: AuthConfig,
    /// Heartbeat, sweep, and alerting policy.
    pub monitor: MonitorConfig,
}

/// Admin token verification strategy.
#[derive(Debug, Clone)]
pub enum AuthConfig {
    /// Delegate to the platform auth service (`GET {base_url}/api/auth/verify`).
    Remote { base_url: String },
    /// Verify HS256 tokens locally.
    Jwt(JwtConfig),
}

/// Monitoring policy knobs.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Minutes without a heartbeat before a kiosk is swept offline.
    pub heartbeat_timeout_minutes: i64,
    /// Seconds between offline sweeps.
    pub sweep_interval_secs: u64,
    /// Upper bound for a single sweep run, in seconds.
    pub sweep_timeout_secs: u64,
    /// Resource utilization thresholds.
    pub thresholds: AlertThresholds,
    /// Resolve the open `KIOSK_OFFLINE` alert when a kiosk comes back.
    pub auto_resolve_offline_on_recovery: bool,
    /// Prune metric samples older than this many days. `None` keeps
    /// everything.
    pub metrics_retention_days: Option<i64>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            heartbeat_timeout_minutes: DEFAULT_HEARTBEAT_TIMEOUT_MINUTES,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
            sweep_timeout_secs: DEFAULT_SWEEP_TIMEOUT_SECS,
            thresholds: AlertThresholds::default(),
            auto_resolve_offline_on_recovery: false,
            metrics_retention_days: None,
        }
    }
}

impl MonitorConfig {
    /// Load monitoring policy from environment variables.
    ///
    /// | Env Var                            | Default  |
    /// |------------------------------------|----------|
    /// | `HEARTBEAT_TIMEOUT_MINUTES`        | `5`      |
    /// | `SWEEP_INTERVAL_SECS`              | `120`    |
    /// | `SWEEP_TIMEOUT_SECS`               | `60`     |
    /// | `CPU_THRESHOLD`                    | `80`     |
    /// | `MEMORY_THRESHOLD`                 | `85`     |
    /// | `DISK_THRESHOLD`                   | `90`     |
    /// | `AUTO_RESOLVE_OFFLINE_ON_RECOVERY` | `false`  |
    /// | `METRICS_RETENTION_DAYS`           | disabled |
    ///
    /// # Panics
    ///
    /// Panics on malformed values, non-positive durations, or thresholds
    /// outside `(0, 100]`.
    pub fn from_env() -> Self {
        let heartbeat_timeout_minutes: i64 =
            env_parse("HEARTBEAT_TIMEOUT_MINUTES", DEFAULT_HEARTBEAT_TIMEOUT_MINUTES);
        assert!(
            heartbeat_timeout_minutes > 0,
            "HEARTBEAT_TIMEOUT_MINUTES must be positive"
        );

        let sweep_interval_secs: u64 = env_parse("SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL_SECS);
        assert!(sweep_interval_secs > 0, "SWEEP_INTERVAL_SECS must be positive");

        let sweep_timeout_secs: u64 = env_parse("SWEEP_TIMEOUT_SECS", DEFAULT_SWEEP_TIMEOUT_SECS);
        assert!(sweep_timeout_secs > 0, "SWEEP_TIMEOUT_SECS must be positive");

        let thresholds = AlertThresholds {
            cpu: env_parse("CPU_THRESHOLD", DEFAULT_CPU_THRESHOLD),
            memory: env_parse("MEMORY_THRESHOLD", DEFAULT_MEMORY_THRESHOLD),
            disk: env_parse("DISK_THRESHOLD", DEFAULT_DISK_THRESHOLD),
        };
        if let Err(e) = thresholds.validate() {
            panic!("Invalid alert threshold configuration: {e}");
        }

        let auto_resolve_offline_on_recovery = match std::env::var("AUTO_RESOLVE_OFFLINE_ON_RECOVERY")
        {
            Ok(raw) => parse_flag(&raw).unwrap_or_else(|| {
                panic!("AUTO_RESOLVE_OFFLINE_ON_RECOVERY must be a boolean, got '{raw}'")
            }),
            Err(_) => false,
        };

        let metrics_retention_days = std::env::var("METRICS_RETENTION_DAYS")
            .ok()
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| {
                let days: i64 = raw
                    .trim()
                    .parse()
                    .unwrap_or_else(|e| panic!("METRICS_RETENTION_DAYS must be a valid i64: {e}"));
                assert!(days > 0, "METRICS_RETENTION_DAYS must be positive");
                days
            });

        Self {
            heartbeat_timeout_minutes,
            sweep_interval_secs,
            sweep_timeout_secs,
            thresholds,
            auto_resolve_offline_on_recovery,
            metrics_retention_days,
        }
    }

    /// Heartbeat deadline as a chrono duration.
    pub fn heartbeat_timeout(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.heartbeat_timeout_minutes)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn sweep_timeout(&self) -> Duration {
        Duration::from_secs(self.sweep_timeout_secs)
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `8005`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`| `10`                       |
    /// | `KIOSK_API_KEY`        | required                   |
    /// | `AUTH_SERVICE_URL`     | unset (verify JWT locally) |
    ///
    /// `JWT_SECRET` is required when `AUTH_SERVICE_URL` is unset. Monitoring
    /// policy is read by [`MonitorConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = env_parse("PORT", 8005);

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = env_parse("REQUEST_TIMEOUT_SECS", 30);

        let shutdown_timeout_secs: u64 = env_parse("SHUTDOWN_TIMEOUT_SECS", 10);

        let kiosk_api_key =
            std::env::var("KIOSK_API_KEY").expect("KIOSK_API_KEY must be set in the environment");
        assert!(!kiosk_api_key.is_empty(), "KIOSK_API_KEY must not be empty");

        let auth = match std::env::var("AUTH_SERVICE_URL") {
            Ok(url) if !url.trim().is_empty() => AuthConfig::Remote {
                base_url: url.trim().trim_end_matches('/').to_string(),
            },
            _ => AuthConfig::Jwt(JwtConfig::from_env()),
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            kiosk_api_key,
            auth,
            monitor: MonitorConfig::from_env(),
        }
    }
}

/// Read and parse an environment variable, falling back to `default` when
/// unset.
///
/// # Panics
///
/// Panics if the variable is set but does not parse.
fn env_parse<T>(name: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{name} must be a valid value, got '{raw}': {e}")),
        Err(_) => default,
    }
}

/// Parse a boolean flag value (`true`/`false`, `1`/`0`, `yes`/`no`, `on`/`off`).
fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
