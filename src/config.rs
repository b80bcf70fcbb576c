use std::net::SocketAddr;
use std::time::Duration;

use crate::domain::order::TransitionPolicy;

// ============================================================================
// Configuration - environment variables, optionally from a .env file
// ============================================================================
//
//   ORDER_DESK_ADDR                listen address       127.0.0.1:8080
//   ORDER_DESK_REFRESH_MS          poll interval, <= 0 disables   5000
//   ORDER_DESK_API_URL             remote order API     (unset: in-memory)
//   ORDER_DESK_REQUEST_TIMEOUT_MS  per-request timeout  10000
//   ORDER_DESK_TRANSITIONS         permissive | enforced
//
// ============================================================================

pub const DEFAULT_REFRESH_MS: i64 = 5000;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub addr: SocketAddr,
    pub refresh_interval_ms: i64,
    pub api_url: Option<String>,
    pub request_timeout: Duration,
    pub transitions: TransitionPolicy,
}

impl AppConfig {
    /// Read from the process environment after loading `.env` if present
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env file");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let addr = parse_or(&lookup, "ORDER_DESK_ADDR", SocketAddr::from(([127, 0, 0, 1], 8080)))?;
        let refresh_interval_ms = parse_or(&lookup, "ORDER_DESK_REFRESH_MS", DEFAULT_REFRESH_MS)?;
        let timeout_ms = parse_or(&lookup, "ORDER_DESK_REQUEST_TIMEOUT_MS", DEFAULT_REQUEST_TIMEOUT_MS)?;
        let transitions = parse_or(&lookup, "ORDER_DESK_TRANSITIONS", TransitionPolicy::default())?;

        let api_url = lookup("ORDER_DESK_API_URL")
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
        if let Some(url) = &api_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Invalid {
                    key: "ORDER_DESK_API_URL",
                    value: url.clone(),
                    reason: "expected an http:// or https:// url".to_string(),
                });
            }
        }

        if timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "ORDER_DESK_REQUEST_TIMEOUT_MS",
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            });
        }

        Ok(Self {
            addr,
            refresh_interval_ms,
            api_url,
            request_timeout: Duration::from_millis(timeout_ms),
            transitions,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}
