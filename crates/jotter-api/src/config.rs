//! Server configuration from environment variables.
//!
//! | Variable              | Default                                     |
//! |-----------------------|---------------------------------------------|
//! | `DATABASE_URL`        | `postgres://localhost/jotter`               |
//! | `HOST`                | `0.0.0.0`                                   |
//! | `PORT`                | `3000`                                      |
//! | `ALLOWED_ORIGINS`     | `http://localhost:3000`                     |
//! | `SYNC_KEEPALIVE_SECS` | `30`                                        |
//! | `DB_MAX_CONNECTIONS`  | `10`                                        |
//!
//! Unparseable values fall back to the default with a warning.

use std::str::FromStr;
use std::time::Duration;

use axum::http::HeaderValue;
use tracing::warn;

use jotter_db::pool::DEFAULT_MAX_CONNECTIONS;

pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/jotter";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000";
pub const DEFAULT_SYNC_KEEPALIVE_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<HeaderValue>,
    /// Interval between `: ping` comments on sync streams.
    pub sync_keepalive: Duration,
    pub db_max_connections: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            allowed_origins: parse_allowed_origins(DEFAULT_ALLOWED_ORIGINS),
            sync_keepalive: Duration::from_secs(DEFAULT_SYNC_KEEPALIVE_SECS),
            db_max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl ApiConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, which returns a variable's value
    /// if it is set.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let sync_keepalive_secs = parse_or(
            &lookup,
            "SYNC_KEEPALIVE_SECS",
            DEFAULT_SYNC_KEEPALIVE_SECS,
        );
        let sync_keepalive = if sync_keepalive_secs == 0 {
            warn!("SYNC_KEEPALIVE_SECS must be positive, using default");
            defaults.sync_keepalive
        } else {
            Duration::from_secs(sync_keepalive_secs)
        };

        let allowed_origins = lookup("ALLOWED_ORIGINS")
            .map(|raw| parse_allowed_origins(&raw))
            .filter(|origins| !origins.is_empty())
            .unwrap_or(defaults.allowed_origins);

        Self {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "PORT", defaults.port),
            allowed_origins,
            sync_keepalive,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", defaults.db_max_connections),
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(variable = key, value = %raw, "Invalid configuration value, using default");
                default
            }
        },
        None => default,
    }
}

/// Parse a comma-separated origin whitelist for CORS.
///
/// Blank entries are skipped; entries that are not valid header values are
/// logged and skipped.
pub fn parse_allowed_origins(raw: &str) -> Vec<HeaderValue> {
    raw.split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect()
}
