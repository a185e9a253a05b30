//! Server configuration from the environment.

use std::time::Duration;

use axum::http::HeaderValue;
use thiserror::Error;

use jotter_core::defaults::{
    JWT_EXPIRES_IN_SECS, MIN_SECRET_LEN, RATE_LIMIT_PERIOD_SECS, RATE_LIMIT_REQUESTS, SERVER_PORT,
};

/// Origins allowed when `ALLOWED_ORIGINS` is unset or empty.
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &["http://localhost:5173", "http://localhost:3000"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} must be at least {min} characters")]
    TooShort { name: &'static str, min: usize },

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Global rate limit settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub requests: u64,
    pub period: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests: RATE_LIMIT_REQUESTS,
            period: Duration::from_secs(RATE_LIMIT_PERIOD_SECS),
        }
    }
}

/// Everything `main` needs to start serving.
#[derive(Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<HeaderValue>,
    pub rate_limit: RateLimitConfig,
    pub jwt_secret: String,
    pub jwt_expires_in_secs: i64,
    pub encryption_key: String,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("allowed_origins", &self.allowed_origins)
            .field("rate_limit", &self.rate_limit)
            .field("jwt_expires_in_secs", &self.jwt_expires_in_secs)
            .finish_non_exhaustive()
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .unwrap_or_else(|| "postgres://localhost/jotter".to_string());
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match lookup("PORT") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                reason: format!("not a port number: {v}"),
            })?,
            None => SERVER_PORT,
        };

        let defaults = RateLimitConfig::default();
        let rate_limit = RateLimitConfig {
            enabled: lookup("RATE_LIMIT_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.enabled),
            requests: lookup("RATE_LIMIT_REQUESTS")
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(defaults.requests),
            period: lookup("RATE_LIMIT_PERIOD_SECS")
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.period),
        };

        let jwt_secret = required_secret(&lookup, "JWT_SECRET")?;
        let encryption_key = required_secret(&lookup, "ENCRYPTION_KEY")?;
        let jwt_expires_in_secs = lookup("JWT_EXPIRES_IN_SECS")
            .and_then(|v| v.parse().ok())
            .filter(|v| *v > 0)
            .unwrap_or(JWT_EXPIRES_IN_SECS);

        let allowed_origins = parse_allowed_origins(&lookup("ALLOWED_ORIGINS").unwrap_or_default());

        Ok(Self {
            database_url,
            host,
            port,
            allowed_origins,
            rate_limit,
            jwt_secret,
            jwt_expires_in_secs,
            encryption_key,
        })
    }
}

fn required_secret<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(name)
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))?;
    if value.chars().count() < MIN_SECRET_LEN {
        return Err(ConfigError::TooShort {
            name,
            min: MIN_SECRET_LEN,
        });
    }
    Ok(value)
}

/// Parse a comma separated origin list, skipping entries that are not valid
/// header values. An empty list yields [`DEFAULT_ALLOWED_ORIGINS`].
///
/// ```text
/// ALLOWED_ORIGINS=https://notes.example.com,http://localhost:5173
/// ```
pub fn parse_allowed_origins(origins: &str) -> Vec<HeaderValue> {
    let parsed: Vec<HeaderValue> = origins
        .split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect();

    if parsed.is_empty() {
        return DEFAULT_ALLOWED_ORIGINS
            .iter()
            .copied()
            .map(HeaderValue::from_static)
            .collect();
    }
    parsed
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_with_required_secrets() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("JWT_SECRET", SECRET),
            ("ENCRYPTION_KEY", SECRET),
        ]))
        .unwrap();

        assert_eq!(config.port, 3001);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.jwt_expires_in_secs, 7 * 24 * 60 * 60);
        assert_eq!(config.rate_limit, RateLimitConfig::default());
        assert_eq!(config.allowed_origins.len(), DEFAULT_ALLOWED_ORIGINS.len());
    }

    #[test]
    fn test_missing_jwt_secret_is_an_error() {
        let err = ServerConfig::from_lookup(lookup(&[("ENCRYPTION_KEY", SECRET)])).unwrap_err();
        assert_eq!(err.to_string(), "JWT_SECRET must be set");
    }

    #[test]
    fn test_short_encryption_key_is_an_error() {
        let err = ServerConfig::from_lookup(lookup(&[
            ("JWT_SECRET", SECRET),
            ("ENCRYPTION_KEY", "short"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::TooShort { name: "ENCRYPTION_KEY", .. }));
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("JWT_SECRET", SECRET),
            ("ENCRYPTION_KEY", SECRET),
            ("PORT", "8080"),
            ("RATE_LIMIT_ENABLED", "false"),
            ("RATE_LIMIT_REQUESTS", "5"),
            ("JWT_EXPIRES_IN_SECS", "60"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert!(!config.rate_limit.enabled);
        assert_eq!(config.rate_limit.requests, 5);
        assert_eq!(config.jwt_expires_in_secs, 60);
    }

    #[test]
    fn test_invalid_port() {
        let err = ServerConfig::from_lookup(lookup(&[
            ("JWT_SECRET", SECRET),
            ("ENCRYPTION_KEY", SECRET),
            ("PORT", "http"),
        ]))
        .unwrap_err();
        assert!(err.to_string().starts_with("PORT is invalid"));
    }

    #[test]
    fn test_allowed_origins_parsing() {
        let origins = parse_allowed_origins("https://notes.example.com, http://localhost:5173 ,");
        assert_eq!(origins.len(), 2);
        assert_eq!(origins[0].to_str().unwrap(), "https://notes.example.com");
        assert_eq!(origins[1].to_str().unwrap(), "http://localhost:5173");

        let origins = parse_allowed_origins("   ");
        assert_eq!(origins.len(), DEFAULT_ALLOWED_ORIGINS.len());
    }
}
