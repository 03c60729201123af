//! Room service configuration.
//!
//! Configuration is loaded from environment variables. The store URL is
//! redacted in Debug output since it may carry credentials.

use std::collections::HashMap;
use std::env;
use std::fmt;
use thiserror::Error;

/// Default TTL for a pending room, in seconds (1 hour grace window for the
/// second participant to join).
pub const DEFAULT_PENDING_TTL_SECONDS: i64 = 60 * 60;

/// Default TTL for an active room, in seconds (10 minutes of live chat).
pub const DEFAULT_LIVE_TTL_SECONDS: i64 = 60 * 10;

/// Default membership capacity per room.
pub const DEFAULT_MAX_MEMBERS: u64 = 50;

/// Room service configuration.
///
/// Loaded from environment variables with sensible defaults.
/// The Redis URL is redacted in Debug output to prevent credential leakage.
#[derive(Clone)]
pub struct Config {
    /// Redis connection URL.
    pub redis_url: String,

    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// TTL applied to a freshly created (pending) room.
    pub pending_ttl_seconds: i64,

    /// TTL applied when a room activates on first join.
    pub live_ttl_seconds: i64,

    /// Maximum number of members per room.
    pub max_members: u64,
}

/// Custom Debug implementation that redacts the store URL.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("redis_url", &"[REDACTED]")
            .field("bind_address", &self.bind_address)
            .field("pending_ttl_seconds", &self.pending_ttl_seconds)
            .field("live_ttl_seconds", &self.live_ttl_seconds)
            .field("max_members", &self.max_members)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid TTL configuration: {0}")]
    InvalidTtl(String),

    #[error("Invalid capacity configuration: {0}")]
    InvalidCapacity(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let redis_url = vars
            .get("REDIS_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("REDIS_URL".to_string()))?
            .clone();

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| "0.0.0.0:8080".to_string());

        let pending_ttl_seconds = parse_ttl(
            vars,
            "ROOM_PENDING_TTL_SECONDS",
            DEFAULT_PENDING_TTL_SECONDS,
        )?;
        let live_ttl_seconds = parse_ttl(vars, "ROOM_LIVE_TTL_SECONDS", DEFAULT_LIVE_TTL_SECONDS)?;

        let max_members = if let Some(value_str) = vars.get("ROOM_MAX_MEMBERS") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidCapacity(format!(
                    "ROOM_MAX_MEMBERS must be a valid positive integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value < 2 {
                return Err(ConfigError::InvalidCapacity(format!(
                    "ROOM_MAX_MEMBERS must be at least 2, got {}",
                    value
                )));
            }

            value
        } else {
            DEFAULT_MAX_MEMBERS
        };

        Ok(Config {
            redis_url,
            bind_address,
            pending_ttl_seconds,
            live_ttl_seconds,
            max_members,
        })
    }
}

/// Parse a positive TTL value from the variable map, with a default.
fn parse_ttl(
    vars: &HashMap<String, String>,
    name: &str,
    default: i64,
) -> Result<i64, ConfigError> {
    if let Some(value_str) = vars.get(name) {
        let value: i64 = value_str.parse().map_err(|e| {
            ConfigError::InvalidTtl(format!(
                "{} must be a valid integer, got '{}': {}",
                name, value_str, e
            ))
        })?;

        if value <= 0 {
            return Err(ConfigError::InvalidTtl(format!(
                "{} must be positive, got {}",
                name, value
            )));
        }

        Ok(value)
    } else {
        Ok(default)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn base_vars() -> HashMap<String, String> {
        HashMap::from([(
            "REDIS_URL".to_string(),
            "redis://localhost:6379".to_string(),
        )])
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_vars(&base_vars()).unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert_eq!(config.pending_ttl_seconds, DEFAULT_PENDING_TTL_SECONDS);
        assert_eq!(config.live_ttl_seconds, DEFAULT_LIVE_TTL_SECONDS);
        assert_eq!(config.max_members, DEFAULT_MAX_MEMBERS);
    }

    #[test]
    fn test_missing_redis_url() {
        let result = Config::from_vars(&HashMap::new());
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(_))));
    }

    #[test]
    fn test_custom_ttls() {
        let mut vars = base_vars();
        vars.insert("ROOM_PENDING_TTL_SECONDS".to_string(), "120".to_string());
        vars.insert("ROOM_LIVE_TTL_SECONDS".to_string(), "60".to_string());

        let config = Config::from_vars(&vars).unwrap();
        assert_eq!(config.pending_ttl_seconds, 120);
        assert_eq!(config.live_ttl_seconds, 60);
    }

    #[test]
    fn test_non_positive_ttl_rejected() {
        let mut vars = base_vars();
        vars.insert("ROOM_LIVE_TTL_SECONDS".to_string(), "0".to_string());
        assert!(matches!(
            Config::from_vars(&vars),
            Err(ConfigError::InvalidTtl(_))
        ));

        let mut vars = base_vars();
        vars.insert("ROOM_PENDING_TTL_SECONDS".to_string(), "-5".to_string());
        assert!(matches!(
            Config::from_vars(&vars),
            Err(ConfigError::InvalidTtl(_))
        ));
    }

    #[test]
    fn test_invalid_ttl_rejected() {
        let mut vars = base_vars();
        vars.insert(
            "ROOM_LIVE_TTL_SECONDS".to_string(),
            "not-a-number".to_string(),
        );
        assert!(matches!(
            Config::from_vars(&vars),
            Err(ConfigError::InvalidTtl(_))
        ));
    }

    #[test]
    fn test_capacity_lower_bound() {
        let mut vars = base_vars();
        vars.insert("ROOM_MAX_MEMBERS".to_string(), "1".to_string());
        assert!(matches!(
            Config::from_vars(&vars),
            Err(ConfigError::InvalidCapacity(_))
        ));

        let mut vars = base_vars();
        vars.insert("ROOM_MAX_MEMBERS".to_string(), "2".to_string());
        let config = Config::from_vars(&vars).unwrap();
        assert_eq!(config.max_members, 2);
    }

    #[test]
    fn test_debug_redacts_redis_url() {
        let mut vars = base_vars();
        vars.insert(
            "REDIS_URL".to_string(),
            "redis://:secret@localhost:6379".to_string(),
        );
        let config = Config::from_vars(&vars).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
