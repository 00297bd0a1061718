//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{ConfigError, Result};
use crate::lifecycle::ConnectionLifecycleSettings;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Interval between sweeps of expired tracker entries
    pub cleanup_interval: Duration,
    /// Connection lifecycle thresholds
    pub connection_lifecycle: ConnectionLifecycleSettings,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Sweep interval as a duration (default: 30s)
    /// - `CONNECTION_LIFECYCLE_ENABLED` - `true` or `false` (default: true)
    /// - `CONNECTION_LIFECYCLE_MAX_AGE` - Max connection age, `0` disables (default: 1m)
    /// - `CONNECTION_LIFECYCLE_MAX_REQUEST_COUNT` - Max requests per connection,
    ///   `0` disables (default: 0)
    ///
    /// Unset variables take their default. Set but malformed variables are
    /// reported as [`ConfigError::InvalidValue`].
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a Config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let lifecycle_defaults = defaults.connection_lifecycle;

        Ok(Self {
            server_port: parse_var(&lookup, "SERVER_PORT", defaults.server_port)?,
            cleanup_interval: duration_var(&lookup, "CLEANUP_INTERVAL", defaults.cleanup_interval)?,
            connection_lifecycle: ConnectionLifecycleSettings {
                enabled: parse_var(
                    &lookup,
                    "CONNECTION_LIFECYCLE_ENABLED",
                    lifecycle_defaults.enabled,
                )?,
                max_connection_age: duration_var(
                    &lookup,
                    "CONNECTION_LIFECYCLE_MAX_AGE",
                    lifecycle_defaults.max_connection_age,
                )?,
                max_connection_request_count: parse_var(
                    &lookup,
                    "CONNECTION_LIFECYCLE_MAX_REQUEST_COUNT",
                    lifecycle_defaults.max_connection_request_count,
                )?,
            },
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            cleanup_interval: Duration::from_secs(30),
            connection_lifecycle: ConnectionLifecycleSettings::default(),
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|err: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            reason: err.to_string(),
            value,
        }),
    }
}

fn duration_var<F>(lookup: &F, key: &str, default: Duration) -> Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => parse_duration(&value).map_err(|err| ConfigError::InvalidValue {
            key: key.to_string(),
            reason: err.to_string(),
            value,
        }),
    }
}

/// Parses a duration like `500ms`, `30s`, `5m`, `2h` or `1d`.
///
/// A bare number is read as milliseconds.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let invalid = || ConfigError::InvalidDuration(input.to_string());

    let trimmed = input.trim();
    let digits_end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (number, suffix) = trimmed.split_at(digits_end);
    let number: u64 = number.parse().map_err(|_| invalid())?;

    let seconds = |factor: u64| {
        number
            .checked_mul(factor)
            .map(Duration::from_secs)
            .ok_or_else(invalid)
    };

    match suffix.trim().to_ascii_lowercase().as_str() {
        "" | "ms" => Ok(Duration::from_millis(number)),
        "s" => seconds(1),
        "m" => seconds(60),
        "h" => seconds(60 * 60),
        "d" => seconds(24 * 60 * 60),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    // Tests that touch process environment variables hold this lock.
    static ENV_LOCK: parking_lot::Mutex<()> = parking_lot::Mutex::new(());

    const ENV_KEYS: [&str; 5] = [
        "SERVER_PORT",
        "CLEANUP_INTERVAL",
        "CONNECTION_LIFECYCLE_ENABLED",
        "CONNECTION_LIFECYCLE_MAX_AGE",
        "CONNECTION_LIFECYCLE_MAX_REQUEST_COUNT",
    ];

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cleanup_interval, Duration::from_secs(30));
        assert!(config.connection_lifecycle.enabled);
        assert_eq!(
            config.connection_lifecycle.max_connection_age,
            Duration::from_secs(60)
        );
        assert_eq!(config.connection_lifecycle.max_connection_request_count, 0);
    }

    #[test]
    fn test_from_lookup_empty_uses_defaults() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("SERVER_PORT", "8080"),
            ("CLEANUP_INTERVAL", "500ms"),
            ("CONNECTION_LIFECYCLE_ENABLED", "false"),
            ("CONNECTION_LIFECYCLE_MAX_AGE", "2m"),
            ("CONNECTION_LIFECYCLE_MAX_REQUEST_COUNT", "100"),
        ]))
        .unwrap();

        assert_eq!(config.server_port, 8080);
        assert_eq!(config.cleanup_interval, Duration::from_millis(500));
        assert_eq!(
            config.connection_lifecycle,
            ConnectionLifecycleSettings {
                enabled: false,
                max_connection_age: Duration::from_secs(120),
                max_connection_request_count: 100,
            }
        );
    }

    #[test]
    fn test_from_lookup_invalid_port() {
        let err = Config::from_lookup(lookup(&[("SERVER_PORT", "http")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref key, ref value, .. }
                if key == "SERVER_PORT" && value == "http"
        ));
    }

    #[test]
    fn test_from_lookup_invalid_duration() {
        let err =
            Config::from_lookup(lookup(&[("CONNECTION_LIFECYCLE_MAX_AGE", "forever")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref key, .. } if key == "CONNECTION_LIFECYCLE_MAX_AGE"
        ));
        assert!(err.to_string().contains("forever"));
    }

    #[test]
    fn test_from_lookup_invalid_bool() {
        let result = Config::from_lookup(lookup(&[("CONNECTION_LIFECYCLE_ENABLED", "maybe")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_duration_suffixes() {
        assert_eq!(parse_duration("250").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("15s").unwrap(), Duration::from_secs(15));
        assert_eq!(parse_duration(" 15 S ").unwrap(), Duration::from_secs(15));
        assert_eq!(parse_duration("1m").unwrap(), Duration::from_secs(60));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_duration("1d").unwrap(), Duration::from_secs(86_400));
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        for input in ["", "s", "-1s", "1.5s", "10w", "ten"] {
            assert_eq!(
                parse_duration(input),
                Err(ConfigError::InvalidDuration(input.to_string())),
                "{:?} should be rejected",
                input
            );
        }
    }

    #[test]
    fn test_config_from_env_defaults() {
        let _guard = ENV_LOCK.lock();
        for key in ENV_KEYS {
            env::remove_var(key);
        }

        let config = Config::from_env().unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_from_env_values() {
        let _guard = ENV_LOCK.lock();
        for key in ENV_KEYS {
            env::remove_var(key);
        }
        env::set_var("CONNECTION_LIFECYCLE_MAX_REQUEST_COUNT", "3");
        env::set_var("CONNECTION_LIFECYCLE_MAX_AGE", "0");

        let config = Config::from_env();

        env::remove_var("CONNECTION_LIFECYCLE_MAX_REQUEST_COUNT");
        env::remove_var("CONNECTION_LIFECYCLE_MAX_AGE");

        let config = config.unwrap();
        assert_eq!(config.connection_lifecycle.max_connection_request_count, 3);
        assert_eq!(config.connection_lifecycle.max_connection_age, Duration::ZERO);
    }
}
