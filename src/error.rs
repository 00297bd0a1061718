//! Error types
//!
//! Cache and policy operations are infallible; only configuration loading
//! can fail.

use thiserror::Error;

// == Config Error Enum ==
/// Errors raised while decoding configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A setting is present but cannot be decoded
    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    /// A duration expression cannot be parsed
    #[error(
        "cannot parse '{0}' into a duration, expected a number with an optional \
         'ms', 's', 'm', 'h' or 'd' suffix"
    )]
    InvalidDuration(String),
}

// == Result Type Alias ==
/// Convenience Result type for configuration loading.
pub type Result<T> = std::result::Result<T, ConfigError>;
