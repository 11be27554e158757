// src/error.rs
// Configuration errors raised when a retry policy is built

use thiserror::Error;

/// Rejected retry configuration.
///
/// Only ever produced while a [`RetryConfig`](crate::RetryConfig) is being
/// constructed. Running a policy never yields one of these; the wrapped
/// operation's own error type is returned unchanged instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("\"tries\" must be greater than or equal to 1 (got {0})")]
    InvalidTries(f64),
    #[error("\"delay\" must be greater than or equal to 0 (got {0})")]
    InvalidDelay(f64),
    #[error("\"backoff\" must be greater than or equal to 1 (got {0})")]
    InvalidBackoff(f64),
    #[error("\"max_delay\" must be greater than or equal to delay (got {max_delay} < {delay})")]
    InvalidMaxDelay { delay: f64, max_delay: f64 },
    #[error("\"{field}\" must be a finite number (got {value})")]
    NotFinite { field: &'static str, value: f64 },
    #[error("\"{field}\" is too large to be used as a wait (got {value} seconds)")]
    OutOfRange { field: &'static str, value: f64 },
}

impl ConfigError {
    /// Name of the offending configuration field.
    pub fn field(&self) -> &'static str {
        match self {
            ConfigError::InvalidTries(_) => "tries",
            ConfigError::InvalidDelay(_) => "delay",
            ConfigError::InvalidBackoff(_) => "backoff",
            ConfigError::InvalidMaxDelay { .. } => "max_delay",
            ConfigError::NotFinite { field, .. } => *field,
            ConfigError::OutOfRange { field, .. } => *field,
        }
    }
}
