// src/config.rs
// Validated retry configuration

use crate::backoff::BackoffSchedule;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_TRIES: u32 = 6;
pub const DEFAULT_DELAY_SECS: f64 = 1.0;
pub const DEFAULT_BACKOFF: f64 = 2.0;
pub const DEFAULT_MAX_DELAY_SECS: f64 = 32.0;

/// Retry parameters, checked once at construction.
///
/// * `tries` - total attempts, including the first one
/// * `delay` - wait before the first retry
/// * `backoff` - multiplier applied to the wait after every failed retry
/// * `max_delay` - upper bound on any single wait
///
/// A value of this type is always valid: [`RetryConfig::new`], the builder
/// and deserialization all run the same checks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRetryConfig", into = "RawRetryConfig")]
pub struct RetryConfig {
    tries: u32,
    delay: Duration,
    backoff: f64,
    max_delay: Duration,
}

impl RetryConfig {
    /// Validate raw parameters. `tries` is floored before it is checked;
    /// `delay` and `max_delay` are in seconds.
    pub fn new(tries: f64, delay: f64, backoff: f64, max_delay: f64) -> Result<Self, ConfigError> {
        let floored = tries.floor();
        if !(floored >= 1.0) || floored > u32::MAX as f64 {
            return Err(ConfigError::InvalidTries(tries));
        }

        check_finite("delay", delay)?;
        if delay < 0.0 {
            return Err(ConfigError::InvalidDelay(delay));
        }

        check_finite("backoff", backoff)?;
        if backoff < 1.0 {
            return Err(ConfigError::InvalidBackoff(backoff));
        }

        check_finite("max_delay", max_delay)?;
        if max_delay < delay {
            return Err(ConfigError::InvalidMaxDelay { delay, max_delay });
        }

        Self::validate(
            floored as u32,
            to_duration("delay", delay)?,
            backoff,
            to_duration("max_delay", max_delay)?,
        )
    }

    // Durations are compared as-is, so `Duration::MAX` and nanosecond
    // precision survive the builder.
    fn validate(
        tries: u32,
        delay: Duration,
        backoff: f64,
        max_delay: Duration,
    ) -> Result<Self, ConfigError> {
        if tries < 1 {
            return Err(ConfigError::InvalidTries(f64::from(tries)));
        }
        check_finite("backoff", backoff)?;
        if backoff < 1.0 {
            return Err(ConfigError::InvalidBackoff(backoff));
        }
        if max_delay < delay {
            return Err(ConfigError::InvalidMaxDelay {
                delay: delay.as_secs_f64(),
                max_delay: max_delay.as_secs_f64(),
            });
        }

        Ok(Self {
            tries,
            delay,
            backoff,
            max_delay,
        })
    }

    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::default()
    }

    pub fn tries(&self) -> u32 {
        self.tries
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn backoff(&self) -> f64 {
        self.backoff
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Waits one invocation sleeps through if every attempt but the last fails.
    pub fn schedule(&self) -> BackoffSchedule {
        BackoffSchedule::new(self)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            tries: DEFAULT_TRIES,
            delay: Duration::from_secs_f64(DEFAULT_DELAY_SECS),
            backoff: DEFAULT_BACKOFF,
            max_delay: Duration::from_secs_f64(DEFAULT_MAX_DELAY_SECS),
        }
    }
}

fn check_finite(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotFinite { field, value })
    }
}

fn to_duration(field: &'static str, secs: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::OutOfRange { field, value: secs })
}

/// Typed builder over the defaults.
#[derive(Debug, Clone)]
pub struct RetryConfigBuilder {
    tries: u32,
    delay: Duration,
    backoff: f64,
    max_delay: Duration,
}

impl Default for RetryConfigBuilder {
    fn default() -> Self {
        let defaults = RetryConfig::default();
        Self {
            tries: defaults.tries,
            delay: defaults.delay,
            backoff: defaults.backoff,
            max_delay: defaults.max_delay,
        }
    }
}

impl RetryConfigBuilder {
    pub fn tries(mut self, tries: u32) -> Self {
        self.tries = tries;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn backoff(mut self, backoff: f64) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn build(self) -> Result<RetryConfig, ConfigError> {
        RetryConfig::validate(self.tries, self.delay, self.backoff, self.max_delay)
    }
}

// Wire shape: plain numbers in seconds, every field optional.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
struct RawRetryConfig {
    tries: f64,
    delay: f64,
    backoff: f64,
    max_delay: f64,
}

impl Default for RawRetryConfig {
    fn default() -> Self {
        Self {
            tries: f64::from(DEFAULT_TRIES),
            delay: DEFAULT_DELAY_SECS,
            backoff: DEFAULT_BACKOFF,
            max_delay: DEFAULT_MAX_DELAY_SECS,
        }
    }
}

impl TryFrom<RawRetryConfig> for RetryConfig {
    type Error = ConfigError;

    fn try_from(raw: RawRetryConfig) -> Result<Self, Self::Error> {
        RetryConfig::new(raw.tries, raw.delay, raw.backoff, raw.max_delay)
    }
}

impl From<RetryConfig> for RawRetryConfig {
    fn from(config: RetryConfig) -> Self {
        Self {
            tries: f64::from(config.tries),
            delay: config.delay.as_secs_f64(),
            backoff: config.backoff,
            max_delay: config.max_delay.as_secs_f64(),
        }
    }
}
