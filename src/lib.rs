// src/lib.rs
// Retry Common Library - bounded retry with exponential backoff for fallible operations

pub mod backoff;
pub mod config;
pub mod error;
pub mod logging;
pub mod retry;
pub mod sleep;

// Re-export commonly used items
pub use backoff::BackoffSchedule;
pub use config::{RetryConfig, RetryConfigBuilder};
pub use error::ConfigError;
pub use logging::{generate_call_id, init_console_logging, init_logging};
pub use retry::{retry_with_backoff, retry_with_backoff_async, wrap, RetryPolicy};
pub use sleep::{RecordingSleeper, Sleeper, ThreadSleeper};

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_library_imports() {
        // Test that all modules are accessible
        let config = RetryConfig::default();
        let _ = RetryPolicy::<ConfigError>::new(config).with_sleeper(RecordingSleeper::new());
        let _ = ThreadSleeper;
        let _ = generate_call_id();
        assert_eq!(config.schedule().count(), 5);
    }

    #[test]
    fn test_wrap_from_crate_root() {
        let sleeper = RecordingSleeper::new();
        let policy = RetryPolicy::new(
            RetryConfig::builder()
                .tries(3)
                .delay(Duration::from_secs(1))
                .build()
                .unwrap(),
        )
        .with_sleeper(sleeper.clone());

        let parse = policy.wrap(|input: &str| input.parse::<u32>().map_err(|e| e.to_string()));

        assert_eq!(parse("17"), Ok(17));
        assert!(parse("seventeen").is_err());
        assert_eq!(
            sleeper.waits(),
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
    }
}
