// src/retry.rs
// Bounded retry with exponential backoff

use crate::config::RetryConfig;
use crate::error::ConfigError;
use crate::logging::generate_call_id;
use crate::sleep::{Sleeper, ThreadSleeper};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info_span, Instrument, Span};

type RetryPredicate<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// Runs fallible operations under a validated [`RetryConfig`].
///
/// For `tries = N` the operation is invoked at most `N` times. Every failure
/// but the last is logged at `ERROR` and followed by a wait from
/// [`RetryConfig::schedule`]; the last attempt's result is returned as-is, so
/// the caller only ever sees the final error.
///
/// Policies hold no per-call state. One policy (or one wrapped function) can
/// be shared between threads and invoked concurrently.
///
/// `E` may borrow: without a predicate every error is retried and nothing
/// about `E` is stored.
pub struct RetryPolicy<E> {
    config: RetryConfig,
    sleeper: Arc<dyn Sleeper>,
    should_retry: Option<RetryPredicate<E>>,
    label: Option<Arc<str>>,
}

impl<E> RetryPolicy<E> {
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config,
            sleeper: Arc::new(ThreadSleeper),
            should_retry: None,
            label: None,
        }
    }

    /// Validate raw parameters and build a policy in one step.
    pub fn from_parts(
        tries: f64,
        delay: f64,
        backoff: f64,
        max_delay: f64,
    ) -> Result<Self, ConfigError> {
        RetryConfig::new(tries, delay, backoff, max_delay).map(Self::new)
    }

    /// Replace the thread sleeper, e.g. with a [`RecordingSleeper`](crate::RecordingSleeper).
    pub fn with_sleeper<S>(mut self, sleeper: S) -> Self
    where
        S: Sleeper + 'static,
    {
        self.sleeper = Arc::new(sleeper);
        self
    }

    /// Only retry errors for which `predicate` returns true.
    ///
    /// Any other error is returned right away, without waiting.
    pub fn retry_if<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        let predicate: RetryPredicate<E> = Arc::new(predicate);
        self.should_retry = Some(predicate);
        self
    }

    fn is_retryable(&self, err: &E) -> bool {
        self.should_retry
            .as_ref()
            .map_or(true, |predicate| predicate(err))
    }

    /// Name the operation in log records.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(Arc::from(label.into()));
        self
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Invoke `operation` until it succeeds or the attempts run out,
    /// blocking the calling thread between attempts.
    pub fn run<T, F>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
        E: fmt::Display,
    {
        let span = self.call_span();
        let _enter = span.enter();

        for (attempt, wait) in (1u32..).zip(self.config.schedule()) {
            match operation() {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if !self.is_retryable(&err) {
                        self.log_not_retryable(attempt, &err);
                        return Err(err);
                    }
                    self.log_retry(attempt, &err, wait);
                    self.sleeper.sleep(wait);
                }
            }
        }

        operation()
    }

    /// Same contract as [`run`](Self::run), but the wait suspends the task on
    /// the tokio timer instead of blocking the thread.
    pub async fn run_async<T, F, Fut>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let span = self.call_span();

        async move {
            for (attempt, wait) in (1u32..).zip(self.config.schedule()) {
                match operation().await {
                    Ok(value) => return Ok(value),
                    Err(err) => {
                        if !self.is_retryable(&err) {
                            self.log_not_retryable(attempt, &err);
                            return Err(err);
                        }
                        self.log_retry(attempt, &err, wait);
                        tokio::time::sleep(wait).await;
                    }
                }
            }

            operation().await
        }
        .instrument(span)
        .await
    }

    /// Turn `operation` into a function with the same argument and result
    /// types that retries under this policy.
    ///
    /// Operations with several arguments take them as a tuple. The argument
    /// is cloned for every attempt.
    pub fn wrap<A, T, F>(&self, operation: F) -> impl Fn(A) -> Result<T, E>
    where
        F: Fn(A) -> Result<T, E>,
        A: Clone,
        E: fmt::Display,
    {
        let policy = self.clone();
        move |args: A| policy.run(|| operation(args.clone()))
    }

    /// Like [`wrap`](Self::wrap) for operations that need `&mut` state.
    pub fn wrap_mut<A, T, F>(&self, mut operation: F) -> impl FnMut(A) -> Result<T, E>
    where
        F: FnMut(A) -> Result<T, E>,
        A: Clone,
        E: fmt::Display,
    {
        let policy = self.clone();
        move |args: A| policy.run(|| operation(args.clone()))
    }

    fn call_span(&self) -> Span {
        info_span!(
            "retry",
            call_id = %generate_call_id(),
            label = self.label().unwrap_or("operation"),
            tries = self.config.tries()
        )
    }

    fn log_retry(&self, attempt: u32, err: &E, wait: Duration)
    where
        E: fmt::Display,
    {
        let wait_secs = wait.as_secs_f64();
        error!(
            label = self.label().unwrap_or("operation"),
            attempt = attempt,
            tries = self.config.tries(),
            error = %err,
            wait_secs = wait_secs,
            "{}: Retrying in {} seconds...",
            err,
            wait_secs
        );
    }

    fn log_not_retryable(&self, attempt: u32, err: &E)
    where
        E: fmt::Display,
    {
        debug!(
            label = self.label().unwrap_or("operation"),
            attempt = attempt,
            error = %err,
            "{}: not retryable",
            err
        );
    }
}

impl<E> Default for RetryPolicy<E> {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

impl<E> Clone for RetryPolicy<E> {
    fn clone(&self) -> Self {
        Self {
            config: self.config,
            sleeper: Arc::clone(&self.sleeper),
            should_retry: self.should_retry.clone(),
            label: self.label.clone(),
        }
    }
}

impl<E> fmt::Debug for RetryPolicy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("config", &self.config)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Validate the parameters and wrap `operation` in one step.
///
/// Misconfiguration is reported here, before the returned function is ever
/// called.
pub fn wrap<A, T, E, F>(
    operation: F,
    tries: f64,
    delay: f64,
    backoff: f64,
    max_delay: f64,
) -> Result<impl Fn(A) -> Result<T, E>, ConfigError>
where
    F: Fn(A) -> Result<T, E>,
    A: Clone,
    E: fmt::Display,
{
    let policy = RetryPolicy::from_parts(tries, delay, backoff, max_delay)?;
    Ok(policy.wrap(operation))
}

/// Run `operation` once under `config`, blocking between attempts.
pub fn retry_with_backoff<F, T, E>(operation: F, config: &RetryConfig) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    E: fmt::Display,
{
    RetryPolicy::new(*config).run(operation)
}

/// Async counterpart of [`retry_with_backoff`].
pub async fn retry_with_backoff_async<F, Fut, T, E>(
    operation: F,
    config: &RetryConfig,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    RetryPolicy::new(*config).run_async(operation).await
}
