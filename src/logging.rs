// src/logging.rs
// Subscriber setup for hosts and per-call correlation IDs

use tracing::info;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter,
};
use uuid::Uuid;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install structured JSON logging for a service.
///
/// The library itself never calls this; retry records go to whatever
/// subscriber the host has installed. Fails if one is already set.
pub fn init_logging(service_name: &str) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_span_events(FmtSpan::CLOSE)
                .with_current_span(true),
        )
        .try_init()?;

    info!(service = service_name, "Logging initialized");
    Ok(())
}

/// Install human-readable console logging (for development)
pub fn init_console_logging(service_name: &str) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().pretty().with_target(true))
        .try_init()?;

    info!(service = service_name, "Console logging initialized");
    Ok(())
}

/// Correlation ID attached to the span of one retried invocation.
pub fn generate_call_id() -> String {
    Uuid::new_v4().to_string()
}
