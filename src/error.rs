//! Error types for the usage telemetry client.

use thiserror::Error;

/// Errors surfaced by configuration, record building, and delivery.
///
/// Configuration and building errors are returned synchronously to the caller.
/// `Delivery` is only ever carried inside a
/// [`DeliveryOutcome`](crate::telemetry::DeliveryOutcome); it is never returned
/// from `send_request`.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Endpoint for '{service}' not found in {known:?}")]
    UnknownService { service: String, known: Vec<String> },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Suppressed field '{field}' not present in record for service '{service}'")]
    FieldNotFound { service: String, field: String },

    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl From<config::ConfigError> for TelemetryError {
    fn from(err: config::ConfigError) -> Self {
        TelemetryError::ConfigError(err.to_string())
    }
}

impl TelemetryError {
    /// True for errors caused by caller input rather than the environment.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            TelemetryError::UnknownService { .. }
                | TelemetryError::InvalidArgument(_)
                | TelemetryError::FieldNotFound { .. }
        )
    }
}
