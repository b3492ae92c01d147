//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::TelemetryError;

/// Map domain errors to a string for CLI output.
pub fn map_error(e: &TelemetryError) -> String {
    match e {
        TelemetryError::UnknownService { service, known } => format!(
            "Unknown service '{}'. Known services: {}",
            service,
            known.join(", ")
        ),
        other => other.to_string(),
    }
}
