//! Usage Telemetry: best-effort function usage reporting
//!
//! Builds one JSON record per instrumented call (user, session, function,
//! arguments, plus per-service extra fields) and posts it to the collection
//! endpoint of its service. Delivery runs on a Tokio task and never blocks or
//! fails the host call.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod telemetry;

pub use config::{ConfigLoader, TelemetryConfig};
pub use error::TelemetryError;
pub use telemetry::{DeliveryOutcome, SessionIdentity, Telemetry, TelemetryHandler};
