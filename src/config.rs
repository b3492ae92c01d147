//! Configuration System
//!
//! Static per-service endpoint table plus delivery, record, and logging settings.
//! Layered with the `config` crate: merge-policy defaults, the packaged service
//! table, an optional user file, an optional explicit file, then environment
//! variables prefixed with `USAGE_TELEMETRY__`.

use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Production collection server.
pub const DEFAULT_SERVER_URL: &str = "https://tracking-services-d6c2fd311c12.herokuapp.com";

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TelemetryConfig {
    /// Base URL that endpoint paths are appended to
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Known services, keyed by service name
    #[serde(default)]
    pub services: BTreeMap<String, ServiceConfig>,

    #[serde(default)]
    pub delivery: DeliveryConfig,

    #[serde(default)]
    pub record: RecordConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// One entry of the static service table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Path suffix appended to `server_url`, e.g. `/payu/update`
    pub endpoint: String,

    /// Function names registered for this service at startup
    #[serde(default)]
    pub functions: Vec<String>,
}

/// Delivery timeouts, all in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeliveryConfig {
    /// How long a synchronous caller waits for a send before moving on
    #[serde(default = "default_wait_timeout_ms")]
    pub wait_timeout_ms: u64,

    /// Whole-request timeout for the HTTP client
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

fn default_wait_timeout_ms() -> u64 {
    100
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_connect_timeout_ms() -> u64 {
    2_000
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            wait_timeout_ms: default_wait_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl DeliveryConfig {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// What to do when a suppressed field is absent from a built record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingFieldPolicy {
    /// Fail the build with `FieldNotFound`
    #[default]
    Error,
    /// Skip the field silently
    Ignore,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordConfig {
    #[serde(default)]
    pub missing_suppressed_field: MissingFieldPolicy,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            services: BTreeMap::new(),
            delivery: DeliveryConfig::default(),
            record: RecordConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Service(String, String),
    Delivery(String),
    Server(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Service(name, msg) => write!(f, "Service '{}': {}", name, msg),
            ValidationError::Delivery(msg) => write!(f, "Delivery: {}", msg),
            ValidationError::Server(msg) => write!(f, "Server: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl ServiceConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.endpoint.starts_with('/') {
            return Err(format!(
                "endpoint '{}' must start with '/'",
                self.endpoint
            ));
        }
        if self.functions.iter().any(|f| f.trim().is_empty()) {
            return Err("function names cannot be empty".to_string());
        }
        Ok(())
    }
}

impl TelemetryConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if !(self.server_url.starts_with("http://") || self.server_url.starts_with("https://")) {
            errors.push(ValidationError::Server(format!(
                "server_url '{}' must be an http(s) URL",
                self.server_url
            )));
        }

        for (name, service) in &self.services {
            if let Err(e) = service.validate() {
                errors.push(ValidationError::Service(name.clone(), e));
            }
        }

        if self.delivery.wait_timeout_ms == 0 {
            errors.push(ValidationError::Delivery(
                "wait_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.delivery.request_timeout_ms == 0 {
            errors.push(ValidationError::Delivery(
                "request_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.delivery.connect_timeout_ms == 0 {
            errors.push(ValidationError::Delivery(
                "connect_timeout_ms must be greater than zero".to_string(),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Endpoint table derived from the service entries
    pub fn endpoints(&self) -> BTreeMap<String, String> {
        self.services
            .iter()
            .map(|(name, service)| (name.clone(), service.endpoint.clone()))
            .collect()
    }

    /// Builder-style helper for tests and embedding hosts
    pub fn with_service(mut self, name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        self.services.insert(
            name.into(),
            ServiceConfig {
                endpoint: endpoint.into(),
                functions: Vec::new(),
            },
        );
        self
    }
}
