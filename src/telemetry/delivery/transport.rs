//! Transport abstraction for posting a record. The default implementation is
//! a `reqwest` client; tests swap in recording or failing transports.

use async_trait::async_trait;
use reqwest::Client;

use crate::config::DeliveryConfig;
use crate::error::TelemetryError;
use crate::telemetry::record::Record;

/// Posts one JSON record to a URL.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Make exactly one attempt. `Ok` carries a 2xx status; transport errors
    /// and non-2xx statuses are `Err(TelemetryError::Delivery)`.
    async fn post_json(&self, url: &str, record: &Record) -> Result<u16, TelemetryError>;
}

// Helper function to map HTTP errors to TelemetryError
fn map_http_error(error: reqwest::Error) -> TelemetryError {
    if let Some(status) = error.status() {
        TelemetryError::Delivery(format!("Request failed with status {}: {}", status, error))
    } else if error.is_timeout() {
        TelemetryError::Delivery(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        TelemetryError::Delivery(format!("Connection error: {}", error))
    } else {
        TelemetryError::Delivery(format!("HTTP error: {}", error))
    }
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &DeliveryConfig) -> Result<Self, TelemetryError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| TelemetryError::Runtime(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(&self, url: &str, record: &Record) -> Result<u16, TelemetryError> {
        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(record)
            .send()
            .await
            .map_err(map_http_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TelemetryError::Delivery(format!(
                "Collector returned status {}",
                status
            )));
        }
        Ok(status.as_u16())
    }
}
