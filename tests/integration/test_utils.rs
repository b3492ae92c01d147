//! Shared test utilities for integration tests
//!
//! Environment-variable isolation plus a recording transport and a handler
//! builder used across modules.

use async_trait::async_trait;
use parking_lot::Mutex as RecordLock;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use usage_telemetry::config::TelemetryConfig;
use usage_telemetry::telemetry::{Record, SessionIdentity, TelemetryHandler, Transport};
use usage_telemetry::TelemetryError;

/// Serializes environment mutation across all tests in this binary.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const ISOLATED_VARS: &[&str] = &[
    "HOME",
    "XDG_CONFIG_HOME",
    "USAGE_TELEMETRY__SERVER_URL",
    "USAGE_TELEMETRY__DELIVERY__WAIT_TIMEOUT_MS",
    "USAGE_TELEMETRY__RECORD__MISSING_SUPPRESSED_FIELD",
];

/// Run `f` with HOME and XDG_CONFIG_HOME pointed into `test_dir`, the
/// telemetry env overrides cleared, and `vars` set. Everything is restored
/// afterwards.
pub fn with_isolated_env<F, R>(test_dir: &TempDir, vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let saved: Vec<(&str, Option<String>)> = ISOLATED_VARS
        .iter()
        .chain(vars.iter().map(|(key, _)| key))
        .map(|key| (*key, std::env::var(key).ok()))
        .collect();

    for key in ISOLATED_VARS {
        std::env::remove_var(key);
    }
    let home = test_dir.path().join("home");
    std::fs::create_dir_all(&home).unwrap();
    std::env::set_var("HOME", &home);
    std::env::set_var("XDG_CONFIG_HOME", test_dir.path());
    for (key, value) in vars {
        std::env::set_var(key, value);
    }

    let result = f();

    for (key, value) in saved {
        match value {
            Some(value) => std::env::set_var(key, value),
            None => std::env::remove_var(key),
        }
    }
    result
}

/// Transport that remembers every posted record and answers with `status`.
pub struct RecordingTransport {
    pub posted: RecordLock<Vec<(String, Record)>>,
    status: u16,
}

impl RecordingTransport {
    pub fn new(status: u16) -> Arc<Self> {
        Arc::new(Self {
            posted: RecordLock::new(Vec::new()),
            status,
        })
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn post_json(&self, url: &str, record: &Record) -> Result<u16, TelemetryError> {
        self.posted.lock().push((url.to_string(), record.clone()));
        if (200..300).contains(&self.status) {
            Ok(self.status)
        } else {
            Err(TelemetryError::Delivery(format!(
                "Collector returned status {}",
                self.status
            )))
        }
    }
}

/// Config with only the payu service, pointed at a local collector.
pub fn payu_config() -> TelemetryConfig {
    let mut config = TelemetryConfig::default().with_service("payu", "/payu/update");
    config.server_url = "http://collector.test".to_string();
    config.delivery.wait_timeout_ms = 5_000;
    config
}

pub fn recording_handler(config: &TelemetryConfig) -> (TelemetryHandler, Arc<RecordingTransport>) {
    let transport = RecordingTransport::new(200);
    let handler = TelemetryHandler::with_transport(
        config,
        Arc::new(SessionIdentity::new()),
        transport.clone(),
    );
    (handler, transport)
}
