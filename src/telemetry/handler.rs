//! Telemetry handler: per-service configuration, record building, dispatch.
//!
//! One handler is built per [`Telemetry`](crate::telemetry::Telemetry) context
//! and shared through `Arc`; every mutation is visible to every holder.

use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::{MissingFieldPolicy, TelemetryConfig};
use crate::error::TelemetryError;
use crate::telemetry::delivery::{
    DeliveryBridge, DeliveryHandle, DeliveryOutcome, HttpTransport, Transport,
};
use crate::telemetry::record::{assemble_record, CallInfo, Record};
use crate::telemetry::session::{current_user, SessionIdentity};

/// Field names to strip, given as one name or a list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldList(Vec<String>);

impl FieldList {
    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl From<&str> for FieldList {
    fn from(field: &str) -> Self {
        Self(vec![field.to_string()])
    }
}

impl From<String> for FieldList {
    fn from(field: String) -> Self {
        Self(vec![field])
    }
}

impl From<Vec<String>> for FieldList {
    fn from(fields: Vec<String>) -> Self {
        Self(fields)
    }
}

impl From<Vec<&str>> for FieldList {
    fn from(fields: Vec<&str>) -> Self {
        Self(fields.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for FieldList {
    fn from(fields: &[&str]) -> Self {
        Self(fields.iter().map(|f| f.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for FieldList {
    fn from(fields: [&str; N]) -> Self {
        Self(fields.iter().map(|f| f.to_string()).collect())
    }
}

#[derive(Debug)]
struct HandlerState {
    server_url: String,
    extra_fields: BTreeMap<String, Map<String, Value>>,
    suppressed_fields: BTreeMap<String, Vec<String>>,
    last_record: Option<Record>,
}

pub struct TelemetryHandler {
    endpoints: BTreeMap<String, String>,
    state: RwLock<HandlerState>,
    session: Arc<SessionIdentity>,
    user: String,
    policy: MissingFieldPolicy,
    wait_timeout: Duration,
    bridge: DeliveryBridge,
}

impl TelemetryHandler {
    /// Handler posting over HTTP, using the process-wide session identity.
    pub fn new(config: &TelemetryConfig) -> Result<Self, TelemetryError> {
        let transport = Arc::new(HttpTransport::new(&config.delivery)?);
        Ok(Self::with_transport(config, SessionIdentity::global(), transport))
    }

    /// Handler with an explicit session identity and transport.
    pub fn with_transport(
        config: &TelemetryConfig,
        session: Arc<SessionIdentity>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let endpoints = config.endpoints();
        let extra_fields = endpoints
            .keys()
            .map(|service| (service.clone(), Map::new()))
            .collect();
        Self {
            endpoints,
            state: RwLock::new(HandlerState {
                server_url: config.server_url.clone(),
                extra_fields,
                suppressed_fields: BTreeMap::new(),
                last_record: None,
            }),
            session,
            user: current_user(),
            policy: config.record.missing_suppressed_field,
            wait_timeout: config.delivery.wait_timeout(),
            bridge: DeliveryBridge::new(transport),
        }
    }

    pub fn server_url(&self) -> String {
        self.state.read().server_url.clone()
    }

    pub fn set_server_url(&self, url: impl Into<String>) {
        self.state.write().server_url = url.into();
    }

    pub fn endpoints(&self) -> &BTreeMap<String, String> {
        &self.endpoints
    }

    /// Known service names, sorted.
    pub fn services(&self) -> Vec<String> {
        self.endpoints.keys().cloned().collect()
    }

    pub fn session_id(&self) -> &str {
        self.session.value()
    }

    pub fn wait_timeout(&self) -> Duration {
        self.wait_timeout
    }

    /// Snapshot of every service's overlay.
    pub fn extra_fields(&self) -> BTreeMap<String, Map<String, Value>> {
        self.state.read().extra_fields.clone()
    }

    /// Snapshot of every service's suppression list.
    pub fn suppressed_fields(&self) -> BTreeMap<String, Vec<String>> {
        self.state.read().suppressed_fields.clone()
    }

    /// The most recently built record, if any.
    pub fn last_record(&self) -> Option<Record> {
        self.state.read().last_record.clone()
    }

    /// Full URL for `service`.
    pub fn endpoint_url(&self, service: &str) -> Result<String, TelemetryError> {
        let endpoint = self.endpoint(service)?;
        Ok(format!("{}{}", self.state.read().server_url, endpoint))
    }

    fn endpoint(&self, service: &str) -> Result<&str, TelemetryError> {
        self.endpoints
            .get(service)
            .map(String::as_str)
            .ok_or_else(|| TelemetryError::UnknownService {
                service: service.to_string(),
                known: self.services(),
            })
    }

    /// Replace the overlay merged into every record for `service`.
    ///
    /// `fields` must be a JSON object. Unknown services are rejected.
    pub fn configure_extra_fields(&self, service: &str, fields: Value) -> Result<(), TelemetryError> {
        self.endpoint(service)?;
        let fields = match fields {
            Value::Object(map) => map,
            other => {
                return Err(TelemetryError::InvalidArgument(format!(
                    "extra fields for '{}' must be a string-keyed mapping, got {}",
                    service,
                    json_kind(&other)
                )))
            }
        };
        debug!(service = %service, count = fields.len(), "configured extra fields");
        self.state
            .write()
            .extra_fields
            .insert(service.to_string(), fields);
        Ok(())
    }

    /// Replace the suppression list for `service`. The service does not need
    /// an endpoint yet.
    pub fn configure_suppressed_fields(
        &self,
        service: &str,
        fields: impl Into<FieldList>,
    ) -> Result<(), TelemetryError> {
        let fields = fields.into().into_vec();
        if fields.iter().any(|f| f.is_empty()) {
            return Err(TelemetryError::InvalidArgument(
                "suppressed field names cannot be empty".to_string(),
            ));
        }
        debug!(service = %service, fields = ?fields, "configured suppressed fields");
        self.state
            .write()
            .suppressed_fields
            .insert(service.to_string(), fields);
        Ok(())
    }

    /// Build the record for one call and remember it as the last record.
    pub fn build_record(
        &self,
        service: &str,
        function: &str,
        args: &[Value],
        kwargs: &Map<String, Value>,
    ) -> Result<Record, TelemetryError> {
        let call = CallInfo {
            user: &self.user,
            session_id: self.session.value(),
            function,
            args,
            kwargs,
        };
        // Assemble and store under one guard so `last_record` follows build order.
        let mut state = self.state.write();
        let suppressed = state
            .suppressed_fields
            .get(service)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let record = assemble_record(
            service,
            call,
            state.extra_fields.get(service),
            suppressed,
            self.policy,
        )?;
        state.last_record = Some(record.clone());
        Ok(record)
    }

    /// Build, resolve, and submit a record; return the pending delivery.
    ///
    /// Fails only for unknown services or record errors, before anything is
    /// built or sent.
    pub fn dispatch(
        &self,
        service: &str,
        function: &str,
        args: &[Value],
        kwargs: &Map<String, Value>,
    ) -> Result<DeliveryHandle, TelemetryError> {
        let url = self.endpoint_url(service)?;
        let record = self.build_record(service, function, args, kwargs)?;
        debug!(service = %service, function = %function, url = %url, "dispatching telemetry");
        Ok(self.bridge.submit(url, record))
    }

    /// Send telemetry for one call without ever surfacing a network error.
    ///
    /// Outside an async runtime this waits at most `wait_timeout`; inside one
    /// it returns immediately with [`DeliveryOutcome::Detached`].
    pub fn send_request(
        &self,
        service: &str,
        function: &str,
        args: &[Value],
        kwargs: &Map<String, Value>,
    ) -> Result<DeliveryOutcome, TelemetryError> {
        let handle = self.dispatch(service, function, args, kwargs)?;
        Ok(handle.settle(self.wait_timeout))
    }

    /// Async counterpart of [`send_request`](Self::send_request) that waits up
    /// to `wait_timeout` without blocking the runtime.
    pub async fn send_request_async(
        &self,
        service: &str,
        function: &str,
        args: &[Value],
        kwargs: &Map<String, Value>,
    ) -> Result<DeliveryOutcome, TelemetryError> {
        let handle = self.dispatch(service, function, args, kwargs)?;
        Ok(handle.wait(self.wait_timeout).await)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
