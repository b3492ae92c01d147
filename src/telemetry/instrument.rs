//! Instrumentation: wrap host calls so each one emits a usage record.
//!
//! Configuration happens once, when the wrapper is built; the send happens on
//! every call. The wrapped function's own result is always returned.

use serde_json::{Map, Value};
use std::future::Future;
use std::sync::Arc;
use tracing::{error, warn};

use crate::error::TelemetryError;
use crate::telemetry::delivery::DeliveryOutcome;
use crate::telemetry::handler::{FieldList, TelemetryHandler};
use crate::telemetry::registry::ServiceRegistry;

/// Builder returned by [`Telemetry::instrument`](crate::telemetry::Telemetry::instrument).
pub struct InstrumentBuilder {
    handler: Arc<TelemetryHandler>,
    registry: Arc<ServiceRegistry>,
    service: String,
    function: String,
    extra_fields: Option<Value>,
    suppress_fields: Option<FieldList>,
}

impl InstrumentBuilder {
    pub(crate) fn new(
        handler: Arc<TelemetryHandler>,
        registry: Arc<ServiceRegistry>,
        service: impl Into<String>,
        function: impl Into<String>,
    ) -> Self {
        Self {
            handler,
            registry,
            service: service.into(),
            function: function.into(),
            extra_fields: None,
            suppress_fields: None,
        }
    }

    /// Overlay to install for the service (replaces any existing overlay).
    pub fn extra_fields(mut self, fields: Value) -> Self {
        self.extra_fields = Some(fields);
        self
    }

    /// Suppression list to install for the service (replaces any existing list).
    pub fn suppress_fields(mut self, fields: impl Into<FieldList>) -> Self {
        self.suppress_fields = Some(fields.into());
        self
    }

    /// Apply configuration, register the function, and return a call wrapper.
    pub fn track(self) -> Result<Tracked, TelemetryError> {
        self.apply()?;
        Ok(Tracked {
            handler: self.handler,
            service: self.service,
            function: self.function,
        })
    }

    /// Apply configuration and register the function without wrapping calls.
    /// For hosts that report usage through some other hook.
    pub fn register_only(self) -> Result<(), TelemetryError> {
        self.apply()
    }

    fn apply(&self) -> Result<(), TelemetryError> {
        // Fail fast on unknown services even when no overlay is given.
        self.handler.endpoint_url(&self.service)?;
        if let Some(fields) = &self.extra_fields {
            self.handler
                .configure_extra_fields(&self.service, fields.clone())?;
        }
        if let Some(fields) = &self.suppress_fields {
            self.handler
                .configure_suppressed_fields(&self.service, fields.clone())?;
        }
        self.registry.lookup(&self.service).register(&self.function)?;
        Ok(())
    }
}

/// An instrumented function: reports each call, then runs it.
#[derive(Clone)]
pub struct Tracked {
    handler: Arc<TelemetryHandler>,
    service: String,
    function: String,
}

impl std::fmt::Debug for Tracked {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracked")
            .field("service", &self.service)
            .field("function", &self.function)
            .finish_non_exhaustive()
    }
}

impl Tracked {
    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    /// Report the call, then run `f` and return its result.
    ///
    /// Telemetry problems of any kind are logged and never reach the caller.
    pub fn call<R>(&self, args: Vec<Value>, kwargs: Map<String, Value>, f: impl FnOnce() -> R) -> R {
        match self
            .handler
            .send_request(&self.service, &self.function, &args, &kwargs)
        {
            Ok(DeliveryOutcome::Failed(reason)) => {
                warn!(service = %self.service, function = %self.function, reason = %reason, "usage not recorded");
            }
            Ok(_) => {}
            Err(err) => report_build_error(&self.service, &self.function, &err),
        }
        f()
    }

    /// Async variant: the send is detached so the caller's future is never
    /// delayed by telemetry.
    pub async fn call_async<R, Fut>(
        &self,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
        f: impl FnOnce() -> Fut,
    ) -> R
    where
        Fut: Future<Output = R>,
    {
        match self
            .handler
            .dispatch(&self.service, &self.function, &args, &kwargs)
        {
            Ok(handle) => {
                handle.detach();
            }
            Err(err) => report_build_error(&self.service, &self.function, &err),
        }
        f().await
    }
}

/// Misconfiguration by the host is an error; anything else is a warning.
fn report_build_error(service: &str, function: &str, err: &TelemetryError) {
    if err.is_caller_error() {
        error!(service = %service, function = %function, error = %err, "usage not recorded: telemetry misconfigured");
    } else {
        warn!(service = %service, function = %function, error = %err, "usage not recorded");
    }
}
