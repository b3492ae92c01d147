//! Telemetry context: the single construction point for a handler and its
//! registry. Clone it (cheap) and pass it to every call site.

use std::sync::Arc;

use crate::config::{ConfigLoader, TelemetryConfig};
use crate::error::TelemetryError;
use crate::telemetry::handler::TelemetryHandler;
use crate::telemetry::instrument::InstrumentBuilder;
use crate::telemetry::registry::{RegistryHandle, ServiceRegistry};

#[derive(Clone)]
pub struct Telemetry {
    handler: Arc<TelemetryHandler>,
    registry: Arc<ServiceRegistry>,
}

impl Telemetry {
    /// Build from an already loaded configuration.
    pub fn new(config: &TelemetryConfig) -> Result<Self, TelemetryError> {
        let handler = TelemetryHandler::new(config)?;
        let registry = ServiceRegistry::from_config(config)?;
        Ok(Self::from_parts(handler, registry))
    }

    /// Load configuration from the default sources, then build.
    pub fn load() -> Result<Self, TelemetryError> {
        Self::new(&ConfigLoader::load()?)
    }

    pub fn from_parts(handler: TelemetryHandler, registry: ServiceRegistry) -> Self {
        Self {
            handler: Arc::new(handler),
            registry: Arc::new(registry),
        }
    }

    pub fn handler(&self) -> &Arc<TelemetryHandler> {
        &self.handler
    }

    pub fn registry(&self) -> &Arc<ServiceRegistry> {
        &self.registry
    }

    /// Shortcut for `registry().lookup(service)`.
    pub fn functions(&self, service: &str) -> RegistryHandle {
        self.registry.lookup(service)
    }

    /// Start instrumenting `function` under `service`.
    pub fn instrument(
        &self,
        service: impl Into<String>,
        function: impl Into<String>,
    ) -> InstrumentBuilder {
        InstrumentBuilder::new(
            Arc::clone(&self.handler),
            Arc::clone(&self.registry),
            service,
            function,
        )
    }
}
