//! Service registry: named, shared sets of instrumented function names.

use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::config::TelemetryConfig;
use crate::error::TelemetryError;

/// Handle to one service's function set. Every handle obtained for the same
/// service name shares the same set.
#[derive(Debug, Clone)]
pub struct RegistryHandle {
    service: Arc<str>,
    names: Arc<RwLock<BTreeSet<String>>>,
}

impl RegistryHandle {
    fn new(service: &str) -> Self {
        Self {
            service: Arc::from(service),
            names: Arc::new(RwLock::new(BTreeSet::new())),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Add a function name. Returns false if it was already registered.
    pub fn register(&self, name: &str) -> Result<bool, TelemetryError> {
        validate_name(name)?;
        Ok(self.names.write().insert(name.to_string()))
    }

    /// Remove every given name; unknown names are ignored. Returns how many
    /// were removed.
    pub fn deregister<I, S>(&self, names: I) -> Result<usize, TelemetryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<S> = names.into_iter().collect();
        for name in &names {
            validate_name(name.as_ref())?;
        }
        let mut set = self.names.write();
        Ok(names.iter().filter(|n| set.remove(n.as_ref())).count())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.read().contains(name)
    }

    /// Snapshot of the registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.names.read().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.names.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.read().is_empty()
    }
}

fn validate_name(name: &str) -> Result<(), TelemetryError> {
    if name.trim().is_empty() {
        return Err(TelemetryError::InvalidArgument(
            "function name cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Registry of per-service function sets, keyed by service name.
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    entries: RwLock<HashMap<String, RegistryHandle>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed one set per configured service with its `functions` list.
    pub fn from_config(config: &TelemetryConfig) -> Result<Self, TelemetryError> {
        let registry = Self::new();
        for (service, service_config) in &config.services {
            let handle = registry.lookup(service);
            for function in &service_config.functions {
                handle.register(function)?;
            }
        }
        Ok(registry)
    }

    /// Handle for `service`, creating an empty set on first lookup.
    pub fn lookup(&self, service: &str) -> RegistryHandle {
        if let Some(handle) = self.entries.read().get(service) {
            return handle.clone();
        }
        self.entries
            .write()
            .entry(service.to_string())
            .or_insert_with(|| RegistryHandle::new(service))
            .clone()
    }

    /// Service names with a set, sorted.
    pub fn services(&self) -> Vec<String> {
        let mut services: Vec<String> = self.entries.read().keys().cloned().collect();
        services.sort();
        services
    }
}
