//! Delivery bridge: hands a record to a Tokio task and returns at once.
//!
//! The send runs on the caller's runtime when one is active, otherwise on a
//! small background runtime owned by the bridge. The returned
//! [`DeliveryHandle`] lets the caller either detach or wait with a bound.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::error::TelemetryError;
use crate::telemetry::delivery::transport::Transport;
use crate::telemetry::record::Record;

/// Result of one delivery attempt as seen by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Collector answered with a 2xx status.
    Delivered { status: u16 },
    /// Transport error or non-2xx status. Already logged as a warning.
    Failed(String),
    /// The wait bound elapsed first; the send may still complete.
    TimedOut,
    /// The caller did not wait.
    Detached,
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered { .. })
    }
}

/// Lazily started runtime for callers that have none.
#[derive(Default)]
struct BackgroundRuntime {
    runtime: Mutex<Option<Runtime>>,
}

impl BackgroundRuntime {
    fn handle(&self) -> Result<Handle, TelemetryError> {
        let mut guard = self.runtime.lock();
        if let Some(runtime) = guard.as_ref() {
            return Ok(runtime.handle().clone());
        }
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("usage-telemetry-delivery")
            .enable_all()
            .build()
            .map_err(|e| TelemetryError::Runtime(format!("Failed to create runtime: {}", e)))?;
        let handle = runtime.handle().clone();
        *guard = Some(runtime);
        Ok(handle)
    }
}

impl Drop for BackgroundRuntime {
    fn drop(&mut self) {
        // shutdown_background never blocks, so dropping inside an async
        // context is fine. In-flight sends are abandoned.
        if let Some(runtime) = self.runtime.get_mut().take() {
            runtime.shutdown_background();
        }
    }
}

/// Submits records to a [`Transport`] without blocking the caller.
#[derive(Clone)]
pub struct DeliveryBridge {
    transport: Arc<dyn Transport>,
    background: Arc<BackgroundRuntime>,
}

impl DeliveryBridge {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            background: Arc::new(BackgroundRuntime::default()),
        }
    }

    /// Spawn one send of `record` to `url`. Never blocks.
    pub fn submit(&self, url: String, record: Record) -> DeliveryHandle {
        let (tx, rx) = oneshot::channel();
        let handle = DeliveryHandle {
            receiver: rx,
            background: Arc::clone(&self.background),
        };

        let transport = Arc::clone(&self.transport);
        let task = async move {
            let outcome = deliver(transport.as_ref(), &url, &record).await;
            let _ = tx.send(outcome);
        };

        match Handle::try_current() {
            Ok(current) => {
                debug!("submitting telemetry on the caller's runtime");
                current.spawn(task);
            }
            Err(_) => match self.background.handle() {
                Ok(background) => {
                    debug!("submitting telemetry on the background runtime");
                    background.spawn(task);
                }
                Err(err) => {
                    warn!(error = %err, "telemetry delivery could not be scheduled");
                    return DeliveryHandle::settled(
                        DeliveryOutcome::Failed(err.to_string()),
                        Arc::clone(&self.background),
                    );
                }
            },
        }

        handle
    }
}

async fn deliver(transport: &dyn Transport, url: &str, record: &Record) -> DeliveryOutcome {
    debug!(url = %url, fields = record.len(), "posting telemetry record");
    match transport.post_json(url, record).await {
        Ok(status) => {
            debug!(url = %url, status, "telemetry delivered");
            DeliveryOutcome::Delivered { status }
        }
        Err(err) => {
            warn!(url = %url, error = %err, "telemetry delivery failed");
            DeliveryOutcome::Failed(err.to_string())
        }
    }
}

/// Pending delivery. Dropping it detaches the send.
pub struct DeliveryHandle {
    receiver: oneshot::Receiver<DeliveryOutcome>,
    background: Arc<BackgroundRuntime>,
}

impl DeliveryHandle {
    fn settled(outcome: DeliveryOutcome, background: Arc<BackgroundRuntime>) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(outcome);
        Self {
            receiver: rx,
            background,
        }
    }

    /// Fire-and-forget.
    pub fn detach(self) -> DeliveryOutcome {
        DeliveryOutcome::Detached
    }

    /// Wait up to `timeout` from async code.
    pub async fn wait(self, timeout: Duration) -> DeliveryOutcome {
        match tokio::time::timeout(timeout, self.receiver).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => DeliveryOutcome::Failed("delivery task dropped".to_string()),
            Err(_) => {
                debug!(timeout_ms = timeout.as_millis() as u64, "telemetry still in flight");
                DeliveryOutcome::TimedOut
            }
        }
    }

    /// Block the current thread for at most `timeout`.
    ///
    /// Inside a Tokio runtime this never blocks: it detaches instead, because
    /// parking a runtime thread could stall the very task being waited on.
    pub fn wait_blocking(self, timeout: Duration) -> DeliveryOutcome {
        if Handle::try_current().is_ok() {
            debug!("inside an async runtime; detaching instead of blocking");
            return self.detach();
        }
        let background = match self.background.handle() {
            Ok(handle) => handle,
            Err(err) => {
                warn!(error = %err, "cannot wait for telemetry delivery");
                return DeliveryOutcome::Detached;
            }
        };
        background.block_on(self.wait(timeout))
    }

    /// Bounded wait outside a runtime, detach inside one.
    pub fn settle(self, timeout: Duration) -> DeliveryOutcome {
        if Handle::try_current().is_ok() {
            self.detach()
        } else {
            self.wait_blocking(timeout)
        }
    }
}
