//! Telemetry domain: session identity, records, registry, handler, delivery,
//! and instrumentation.

pub mod delivery;
pub mod facade;
pub mod handler;
pub mod instrument;
pub mod record;
pub mod registry;
pub mod session;

pub use delivery::{DeliveryBridge, DeliveryHandle, DeliveryOutcome, HttpTransport, Transport};
pub use facade::Telemetry;
pub use handler::{FieldList, TelemetryHandler};
pub use instrument::{InstrumentBuilder, Tracked};
pub use record::{Record, FIELD_ARGS, FIELD_FUNCTION, FIELD_KWARGS, FIELD_NAME, FIELD_SESSION_ID};
pub use registry::{RegistryHandle, ServiceRegistry};
pub use session::{current_user, SessionIdentity};
