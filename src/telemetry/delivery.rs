//! Delivery: HTTP transport and the bridge that runs sends off the caller's path.

pub mod bridge;
pub mod transport;

pub use bridge::{DeliveryBridge, DeliveryHandle, DeliveryOutcome};
pub use transport::{HttpTransport, Transport};
