//! Merge rules: defaults, override order, conflict handling.
//!
//! Later sources win key by key. Service tables merge per service name, so a
//! user file can override one service's endpoint without restating the others.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

use crate::config::DEFAULT_SERVER_URL;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("server_url", DEFAULT_SERVER_URL)?
        .set_default("delivery.wait_timeout_ms", 100)?
        .set_default("delivery.request_timeout_ms", 10_000)?
        .set_default("delivery.connect_timeout_ms", 2_000)?
        .set_default("record.missing_suppressed_field", "error")
}
