//! Environment source: `USAGE_TELEMETRY__SERVER_URL`,
//! `USAGE_TELEMETRY__DELIVERY__WAIT_TIMEOUT_MS`, and so on.

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment};

pub const ENV_PREFIX: &str = "USAGE_TELEMETRY";

/// Add environment overrides to builder.
pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    )
}
