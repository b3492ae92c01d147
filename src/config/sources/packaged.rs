//! Packaged service table shipped inside the binary.

use config::builder::DefaultState;
use config::{ConfigBuilder, File, FileFormat};

/// Service table compiled in from `config/services.toml`.
pub const PACKAGED_SERVICES: &str = include_str!("../../../config/services.toml");

/// Add the packaged service table to builder.
pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(File::from_str(PACKAGED_SERVICES, FileFormat::Toml))
}
