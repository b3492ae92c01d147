//! Configuration loader: assembles sources in precedence order and validates.

use config::builder::DefaultState;
use config::{ConfigBuilder, File, FileFormat};
use std::path::{Path, PathBuf};

use crate::config::merge::merge_policy::builder_with_defaults;
use crate::config::sources::{environment, explicit_file, global_file, packaged};
use crate::config::TelemetryConfig;
use crate::error::TelemetryError;

/// Loads [`TelemetryConfig`] from layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Packaged table, then user file, then environment.
    pub fn load() -> Result<TelemetryConfig, TelemetryError> {
        let builder = packaged::add_to_builder(builder_with_defaults()?);
        let builder = global_file::add_to_builder(builder);
        let builder = environment::add_to_builder(builder);
        Self::finish(builder)
    }

    /// Packaged table, then `path`, then environment. The user file is skipped.
    pub fn load_from_file(path: &Path) -> Result<TelemetryConfig, TelemetryError> {
        let builder = packaged::add_to_builder(builder_with_defaults()?);
        let builder = explicit_file::add_to_builder(builder, path);
        let builder = environment::add_to_builder(builder);
        Self::finish(builder)
    }

    /// Packaged table only. Ignores the user file and environment.
    pub fn packaged() -> Result<TelemetryConfig, TelemetryError> {
        Self::finish(packaged::add_to_builder(builder_with_defaults()?))
    }

    /// Packaged table overlaid with an inline TOML document.
    pub fn from_toml_str(overlay: &str) -> Result<TelemetryConfig, TelemetryError> {
        let builder = packaged::add_to_builder(builder_with_defaults()?)
            .add_source(File::from_str(overlay, FileFormat::Toml));
        Self::finish(builder)
    }

    /// Location of the user config file, if the platform has one.
    pub fn user_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<TelemetryConfig, TelemetryError> {
        let config: TelemetryConfig = builder.build()?.try_deserialize()?;
        config.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            TelemetryError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;
        Ok(config)
    }
}
