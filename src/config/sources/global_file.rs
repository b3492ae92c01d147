//! User config file source: $XDG_CONFIG_HOME/usage-telemetry/config.toml
//! (or the platform equivalent).

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::File;
use std::path::PathBuf;
use tracing::debug;

/// Path to the user config file.
pub fn global_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "usage-telemetry")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Add user config file source to builder if it exists.
pub fn add_to_builder(mut builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    if let Some(path) = global_config_path() {
        if path.exists() {
            builder = builder.add_source(File::from(path).required(false));
        } else {
            debug!(
                config_path = %path.display(),
                "No user configuration file; using packaged services"
            );
        }
    }
    builder
}
