//! usage-telemetry CLI Binary
//!
//! Inspect the service table and send test usage records.

use anyhow::Context;
use clap::Parser;
use std::process;
use tracing::{error, info};
use usage_telemetry::cli::{map_error, Cli, RunContext};
use usage_telemetry::config::{ConfigLoader, TelemetryConfig};
use usage_telemetry::logging::{init_logging, LoggingConfig};
use usage_telemetry::TelemetryError;

fn main() {
    let cli = Cli::parse();

    // Loaded once; logging and the run context share it.
    let loaded = load_config(&cli);

    let logging_config = build_logging_config(&cli, loaded.as_ref().ok());
    if let Err(e) = init_logging(Some(&logging_config)).context("Failed to initialize logging") {
        eprintln!("{:#}", e);
        process::exit(1);
    }

    info!("usage-telemetry CLI starting");

    let context = match loaded.and_then(RunContext::from_config) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("Error loading configuration: {}", e);
            eprintln!("{}", map_error(&e));
            process::exit(1);
        }
    };

    match context.execute(&cli.command) {
        Ok(output) => {
            info!("Command completed successfully");
            println!("{}", output);
        }
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("{}", map_error(&e));
            process::exit(1);
        }
    }
}

/// Explicit `--config` file if given, default layers otherwise.
fn load_config(cli: &Cli) -> Result<TelemetryConfig, TelemetryError> {
    match cli.config {
        Some(ref path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

/// Precedence: CLI flags, then config file, then defaults.
fn build_logging_config(cli: &Cli, config: Option<&TelemetryConfig>) -> LoggingConfig {
    let mut config = config.map(|c| c.logging.clone()).unwrap_or_default();

    if cli.verbose {
        config.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        config.output = output.clone();
    }
    config
}
