//! CLI parse: clap types for usage-telemetry. No behavior; definitions only.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// usage-telemetry CLI - inspect services and send test usage records
#[derive(Parser, Debug)]
#[command(name = "usage-telemetry")]
#[command(about = "Inspect and exercise the usage telemetry client")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (replaces the user config file)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List services, their endpoints, and registered functions
    Services {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Print this process's session id
    Session,
    /// Build a record without sending it
    Record {
        #[command(flatten)]
        call: CallArgs,
    },
    /// Build and send a record, then report the outcome
    Send {
        #[command(flatten)]
        call: CallArgs,
        /// Override the collection server base URL
        #[arg(long)]
        server: Option<String>,
        /// How long to wait for the collector, in milliseconds
        #[arg(long)]
        wait_ms: Option<u64>,
    },
    /// Print the effective configuration as TOML
    Config,
}

/// One simulated call. Values are parsed as JSON, falling back to plain strings.
#[derive(Args, Debug, Clone)]
pub struct CallArgs {
    /// Service name
    pub service: String,

    /// Function name
    pub function: String,

    /// Positional argument (repeatable)
    #[arg(long = "arg")]
    pub args: Vec<String>,

    /// Keyword argument as KEY=VALUE (repeatable)
    #[arg(long = "kwarg")]
    pub kwargs: Vec<String>,

    /// Extra service field as KEY=VALUE (repeatable, replaces the overlay)
    #[arg(long = "extra")]
    pub extra: Vec<String>,

    /// Field to suppress (repeatable, replaces the suppression list)
    #[arg(long = "suppress")]
    pub suppress: Vec<String>,
}
