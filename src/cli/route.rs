//! CLI route: single route table and run context. Dispatches to the telemetry
//! library and presentation.

use serde_json::{Map, Value};
use std::time::Duration;
use tracing::info;

use crate::cli::parse::{CallArgs, Commands};
use crate::cli::presentation::{
    format_config_toml, format_outcome, format_record_json, format_services_json,
    format_services_text,
};
use crate::config::TelemetryConfig;
use crate::error::TelemetryError;
use crate::telemetry::Telemetry;

/// Runtime context for CLI execution: effective config and the telemetry context
/// built from it.
pub struct RunContext {
    telemetry: Telemetry,
    config: TelemetryConfig,
}

impl RunContext {
    pub fn from_config(config: TelemetryConfig) -> Result<Self, TelemetryError> {
        let telemetry = Telemetry::new(&config)?;
        Ok(Self { telemetry, config })
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    /// Run one command and return the text to print.
    pub fn execute(&self, command: &Commands) -> Result<String, TelemetryError> {
        match command {
            Commands::Services { format } => match format.as_str() {
                "text" => Ok(format_services_text(&self.telemetry)),
                "json" => Ok(format_services_json(&self.telemetry)),
                other => Err(TelemetryError::InvalidArgument(format!(
                    "Unknown format '{}'. Use 'text' or 'json'",
                    other
                ))),
            },
            Commands::Session => Ok(self.telemetry.handler().session_id().to_string()),
            Commands::Record { call } => {
                let request = CallRequest::parse(call)?;
                request.configure(&self.telemetry)?;
                let record = self.telemetry.handler().build_record(
                    &call.service,
                    &call.function,
                    &request.args,
                    &request.kwargs,
                )?;
                Ok(format_record_json(&record))
            }
            Commands::Send {
                call,
                server,
                wait_ms,
            } => {
                let request = CallRequest::parse(call)?;
                let handler = self.telemetry.handler();
                // Resolve first so a bad service leaves the server URL untouched.
                handler.endpoint_url(&call.service)?;
                if let Some(server) = server {
                    handler.set_server_url(server.trim_end_matches('/'));
                }
                request.configure(&self.telemetry)?;

                let url = handler.endpoint_url(&call.service)?;
                let timeout = wait_ms
                    .map(Duration::from_millis)
                    .unwrap_or_else(|| handler.wait_timeout());
                info!(service = %call.service, function = %call.function, url = %url, "sending usage record");
                let outcome = handler
                    .dispatch(&call.service, &call.function, &request.args, &request.kwargs)?
                    .wait_blocking(timeout);
                Ok(format_outcome(&url, &outcome))
            }
            Commands::Config => format_config_toml(&self.config),
        }
    }
}

/// Parsed form of [`CallArgs`].
struct CallRequest {
    service: String,
    args: Vec<Value>,
    kwargs: Map<String, Value>,
    extra: Option<Map<String, Value>>,
    suppress: Option<Vec<String>>,
}

impl CallRequest {
    fn parse(call: &CallArgs) -> Result<Self, TelemetryError> {
        let args = call.args.iter().map(|a| parse_value(a)).collect();
        let kwargs = parse_pairs(&call.kwargs)?;
        let extra = if call.extra.is_empty() {
            None
        } else {
            Some(parse_pairs(&call.extra)?)
        };
        let suppress = if call.suppress.is_empty() {
            None
        } else {
            Some(call.suppress.clone())
        };
        Ok(Self {
            service: call.service.clone(),
            args,
            kwargs,
            extra,
            suppress,
        })
    }

    /// Install the overlay and suppression list given on the command line.
    fn configure(&self, telemetry: &Telemetry) -> Result<(), TelemetryError> {
        let handler = telemetry.handler();
        if let Some(extra) = &self.extra {
            handler.configure_extra_fields(&self.service, Value::Object(extra.clone()))?;
        }
        if let Some(suppress) = &self.suppress {
            handler.configure_suppressed_fields(&self.service, suppress.clone())?;
        }
        Ok(())
    }
}

/// JSON if it parses, otherwise the raw text as a string.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn parse_pairs(pairs: &[String]) -> Result<Map<String, Value>, TelemetryError> {
    let mut map = Map::new();
    for pair in pairs {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            TelemetryError::InvalidArgument(format!("Expected KEY=VALUE, got '{}'", pair))
        })?;
        if key.is_empty() {
            return Err(TelemetryError::InvalidArgument(format!(
                "Empty key in '{}'",
                pair
            )));
        }
        map.insert(key.to_string(), parse_value(value));
    }
    Ok(map)
}
