//! CLI presentation: services table, records, outcomes, config.

use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde_json::{json, Value};

use crate::config::TelemetryConfig;
use crate::error::TelemetryError;
use crate::telemetry::{DeliveryOutcome, Record, Telemetry};

pub fn format_services_text(telemetry: &Telemetry) -> String {
    let handler = telemetry.handler();
    let services = handler.services();
    if services.is_empty() {
        return "No services configured.".to_string();
    }

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Service", "Endpoint", "Functions"]);
    for service in &services {
        let functions = telemetry.functions(service).names();
        let functions = if functions.is_empty() {
            "-".to_string()
        } else {
            functions.join("\n")
        };
        table.add_row(vec![
            service.clone(),
            handler.endpoints()[service].clone(),
            functions,
        ]);
    }

    format!(
        "{}\nServer: {}\n{}\n\nTotal: {} service(s)",
        "Services".bold().underline(),
        handler.server_url(),
        table,
        services.len()
    )
}

pub fn format_services_json(telemetry: &Telemetry) -> String {
    let handler = telemetry.handler();
    let services: Vec<Value> = handler
        .services()
        .iter()
        .map(|service| {
            json!({
                "service": service,
                "endpoint": handler.endpoints()[service],
                "functions": telemetry.functions(service).names(),
            })
        })
        .collect();
    let out = json!({
        "server_url": handler.server_url(),
        "services": services,
        "total": services.len(),
    });
    serde_json::to_string_pretty(&out).unwrap_or_else(|_| "{}".to_string())
}

pub fn format_record_json(record: &Record) -> String {
    serde_json::to_string_pretty(record).unwrap_or_else(|_| "{}".to_string())
}

pub fn format_outcome(url: &str, outcome: &DeliveryOutcome) -> String {
    match outcome {
        DeliveryOutcome::Delivered { status } => {
            format!("Delivered to {} (status {})", url, status)
        }
        DeliveryOutcome::Failed(reason) => format!("Delivery to {} failed: {}", url, reason),
        DeliveryOutcome::TimedOut => format!(
            "Delivery to {} still in flight when the wait ended",
            url
        ),
        DeliveryOutcome::Detached => format!("Delivery to {} detached", url),
    }
}

pub fn format_config_toml(config: &TelemetryConfig) -> Result<String, TelemetryError> {
    toml::to_string_pretty(config)
        .map_err(|e| TelemetryError::ConfigError(format!("Failed to render config: {}", e)))
}
