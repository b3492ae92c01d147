//! Instrumentation wrapper: registration, overlay installation, call pass-through.

use serde_json::{json, Map};
use std::sync::Arc;
use usage_telemetry::config::TelemetryConfig;
use usage_telemetry::telemetry::{ServiceRegistry, SessionIdentity, Telemetry, TelemetryHandler};
use usage_telemetry::TelemetryError;

use super::test_utils::{payu_config, recording_handler, RecordingTransport};

fn context(config: &TelemetryConfig) -> (Telemetry, Arc<RecordingTransport>) {
    let (handler, transport) = recording_handler(config);
    let registry = ServiceRegistry::from_config(config).unwrap();
    (Telemetry::from_parts(handler, registry), transport)
}

#[test]
fn tracked_call_returns_result_and_reports_usage() {
    let (telemetry, transport) = context(&payu_config());
    let tracked = telemetry
        .instrument("payu", "run_model")
        .extra_fields(json!({ "model": "access-om2" }))
        .suppress_fields("session_id")
        .track()
        .unwrap();

    assert!(telemetry.functions("payu").contains("run_model"));

    let result = tracked.call(vec![json!(3)], Map::new(), || 40 + 2);
    assert_eq!(result, 42);

    let posted = transport.posted.lock();
    assert_eq!(posted.len(), 1);
    let record = &posted[0].1;
    assert_eq!(record["function"], json!("run_model"));
    assert_eq!(record["args"], json!([3]));
    assert_eq!(record["model"], json!("access-om2"));
    assert!(!record.contains_key("session_id"));
}

#[test]
fn delivery_failure_never_reaches_the_caller() {
    let config = payu_config();
    let handler = TelemetryHandler::with_transport(
        &config,
        Arc::new(SessionIdentity::new()),
        RecordingTransport::new(503),
    );
    let telemetry = Telemetry::from_parts(handler, ServiceRegistry::from_config(&config).unwrap());
    let tracked = telemetry.instrument("payu", "f").track().unwrap();
    assert_eq!(tracked.call(Vec::new(), Map::new(), || "ok"), "ok");
}

#[test]
fn record_error_is_logged_and_call_still_runs() {
    let (telemetry, transport) = context(&payu_config());
    let tracked = telemetry
        .instrument("payu", "f")
        .suppress_fields("not_in_record")
        .track()
        .unwrap();
    assert_eq!(tracked.call(Vec::new(), Map::new(), || 7), 7);
    assert!(transport.posted.lock().is_empty());
}

#[test]
fn unknown_service_fails_when_building_the_wrapper() {
    let (telemetry, _) = context(&payu_config());
    let err = telemetry
        .instrument("nope", "f")
        .extra_fields(json!({ "a": 1 }))
        .track()
        .unwrap_err();
    assert!(matches!(err, TelemetryError::UnknownService { .. }));
    assert!(!telemetry.functions("nope").contains("f"));
}

#[test]
fn builder_without_overlay_keeps_existing_configuration() {
    let (telemetry, _) = context(&payu_config());
    telemetry
        .handler()
        .configure_extra_fields("payu", json!({ "kept": true }))
        .unwrap();
    telemetry.instrument("payu", "g").register_only().unwrap();
    assert_eq!(
        telemetry.handler().extra_fields()["payu"].get("kept"),
        Some(&json!(true))
    );
    assert!(telemetry.functions("payu").contains("g"));
}

#[tokio::test]
async fn async_call_detaches_the_send() {
    let (telemetry, _) = context(&payu_config());
    let tracked = telemetry.instrument("payu", "h").track().unwrap();
    let value = tracked
        .call_async(Vec::new(), Map::new(), || async { "done" })
        .await;
    assert_eq!(value, "done");
    assert_eq!(
        telemetry.handler().last_record().unwrap()["function"],
        json!("h")
    );
}
