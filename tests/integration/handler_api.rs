//! Handler behavior through the public API: record shape, fail-fast service
//! lookup, replace semantics, shared state.

use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;
use usage_telemetry::config::MissingFieldPolicy;
use usage_telemetry::telemetry::{Record, SessionIdentity, ServiceRegistry, Telemetry};
use usage_telemetry::{DeliveryOutcome, TelemetryError};

use super::test_utils::{payu_config, recording_handler, RecordingTransport};

#[test]
fn overlay_merge_and_suppression_produce_exact_record() {
    let (handler, _) = recording_handler(&payu_config());
    handler
        .configure_extra_fields("payu", json!({ "model": "X", "n": 2 }))
        .unwrap();
    handler
        .configure_suppressed_fields("payu", vec!["session_id", "name"])
        .unwrap();

    let record = handler.build_record("payu", "_test", &[], &Map::new()).unwrap();
    assert_eq!(
        Value::Object(record),
        json!({ "function": "_test", "args": [], "kwargs": {}, "model": "X", "n": 2 })
    );
}

#[test]
fn overlay_wins_on_key_collision() {
    let (handler, _) = recording_handler(&payu_config());
    handler
        .configure_extra_fields("payu", json!({ "function": "renamed" }))
        .unwrap();
    let record = handler.build_record("payu", "_test", &[], &Map::new()).unwrap();
    assert_eq!(record["function"], json!("renamed"));
}

#[test]
fn unknown_service_fails_without_mutating_state() {
    let (handler, transport) = recording_handler(&payu_config());
    let extra_before = handler.extra_fields();
    let server_before = handler.server_url();

    let err = handler.configure_extra_fields("nope", json!({})).unwrap_err();
    assert!(matches!(err, TelemetryError::UnknownService { ref service, .. } if service == "nope"));

    let err = handler
        .send_request("nope", "f", &[json!(1)], &Map::new())
        .unwrap_err();
    assert!(matches!(err, TelemetryError::UnknownService { .. }));

    assert_eq!(handler.extra_fields(), extra_before);
    assert_eq!(handler.server_url(), server_before);
    assert!(handler.last_record().is_none());
    assert!(transport.posted.lock().is_empty());
}

#[test]
fn empty_overlay_twice_stays_empty() {
    let (handler, _) = recording_handler(&payu_config());
    handler.configure_extra_fields("payu", json!({})).unwrap();
    assert!(handler.extra_fields()["payu"].is_empty());
    handler.configure_extra_fields("payu", json!({})).unwrap();
    assert!(handler.extra_fields()["payu"].is_empty());
}

#[test]
fn suppression_list_is_replaced_not_accumulated() {
    let config = payu_config();
    let (handler, _) = recording_handler(&config);
    handler
        .configure_extra_fields("payu", json!({ "a": 1, "b": 2 }))
        .unwrap();
    handler.configure_suppressed_fields("payu", vec!["a"]).unwrap();
    handler.configure_suppressed_fields("payu", vec!["b"]).unwrap();

    assert_eq!(handler.suppressed_fields()["payu"], vec!["b"]);
    let record = handler.build_record("payu", "f", &[], &Map::new()).unwrap();
    assert_eq!(record["a"], json!(1));
    assert!(!record.contains_key("b"));
}

#[test]
fn missing_suppressed_field_follows_policy() {
    let mut config = payu_config();
    let (strict, _) = recording_handler(&config);
    strict.configure_suppressed_fields("payu", "absent").unwrap();
    let err = strict.build_record("payu", "f", &[], &Map::new()).unwrap_err();
    assert!(matches!(err, TelemetryError::FieldNotFound { ref field, .. } if field == "absent"));

    config.record.missing_suppressed_field = MissingFieldPolicy::Ignore;
    let (lenient, _) = recording_handler(&config);
    lenient.configure_suppressed_fields("payu", "absent").unwrap();
    assert!(lenient.build_record("payu", "f", &[], &Map::new()).is_ok());
}

#[test]
fn send_request_posts_last_record_to_endpoint() {
    let (handler, transport) = recording_handler(&payu_config());
    let mut kwargs = Map::new();
    kwargs.insert("name".to_string(), json!("test_username"));

    let outcome = handler
        .send_request("payu", "_test", &[json!(1), json!(2)], &kwargs)
        .unwrap();
    assert_eq!(outcome, DeliveryOutcome::Delivered { status: 200 });

    let posted = transport.posted.lock();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].0, "http://collector.test/payu/update");
    assert_eq!(Some(posted[0].1.clone()), handler.last_record());
    assert_eq!(posted[0].1["args"], json!([1, 2]));
    assert_eq!(posted[0].1["kwargs"], json!({ "name": "test_username" }));
}

#[test]
fn context_clones_share_one_handler() {
    let config = payu_config();
    let (handler, _) = recording_handler(&config);
    let first = Telemetry::from_parts(handler, ServiceRegistry::from_config(&config).unwrap());
    let second = first.clone();

    assert!(Arc::ptr_eq(first.handler(), second.handler()));
    first.handler().set_server_url("http://localhost:8000");
    assert_eq!(second.handler().server_url(), "http://localhost:8000");
}

#[test]
fn global_session_identity_is_stable_and_hex() {
    let a = SessionIdentity::global();
    let b = SessionIdentity::global();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(a.value(), b.value());
    assert_eq!(a.value().len(), 64);
    assert!(a.value().chars().all(|c| c.is_ascii_hexdigit()));
    assert_ne!(SessionIdentity::create(), a.value());
}

/// Poll until `count` records have been posted, or give up after one second.
async fn wait_for_posts(transport: &RecordingTransport, count: usize) -> Vec<(String, Record)> {
    let polled = tokio::time::timeout(Duration::from_secs(1), async {
        loop {
            if transport.posted.lock().len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(polled.is_ok(), "detached send never reached the transport");
    transport.posted.lock().clone()
}

#[tokio::test]
async fn detached_send_inside_runtime_still_posts_once() {
    let (handler, transport) = recording_handler(&payu_config());
    let outcome = handler
        .send_request("payu", "_test", &[json!(1)], &Map::new())
        .unwrap();
    assert_eq!(outcome, DeliveryOutcome::Detached);

    let posted = wait_for_posts(&transport, 1).await;
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].0, "http://collector.test/payu/update");
    assert_eq!(posted[0].1["function"], json!("_test"));
    assert_eq!(posted[0].1["args"], json!([1]));
}

#[tokio::test]
async fn async_tracked_call_posts_in_background() {
    let config = payu_config();
    let (handler, transport) = recording_handler(&config);
    let telemetry = Telemetry::from_parts(handler, ServiceRegistry::from_config(&config).unwrap());
    let tracked = telemetry.instrument("payu", "run_async").track().unwrap();

    let value = tracked
        .call_async(vec![json!("x")], Map::new(), || async { 11 })
        .await;
    assert_eq!(value, 11);

    let posted = wait_for_posts(&transport, 1).await;
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].0, "http://collector.test/payu/update");
    assert_eq!(posted[0].1["function"], json!("run_async"));
}
