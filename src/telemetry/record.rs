//! Record schema and assembly for one telemetry event.

use serde_json::{Map, Value};

use crate::config::MissingFieldPolicy;
use crate::error::TelemetryError;

/// Flat key-value payload sent for one call.
pub type Record = Map<String, Value>;

pub const FIELD_NAME: &str = "name";
pub const FIELD_FUNCTION: &str = "function";
pub const FIELD_ARGS: &str = "args";
pub const FIELD_KWARGS: &str = "kwargs";
pub const FIELD_SESSION_ID: &str = "session_id";

/// Call metadata common to every record.
#[derive(Debug, Clone, Copy)]
pub struct CallInfo<'a> {
    pub user: &'a str,
    pub session_id: &'a str,
    pub function: &'a str,
    pub args: &'a [Value],
    pub kwargs: &'a Map<String, Value>,
}

/// Build a record: base fields, then the overlay (overlay wins on collision),
/// then drop every suppressed field.
///
/// Pure; the handler owns caching of the result.
pub fn assemble_record(
    service: &str,
    call: CallInfo<'_>,
    overlay: Option<&Map<String, Value>>,
    suppressed: &[String],
    policy: MissingFieldPolicy,
) -> Result<Record, TelemetryError> {
    let mut record = Record::new();
    record.insert(FIELD_NAME.to_string(), Value::from(call.user));
    record.insert(FIELD_FUNCTION.to_string(), Value::from(call.function));
    record.insert(FIELD_ARGS.to_string(), Value::Array(call.args.to_vec()));
    record.insert(FIELD_KWARGS.to_string(), Value::Object(call.kwargs.clone()));
    record.insert(FIELD_SESSION_ID.to_string(), Value::from(call.session_id));

    if let Some(overlay) = overlay {
        for (key, value) in overlay {
            record.insert(key.clone(), value.clone());
        }
    }

    for field in suppressed {
        if record.remove(field).is_none() && policy == MissingFieldPolicy::Error {
            return Err(TelemetryError::FieldNotFound {
                service: service.to_string(),
                field: field.clone(),
            });
        }
    }

    Ok(record)
}
